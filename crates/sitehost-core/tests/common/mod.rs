//! Test doubles and common utilities for workflow contract tests
//!
//! The in-memory providers from `sitehost_core::memory` carry the state.
//! The wrappers here add failure injection and call counting on top.

#![allow(dead_code)]

use async_trait::async_trait;
use sitehost_core::error::{Error, Result};
use sitehost_core::traits::{
    BucketCreation, BucketWebsiteState, DnsClient, DnsZone, ObjectPresence, ObjectUpload,
    RecordChange, RecordSetPage, StorageClient, WebsiteConfig, ZonePage,
};
use sitehost_core::{
    CallerReferenceSource, Domain, MemoryDns, MemoryStorage, ProvisionConfig, ProvisionEvent,
    RegionId, WebsiteProvisioner,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;

/// Build a provisioner over clones of the given providers
///
/// The clones share state with the handles kept by the test.
pub fn provisioner(
    dns: &MemoryDns,
    storage: &MemoryStorage,
    config: ProvisionConfig,
) -> (WebsiteProvisioner, mpsc::Receiver<ProvisionEvent>) {
    WebsiteProvisioner::new(Box::new(dns.clone()), Box::new(storage.clone()), config)
        .expect("provisioner construction succeeds")
}

/// Minimal config for `domain` in us-east-1
pub fn minimal_config(domain: &str) -> ProvisionConfig {
    ProvisionConfig::new(domain, RegionId::UsEast1)
}

/// Collect every event currently queued
pub fn drain_events(rx: &mut mpsc::Receiver<ProvisionEvent>) -> Vec<ProvisionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// A bucket serving content with the default documents
pub fn website_state() -> BucketWebsiteState {
    BucketWebsiteState::Website {
        index_document: "index.html".to_string(),
        error_document: "error.html".to_string(),
    }
}

/// A bucket redirecting everything to `host`
pub fn redirect_state(host: &str) -> BucketWebsiteState {
    BucketWebsiteState::Redirect {
        host: host.to_string(),
        status_code: 301,
    }
}

/// Caller references `ref-1`, `ref-2`, ...
#[derive(Default)]
pub struct SequentialReferences {
    issued: AtomicUsize,
}

impl CallerReferenceSource for SequentialReferences {
    fn next_reference(&self, _domain: &Domain) -> String {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        format!("ref-{}", n)
    }
}

/// Storage operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageOp {
    CreateBucket,
    WebsiteState,
    SetWebsiteConfig,
    PutObject,
}

/// A storage provider that fails one operation and counts every call
#[derive(Clone)]
pub struct FailingStorage {
    inner: MemoryStorage,
    fail_on: StorageOp,
    calls: Arc<AtomicUsize>,
}

impl FailingStorage {
    pub fn new(inner: MemoryStorage, fail_on: StorageOp) -> Self {
        Self {
            inner,
            fail_on,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Total calls made, including the failing one
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self, op: StorageOp) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if op == self.fail_on {
            return Err(Error::provider("failing", format!("{:?} failed", op)));
        }
        Ok(())
    }
}

#[async_trait]
impl StorageClient for FailingStorage {
    async fn create_bucket(
        &self,
        name: &str,
        location_hint: Option<&str>,
    ) -> Result<BucketCreation> {
        self.enter(StorageOp::CreateBucket)?;
        self.inner.create_bucket(name, location_hint).await
    }

    async fn website_state(&self, bucket: &str) -> Result<BucketWebsiteState> {
        self.enter(StorageOp::WebsiteState)?;
        self.inner.website_state(bucket).await
    }

    async fn set_website_config(&self, bucket: &str, config: &WebsiteConfig) -> Result<()> {
        self.enter(StorageOp::SetWebsiteConfig)?;
        self.inner.set_website_config(bucket, config).await
    }

    async fn object_presence(&self, bucket: &str, key: &str) -> ObjectPresence {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.object_presence(bucket, key).await
    }

    async fn put_object(&self, upload: &ObjectUpload) -> Result<()> {
        self.enter(StorageOp::PutObject)?;
        self.inner.put_object(upload).await
    }

    fn provider_name(&self) -> &'static str {
        "failing"
    }
}

/// A DNS provider that counts every call and forwards to [`MemoryDns`]
#[derive(Clone)]
pub struct CountingDns {
    inner: MemoryDns,
    calls: Arc<AtomicUsize>,
}

impl CountingDns {
    pub fn new(inner: MemoryDns) -> Self {
        Self {
            inner,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DnsClient for CountingDns {
    async fn list_zones(&self, marker: Option<&str>) -> Result<ZonePage> {
        self.enter();
        self.inner.list_zones(marker).await
    }

    async fn create_zone(
        &self,
        name: &str,
        caller_reference: &str,
        comment: &str,
    ) -> Result<DnsZone> {
        self.enter();
        self.inner.create_zone(name, caller_reference, comment).await
    }

    async fn list_record_sets(&self, zone_id: &str, start_name: &str) -> Result<RecordSetPage> {
        self.enter();
        self.inner.list_record_sets(zone_id, start_name).await
    }

    async fn submit_change_batch(&self, zone_id: &str, changes: &[RecordChange]) -> Result<()> {
        self.enter();
        self.inner.submit_change_batch(zone_id, changes).await
    }

    fn provider_name(&self) -> &'static str {
        "counting"
    }
}

/// A DNS provider whose zone listing repeats one page forever
pub struct LoopingZoneDns;

#[async_trait]
impl DnsClient for LoopingZoneDns {
    async fn list_zones(&self, _marker: Option<&str>) -> Result<ZonePage> {
        Ok(ZonePage {
            zones: vec![DnsZone {
                id: "ZLOOP".to_string(),
                name: "other.org.".to_string(),
            }],
            next_marker: Some("ZLOOP".to_string()),
            truncated: true,
        })
    }

    async fn create_zone(&self, _: &str, _: &str, _: &str) -> Result<DnsZone> {
        panic!("create_zone must not be reached");
    }

    async fn list_record_sets(&self, _: &str, _: &str) -> Result<RecordSetPage> {
        panic!("list_record_sets must not be reached");
    }

    async fn submit_change_batch(&self, _: &str, _: &[RecordChange]) -> Result<()> {
        panic!("submit_change_batch must not be reached");
    }

    fn provider_name(&self) -> &'static str {
        "looping"
    }
}
