// # In-Memory Providers
//
// In-memory implementations of `DnsClient` and `StorageClient`.
//
// ## Purpose
//
// Provide providers that keep state between calls without touching the
// network. Useful for testing the workflow's convergence and for dry runs.
//
// ## Behavior
//
// - Listings are paginated with a configurable page size
// - Creating a record set that already exists fails, as the real provider does
// - Every mutating call is counted so tests can assert "nothing changed"
// - Clones share state: keep one handle, move the other into the provisioner

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::Error;
use crate::traits::{
    BucketCreation, BucketWebsiteState, ChangeAction, DnsClient, DnsZone, ObjectPresence,
    ObjectUpload, RecordChange, RecordSet, RecordSetPage, StorageClient, WebsiteConfig, ZonePage,
};

/// Default number of items per listing page
pub const DEFAULT_PAGE_SIZE: usize = 100;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
struct DnsState {
    zones: Vec<DnsZone>,
    records: HashMap<String, Vec<RecordSet>>,
    next_zone_id: u64,
    caller_references: Vec<String>,
    zone_creations: usize,
    zone_list_calls: usize,
    change_batches: Vec<Vec<RecordChange>>,
}

impl DnsState {
    fn add_zone(&mut self, name: &str) -> DnsZone {
        self.next_zone_id += 1;
        let zone = DnsZone {
            id: format!("Z{:012}", self.next_zone_id),
            name: crate::domain::qualify(name),
        };
        self.zones.push(zone.clone());
        self.records.insert(zone.id.clone(), Vec::new());
        zone
    }
}

/// In-memory DNS provider
///
/// # Example
///
/// ```rust
/// use sitehost_core::memory::MemoryDns;
/// use sitehost_core::traits::DnsClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let dns = MemoryDns::new();
///     dns.insert_zone("example.com.");
///
///     let page = dns.list_zones(None).await?;
///     assert_eq!(page.zones[0].name, "example.com.");
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryDns {
    inner: Arc<Mutex<DnsState>>,
    zone_page_size: usize,
    record_page_size: usize,
}

impl MemoryDns {
    /// Create an empty provider
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(DnsState::default())),
            zone_page_size: DEFAULT_PAGE_SIZE,
            record_page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Set the zone listing page size (minimum 1)
    pub fn with_zone_page_size(mut self, size: usize) -> Self {
        self.zone_page_size = size.max(1);
        self
    }

    /// Set the record set listing page size (minimum 1)
    pub fn with_record_page_size(mut self, size: usize) -> Self {
        self.record_page_size = size.max(1);
        self
    }

    /// Add a zone directly, bypassing counters
    pub fn insert_zone(&self, name: &str) -> DnsZone {
        lock(&self.inner).add_zone(name)
    }

    /// Add a record set directly, bypassing counters
    pub fn insert_record(&self, zone_id: &str, record_set: RecordSet) {
        lock(&self.inner)
            .records
            .entry(zone_id.to_string())
            .or_default()
            .push(record_set);
    }

    /// All zones, in creation order
    pub fn zones(&self) -> Vec<DnsZone> {
        lock(&self.inner).zones.clone()
    }

    /// All record sets of a zone
    pub fn records(&self, zone_id: &str) -> Vec<RecordSet> {
        lock(&self.inner)
            .records
            .get(zone_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of `create_zone` calls
    pub fn zone_creations(&self) -> usize {
        lock(&self.inner).zone_creations
    }

    /// Number of `list_zones` calls
    pub fn zone_list_calls(&self) -> usize {
        lock(&self.inner).zone_list_calls
    }

    /// Caller references passed to `create_zone`
    pub fn caller_references(&self) -> Vec<String> {
        lock(&self.inner).caller_references.clone()
    }

    /// Number of change batches applied
    pub fn change_batch_count(&self) -> usize {
        lock(&self.inner).change_batches.len()
    }

    /// Change batches applied, in order
    pub fn change_batches(&self) -> Vec<Vec<RecordChange>> {
        lock(&self.inner).change_batches.clone()
    }
}

impl Default for MemoryDns {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DnsClient for MemoryDns {
    async fn list_zones(&self, marker: Option<&str>) -> Result<ZonePage, Error> {
        let mut state = lock(&self.inner);
        state.zone_list_calls += 1;

        let start = match marker {
            None => 0,
            Some(marker) => state
                .zones
                .iter()
                .position(|zone| zone.id == marker)
                .ok_or_else(|| Error::dns(format!("Invalid zone marker: {}", marker)))?,
        };

        let end = (start + self.zone_page_size).min(state.zones.len());
        let truncated = end < state.zones.len();

        Ok(ZonePage {
            zones: state.zones[start..end].to_vec(),
            next_marker: truncated.then(|| state.zones[end].id.clone()),
            truncated,
        })
    }

    async fn create_zone(
        &self,
        name: &str,
        caller_reference: &str,
        _comment: &str,
    ) -> Result<DnsZone, Error> {
        let mut state = lock(&self.inner);

        if state.caller_references.iter().any(|r| r == caller_reference) {
            return Err(Error::dns(format!(
                "HostedZoneAlreadyExists: caller reference {} was already used",
                caller_reference
            )));
        }

        state.zone_creations += 1;
        state.caller_references.push(caller_reference.to_string());
        Ok(state.add_zone(name))
    }

    async fn list_record_sets(
        &self,
        zone_id: &str,
        start_name: &str,
    ) -> Result<RecordSetPage, Error> {
        let state = lock(&self.inner);
        let records = state
            .records
            .get(zone_id)
            .ok_or_else(|| Error::dns(format!("NoSuchHostedZone: {}", zone_id)))?;

        let mut from_start: Vec<&RecordSet> = records
            .iter()
            .filter(|set| set.name.as_str() >= start_name)
            .collect();
        from_start.sort_by(|a, b| {
            (a.name.as_str(), a.record_type.as_str())
                .cmp(&(b.name.as_str(), b.record_type.as_str()))
        });

        let truncated = from_start.len() > self.record_page_size;
        Ok(RecordSetPage {
            record_sets: from_start
                .into_iter()
                .take(self.record_page_size)
                .cloned()
                .collect(),
            truncated,
        })
    }

    async fn submit_change_batch(
        &self,
        zone_id: &str,
        changes: &[RecordChange],
    ) -> Result<(), Error> {
        let mut state = lock(&self.inner);
        let records = state
            .records
            .get(zone_id)
            .ok_or_else(|| Error::dns(format!("NoSuchHostedZone: {}", zone_id)))?;

        for change in changes {
            match change.action {
                ChangeAction::Create => {
                    let exists = records.iter().any(|set| {
                        set.name == change.record_set.name
                            && set.record_type == change.record_set.record_type
                    });
                    if exists {
                        return Err(Error::dns(format!(
                            "InvalidChangeBatch: record set {} {} already exists",
                            change.record_set.name, change.record_set.record_type
                        )));
                    }
                }
            }
        }

        let created: Vec<RecordSet> = changes.iter().map(|c| c.record_set.clone()).collect();
        state
            .records
            .entry(zone_id.to_string())
            .or_default()
            .extend(created);
        state.change_batches.push(changes.to_vec());
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}

#[derive(Debug)]
struct MemoryBucket {
    website: BucketWebsiteState,
    objects: HashMap<String, Vec<u8>>,
}

#[derive(Debug, Default)]
struct StorageState {
    buckets: BTreeMap<String, MemoryBucket>,
    foreign_buckets: HashSet<String>,
    bucket_creations: usize,
    config_writes: usize,
    uploads: Vec<ObjectUpload>,
    fail_object_reads: bool,
}

/// In-memory storage provider
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<StorageState>>,
}

impl MemoryStorage {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an owned bucket directly, bypassing counters
    pub fn insert_bucket(&self, name: &str, website: BucketWebsiteState) {
        lock(&self.inner).buckets.insert(
            name.to_string(),
            MemoryBucket {
                website,
                objects: HashMap::new(),
            },
        );
    }

    /// Mark a bucket name as taken by someone else
    pub fn insert_foreign_bucket(&self, name: &str) {
        lock(&self.inner).foreign_buckets.insert(name.to_string());
    }

    /// Add an object directly, bypassing counters
    ///
    /// Does nothing if the bucket does not exist.
    pub fn insert_object(&self, bucket: &str, key: &str, body: &[u8]) {
        if let Some(b) = lock(&self.inner).buckets.get_mut(bucket) {
            b.objects.insert(key.to_string(), body.to_vec());
        }
    }

    /// Make every `object_presence` call return `Failed`
    pub fn set_fail_object_reads(&self, fail: bool) {
        lock(&self.inner).fail_object_reads = fail;
    }

    /// Current website state of a bucket
    pub fn bucket_state(&self, name: &str) -> Option<BucketWebsiteState> {
        lock(&self.inner)
            .buckets
            .get(name)
            .map(|b| b.website.clone())
    }

    /// Names of owned buckets
    pub fn bucket_names(&self) -> Vec<String> {
        lock(&self.inner).buckets.keys().cloned().collect()
    }

    /// Body of an object
    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        lock(&self.inner)
            .buckets
            .get(bucket)
            .and_then(|b| b.objects.get(key).cloned())
    }

    /// Number of buckets created through `create_bucket`
    pub fn bucket_creations(&self) -> usize {
        lock(&self.inner).bucket_creations
    }

    /// Number of `set_website_config` calls
    pub fn config_writes(&self) -> usize {
        lock(&self.inner).config_writes
    }

    /// Uploads performed through `put_object`
    pub fn uploads(&self) -> Vec<ObjectUpload> {
        lock(&self.inner).uploads.clone()
    }
}

#[async_trait]
impl StorageClient for MemoryStorage {
    async fn create_bucket(
        &self,
        name: &str,
        _location_hint: Option<&str>,
    ) -> Result<BucketCreation, Error> {
        let mut state = lock(&self.inner);

        if state.foreign_buckets.contains(name) {
            return Err(Error::storage(format!(
                "BucketAlreadyExists: {} is owned by another account",
                name
            )));
        }

        if state.buckets.contains_key(name) {
            return Ok(BucketCreation::AlreadyOwned);
        }

        state.bucket_creations += 1;
        state.buckets.insert(
            name.to_string(),
            MemoryBucket {
                website: BucketWebsiteState::Unconfigured,
                objects: HashMap::new(),
            },
        );
        Ok(BucketCreation::Created)
    }

    async fn website_state(&self, bucket: &str) -> Result<BucketWebsiteState, Error> {
        lock(&self.inner)
            .buckets
            .get(bucket)
            .map(|b| b.website.clone())
            .ok_or_else(|| Error::storage(format!("NoSuchBucket: {}", bucket)))
    }

    async fn set_website_config(&self, bucket: &str, config: &WebsiteConfig) -> Result<(), Error> {
        let mut state = lock(&self.inner);
        let entry = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| Error::storage(format!("NoSuchBucket: {}", bucket)))?;
        entry.website = config.clone().into();
        state.config_writes += 1;
        Ok(())
    }

    async fn object_presence(&self, bucket: &str, key: &str) -> ObjectPresence {
        let state = lock(&self.inner);
        if state.fail_object_reads {
            return ObjectPresence::Failed("AccessDenied".to_string());
        }

        match state.buckets.get(bucket) {
            None => ObjectPresence::Failed(format!("NoSuchBucket: {}", bucket)),
            Some(b) if b.objects.contains_key(key) => ObjectPresence::Found,
            Some(_) => ObjectPresence::NotFound,
        }
    }

    async fn put_object(&self, upload: &ObjectUpload) -> Result<(), Error> {
        let mut state = lock(&self.inner);
        let entry = state
            .buckets
            .get_mut(&upload.bucket)
            .ok_or_else(|| Error::storage(format!("NoSuchBucket: {}", upload.bucket)))?;
        entry
            .objects
            .insert(upload.key.clone(), upload.body.clone());
        state.uploads.push(upload.clone());
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{RecordPayload, RecordType};

    fn cname(name: &str) -> RecordSet {
        RecordSet {
            name: name.to_string(),
            record_type: RecordType::Cname,
            payload: RecordPayload::Values {
                ttl: 300,
                values: vec!["target.".to_string()],
            },
        }
    }

    #[tokio::test]
    async fn zone_pages_chain_through_markers() {
        let dns = MemoryDns::new().with_zone_page_size(2);
        for name in ["a.com", "b.com", "c.com"] {
            dns.insert_zone(name);
        }

        let first = dns.list_zones(None).await.unwrap();
        assert_eq!(first.zones.len(), 2);
        assert!(first.truncated);

        let second = dns
            .list_zones(first.next_marker.as_deref())
            .await
            .unwrap();
        assert_eq!(second.zones.len(), 1);
        assert_eq!(second.zones[0].name, "c.com.");
        assert!(!second.truncated);
        assert!(second.next_marker.is_none());
    }

    #[tokio::test]
    async fn record_listing_starts_at_name_and_truncates() {
        let dns = MemoryDns::new().with_record_page_size(1);
        let zone = dns.insert_zone("example.com");
        dns.insert_record(&zone.id, cname("a.example.com."));
        dns.insert_record(&zone.id, cname("b.example.com."));
        dns.insert_record(&zone.id, cname("c.example.com."));

        let page = dns.list_record_sets(&zone.id, "b.example.com.").await.unwrap();
        assert_eq!(page.record_sets[0].name, "b.example.com.");
        assert!(page.truncated);

        let page = dns.list_record_sets(&zone.id, "c.example.com.").await.unwrap();
        assert!(!page.truncated);
    }

    #[tokio::test]
    async fn duplicate_create_is_rejected() {
        let dns = MemoryDns::new();
        let zone = dns.insert_zone("example.com");
        let change = RecordChange::create(cname("www.example.com."));

        dns.submit_change_batch(&zone.id, &[change.clone()]).await.unwrap();
        assert!(dns.submit_change_batch(&zone.id, &[change]).await.is_err());
        assert_eq!(dns.change_batch_count(), 1);
        assert_eq!(dns.records(&zone.id).len(), 1);
    }

    #[tokio::test]
    async fn foreign_bucket_cannot_be_created() {
        let storage = MemoryStorage::new();
        storage.insert_foreign_bucket("example.com");

        assert!(storage.create_bucket("example.com", None).await.is_err());
        assert_eq!(storage.bucket_creations(), 0);
    }

    #[tokio::test]
    async fn object_presence_reports_missing_keys() {
        let storage = MemoryStorage::new();
        storage.insert_bucket("example.com", BucketWebsiteState::Unconfigured);
        storage.insert_object("example.com", "index.html", b"hi");

        assert_eq!(
            storage.object_presence("example.com", "index.html").await,
            ObjectPresence::Found
        );
        assert_eq!(
            storage.object_presence("example.com", "error.html").await,
            ObjectPresence::NotFound
        );

        storage.set_fail_object_reads(true);
        assert!(matches!(
            storage.object_presence("example.com", "error.html").await,
            ObjectPresence::Failed(_)
        ));
    }
}
