//! Contract Test: Convergence & Idempotency
//!
//! Constraints verified:
//! - A fresh domain ends up with one zone, two buckets, one website, one
//!   redirect, two placeholders and two records
//! - A second run against the converged domain makes no change at all
//! - Existing records are never rewritten, whatever they point at
//!
//! If this test fails, repeated runs are no longer safe.

mod common;

use common::*;
use sitehost_core::bucket::IdealizedBucketConfig;
use sitehost_core::records::RecordOutcome;
use sitehost_core::traits::{
    AliasTarget, BucketCreation, ChangeAction, RecordPayload, RecordSet, RecordType,
};
use sitehost_core::{MemoryDns, MemoryStorage, RegionId};

#[tokio::test]
async fn fresh_domain_converges_to_apex_website() {
    let dns = MemoryDns::new();
    let storage = MemoryStorage::new();
    let (provisioner, _rx) = provisioner(&dns, &storage, minimal_config("example.com"));

    let report = provisioner.run().await.expect("provisioning succeeds");

    // Zone
    assert!(report.zone.created);
    assert_eq!(report.zone.zone.name, "example.com.");
    assert_eq!(dns.zone_creations(), 1);

    // Buckets and roles
    assert_eq!(report.primary_domain, "example.com");
    assert_eq!(report.apex.role, IdealizedBucketConfig::Website);
    assert_eq!(report.www.role, IdealizedBucketConfig::Redirect);
    assert_eq!(report.apex.creation, BucketCreation::Created);
    assert_eq!(report.www.creation, BucketCreation::Created);
    assert_eq!(storage.bucket_state("example.com"), Some(website_state()));
    assert_eq!(
        storage.bucket_state("www.example.com"),
        Some(redirect_state("example.com"))
    );
    assert_eq!(report.website_buckets(), vec!["example.com"]);

    // Placeholders only in the website bucket
    assert_eq!(
        storage.object("example.com", "index.html").unwrap(),
        b"<html><head></head><body>Hello World!</body></html>".to_vec()
    );
    assert_eq!(
        storage.object("example.com", "error.html").unwrap(),
        b"<html><head></head><body>ERROR</body></html>".to_vec()
    );
    assert!(storage.object("www.example.com", "index.html").is_none());

    // Records
    assert_eq!(report.apex_record, RecordOutcome::Created);
    assert_eq!(report.www_record, RecordOutcome::Created);
    let batches = dns.change_batches();
    assert_eq!(batches.len(), 2, "one batch per missing record");
    assert_eq!(
        batches[0][0].record_set.payload,
        RecordPayload::Alias(AliasTarget {
            dns_name: "s3-website-us-east-1.amazonaws.com.".to_string(),
            hosted_zone_id: "Z3AQBSTGFYJSTF".to_string(),
            evaluate_target_health: false,
        })
    );
    assert_eq!(batches[1][0].record_set.name, "www.example.com.");
    assert_eq!(
        batches[1][0].record_set.payload,
        RecordPayload::Values {
            ttl: 300,
            values: vec!["www.example.com.s3-website-us-east-1.amazonaws.com.".to_string()],
        }
    );

    assert!(report.changes_made());
}

#[tokio::test]
async fn second_run_changes_nothing() {
    let dns = MemoryDns::new();
    let storage = MemoryStorage::new();

    let (first, _rx) = provisioner(&dns, &storage, minimal_config("example.com"));
    first.run().await.expect("first run succeeds");

    let batches_before = dns.change_batch_count();
    let writes_before = storage.config_writes();
    let uploads_before = storage.uploads().len();
    let creations_before = storage.bucket_creations();

    let (second, _rx) = provisioner(&dns, &storage, minimal_config("example.com"));
    let report = second.run().await.expect("second run succeeds");

    assert!(!report.changes_made(), "report: {:?}", report);
    assert_eq!(dns.zone_creations(), 1);
    assert_eq!(dns.change_batch_count(), batches_before);
    assert_eq!(storage.config_writes(), writes_before);
    assert_eq!(storage.uploads().len(), uploads_before);
    assert_eq!(storage.bucket_creations(), creations_before);
    assert_eq!(report.apex.creation, BucketCreation::AlreadyOwned);
    assert_eq!(report.apex_record, RecordOutcome::Existing);
    assert_eq!(report.www_record, RecordOutcome::Existing);
}

#[tokio::test]
async fn existing_cname_yields_single_apex_alias_batch() {
    let dns = MemoryDns::new();
    let zone = dns.insert_zone("example.com");
    dns.insert_record(
        &zone.id,
        RecordSet {
            name: "www.example.com.".to_string(),
            record_type: RecordType::Cname,
            payload: RecordPayload::Values {
                ttl: 60,
                values: vec!["elsewhere.example.net.".to_string()],
            },
        },
    );
    let storage = MemoryStorage::new();

    let (provisioner, _rx) = provisioner(&dns, &storage, minimal_config("example.com"));
    let report = provisioner.run().await.expect("provisioning succeeds");

    assert!(!report.zone.created);
    assert_eq!(report.www_record, RecordOutcome::Existing);

    let batches = dns.change_batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 1);
    assert_eq!(batches[0][0].action, ChangeAction::Create);
    assert_eq!(batches[0][0].record_set.name, "example.com.");
    assert_eq!(batches[0][0].record_set.record_type, RecordType::A);

    // The foreign CNAME is untouched
    let cname = dns
        .records(&zone.id)
        .into_iter()
        .find(|set| set.record_type == RecordType::Cname)
        .unwrap();
    assert_eq!(
        cname.payload,
        RecordPayload::Values {
            ttl: 60,
            values: vec!["elsewhere.example.net.".to_string()],
        }
    );
}

#[tokio::test]
async fn us_west_2_buckets_link_to_regional_endpoint() {
    let dns = MemoryDns::new();
    let storage = MemoryStorage::new();
    let (provisioner, _rx) = provisioner(&dns, &storage, minimal_config("example.org"));

    let report = provisioner
        .provision("Example.ORG.", RegionId::UsWest2)
        .await
        .expect("provisioning succeeds");

    assert_eq!(report.domain, "example.org");
    assert_eq!(report.region, RegionId::UsWest2);

    let batches = dns.change_batches();
    assert_eq!(
        batches[0][0].record_set.payload,
        RecordPayload::Alias(AliasTarget {
            dns_name: "s3-website-us-west-2.amazonaws.com.".to_string(),
            hosted_zone_id: "Z3BJ6K6RIION7M".to_string(),
            evaluate_target_health: false,
        })
    );
    assert_eq!(
        batches[1][0].record_set.payload,
        RecordPayload::Values {
            ttl: 300,
            values: vec!["www.example.org.s3-website-us-west-2.amazonaws.com.".to_string()],
        }
    );
}

#[tokio::test]
async fn disabled_placeholders_upload_nothing() {
    let dns = MemoryDns::new();
    let storage = MemoryStorage::new();
    let config = minimal_config("example.com").with_upload_placeholders(false);
    let (provisioner, _rx) = provisioner(&dns, &storage, config);

    let report = provisioner.run().await.expect("provisioning succeeds");

    assert!(storage.uploads().is_empty());
    assert!(report.apex.assets.is_empty());
    assert_eq!(storage.bucket_state("example.com"), Some(website_state()));
}
