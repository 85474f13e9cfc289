//! Provisioning report
//!
//! Returned by a successful run. It records what was observed and what was
//! changed, so a caller can tell a converged domain from one that was just
//! set up.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::assets::AssetOutcome;
use crate::bucket::IdealizedBucketConfig;
use crate::records::RecordOutcome;
use crate::region::RegionId;
use crate::traits::{BucketCreation, BucketWebsiteState};
use crate::zone::ResolvedZone;

/// What happened to one bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketReport {
    /// Bucket name
    pub name: String,
    /// Whether the bucket was created by this run
    pub creation: BucketCreation,
    /// Website state read before any write
    pub observed: BucketWebsiteState,
    /// Resolved role
    pub role: IdealizedBucketConfig,
    /// Whether this run wrote the website configuration
    pub configured: bool,
    /// Placeholder outcomes (empty for redirect buckets or when disabled)
    pub assets: Vec<AssetOutcome>,
}

impl BucketReport {
    /// Whether this run changed anything on the bucket
    pub fn changed(&self) -> bool {
        self.creation == BucketCreation::Created
            || self.configured
            || self.assets.iter().any(AssetOutcome::is_upload)
    }
}

/// Result of a successful provisioning run
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionReport {
    /// Apex domain
    pub domain: String,
    /// Hosting region
    pub region: RegionId,
    /// Hosted zone used
    pub zone: ResolvedZone,
    /// Domain served by the website bucket
    pub primary_domain: String,
    /// Apex bucket
    pub apex: BucketReport,
    /// `www` bucket
    pub www: BucketReport,
    /// Apex alias record
    pub apex_record: RecordOutcome,
    /// `www` CNAME record
    pub www_record: RecordOutcome,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished
    pub finished_at: DateTime<Utc>,
}

impl ProvisionReport {
    /// Whether the run created or wrote anything
    pub fn changes_made(&self) -> bool {
        self.zone.created
            || self.apex.changed()
            || self.www.changed()
            || self.apex_record == RecordOutcome::Created
            || self.www_record == RecordOutcome::Created
    }

    /// Buckets resolved as websites (two only in the ambiguous case)
    pub fn website_buckets(&self) -> Vec<&str> {
        [&self.apex, &self.www]
            .into_iter()
            .filter(|b| b.role == IdealizedBucketConfig::Website)
            .map(|b| b.name.as_str())
            .collect()
    }
}
