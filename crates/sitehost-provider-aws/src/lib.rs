// # AWS Providers
//
// Route 53 (`DnsClient`) and S3 (`StorageClient`) adapters for sitehost.
//
// ## Responsibilities
//
// - Translate trait calls into one SDK call each (bucket creation checks
//   `HeadBucket` first)
// - Turn the two expected S3 answers into values: "bucket already owned by
//   you" and "no such key"
// - Turn "no such website configuration" into an unconfigured bucket
// - Map every other SDK failure to `Error::Provider` with full context
//
// ## Not Here
//
// - No retries beyond the SDK's own policy
// - No workflow decisions: classification, idempotency and ordering are
//   owned by `sitehost-core`
//
// ## Credentials
//
// Loaded by the AWS default provider chain (environment, profile, IMDS).
// Nothing in this crate reads or logs credentials.

pub mod route53;
pub mod s3;

pub use route53::Route53Dns;
pub use s3::S3Storage;

use aws_config::{BehaviorVersion, Region, SdkConfig};
use sitehost_core::RegionId;
use tracing::debug;

/// Load the SDK configuration for a hosting region
pub async fn load_sdk_config(region: RegionId) -> SdkConfig {
    debug!(region = %region, "Loading AWS configuration");
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.as_str()))
        .load()
        .await
}

/// Both clients, built from one SDK configuration
pub fn clients(sdk_config: &SdkConfig) -> (Route53Dns, S3Storage) {
    (Route53Dns::new(sdk_config), S3Storage::new(sdk_config))
}
