// # sitehost-core
//
// Core library for provisioning static websites on a DNS provider and an
// object storage provider.
//
// ## Architecture Overview
//
// - **DnsClient**: Trait for hosted zones and record sets
// - **StorageClient**: Trait for buckets, website configuration and objects
// - **ZoneResolver**: Finds the hosted zone of a domain or creates it
// - **BucketClassifier / BucketConfigurator**: Decide which bucket serves
//   content and which redirects, then configure unconfigured buckets
// - **RecordReconciler**: Creates the apex alias and `www` CNAME if missing
// - **WebsiteProvisioner**: Runs the above in order and reports what changed
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Workflow logic knows nothing about a
//    concrete provider SDK
// 2. **Create-Only**: Existing zones, buckets, configuration and records are
//    observed and kept, never rewritten
// 3. **Idempotency**: A second run against a converged domain changes nothing
// 4. **Library-First**: The binary is a thin shell over this crate

pub mod bucket;
pub mod config;
pub mod domain;
pub mod error;
pub mod memory;
pub mod records;
pub mod region;
pub mod traits;
pub mod workflow;
pub mod zone;

// Re-export core types for convenience
pub use bucket::{BucketClassifier, BucketConfigurator, ClassifiedBucket, IdealizedBucketConfig};
pub use config::ProvisionConfig;
pub use domain::Domain;
pub use error::{Error, Result};
pub use memory::{MemoryDns, MemoryStorage};
pub use records::{RecordOutcome, RecordReconciler};
pub use region::{HostingRegion, RegionId};
pub use traits::{DnsClient, StorageClient};
pub use workflow::{ProvisionEvent, ProvisionReport, WebsiteProvisioner};
pub use zone::{CallerReferenceSource, ResolvedZone, UuidCallerReference, ZoneResolver};
