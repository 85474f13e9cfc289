// # Storage Client Trait
//
// Defines the capabilities the workflow needs from an object-storage /
// static-hosting provider.
//
// ## Implementations
//
// - S3: `sitehost-provider-aws` crate
// - In-memory: `sitehost_core::memory::MemoryStorage`
//
// ## Expected Provider Responses
//
// Two provider responses are part of normal operation and are returned as
// values instead of errors:
//
// - Creating a bucket the caller already owns → `BucketCreation::AlreadyOwned`
// - Reading an object that does not exist → `ObjectPresence::NotFound`

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Outcome of a bucket creation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BucketCreation {
    /// The bucket was created by this call
    Created,
    /// The bucket already exists and belongs to the caller
    AlreadyOwned,
}

/// A website configuration that can be written to a bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WebsiteConfig {
    /// Serve objects as a static site
    Website {
        /// Suffix appended to directory requests
        index_document: String,
        /// Object returned on 4xx errors
        error_document: String,
    },
    /// Redirect every request to another host
    Redirect {
        /// Host requests are redirected to
        host: String,
        /// HTTP status used for the redirect
        status_code: u16,
    },
}

/// Observed website state of a bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BucketWebsiteState {
    /// No website configuration at all
    Unconfigured,
    /// Serving content
    Website {
        /// Index document suffix
        index_document: String,
        /// Error document key
        error_document: String,
    },
    /// Redirecting all requests
    Redirect {
        /// Redirect target host
        host: String,
        /// HTTP status of the redirect
        status_code: u16,
    },
}

impl BucketWebsiteState {
    /// Whether no configuration exists yet
    pub fn is_unconfigured(&self) -> bool {
        matches!(self, BucketWebsiteState::Unconfigured)
    }
}

impl From<WebsiteConfig> for BucketWebsiteState {
    fn from(config: WebsiteConfig) -> Self {
        match config {
            WebsiteConfig::Website {
                index_document,
                error_document,
            } => BucketWebsiteState::Website {
                index_document,
                error_document,
            },
            WebsiteConfig::Redirect { host, status_code } => {
                BucketWebsiteState::Redirect { host, status_code }
            }
        }
    }
}

/// Result of an object existence check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectPresence {
    /// The object exists
    Found,
    /// The provider reported "no such key"
    NotFound,
    /// Any other failure, with provider detail
    Failed(String),
}

/// Canned access control for uploaded objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectAcl {
    /// Anyone may read
    PublicRead,
}

/// Storage class for uploaded objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageClass {
    /// Lower durability, lower cost
    ReducedRedundancy,
}

/// A single object upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectUpload {
    /// Target bucket
    pub bucket: String,
    /// Object key
    pub key: String,
    /// Object body
    pub body: Vec<u8>,
    /// Content-Type header
    pub content_type: String,
    /// Canned ACL
    pub acl: ObjectAcl,
    /// Storage class
    pub storage_class: StorageClass,
}

/// Trait for storage provider implementations
///
/// Same contract as [`crate::DnsClient`]: one provider call per method,
/// no retries, no caching. `create_bucket` may first check whether the
/// bucket exists.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Create a bucket
    ///
    /// # Parameters
    ///
    /// - `name`: Bucket name
    /// - `location_hint`: Location constraint, `None` for the default location
    ///
    /// # Returns
    ///
    /// - `Ok(BucketCreation)`: Created, or already owned by the caller. A
    ///   bucket the caller already owns is `AlreadyOwned` even where the
    ///   provider's create call would succeed silently.
    /// - `Err(Error)`: Any other failure (including "owned by someone else")
    async fn create_bucket(
        &self,
        name: &str,
        location_hint: Option<&str>,
    ) -> Result<BucketCreation, crate::Error>;

    /// Read the bucket's website configuration
    async fn website_state(&self, bucket: &str) -> Result<BucketWebsiteState, crate::Error>;

    /// Write the bucket's website configuration
    async fn set_website_config(
        &self,
        bucket: &str,
        config: &WebsiteConfig,
    ) -> Result<(), crate::Error>;

    /// Check whether an object exists
    async fn object_presence(&self, bucket: &str, key: &str) -> ObjectPresence;

    /// Upload an object
    async fn put_object(&self, upload: &ObjectUpload) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
