//! Bucket classification and configuration
//!
//! Of the two buckets serving a domain, one is the real website and the
//! other redirects to it. [`BucketClassifier`] decides which role a bucket
//! plays from what is already configured on it, falling back to a desired
//! role only when nothing is configured. [`BucketConfigurator`] creates the
//! buckets and writes the website configuration, once.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;
use crate::traits::{BucketCreation, BucketWebsiteState, StorageClient, WebsiteConfig};

/// Index document suffix of website buckets
pub const INDEX_DOCUMENT: &str = "index.html";

/// Error document key of website buckets
pub const ERROR_DOCUMENT: &str = "error.html";

/// HTTP status of redirect buckets
pub const REDIRECT_STATUS: u16 = 301;

/// The role a bucket plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdealizedBucketConfig {
    /// Serves the site's content
    Website,
    /// Redirects every request to the website bucket's domain
    Redirect,
}

/// Classify an observed state, using `desired` only when unconfigured
///
/// Observed configuration always wins over the desired default.
pub fn classify_state(
    state: &BucketWebsiteState,
    desired: IdealizedBucketConfig,
) -> IdealizedBucketConfig {
    match state {
        BucketWebsiteState::Unconfigured => desired,
        BucketWebsiteState::Redirect { .. } => IdealizedBucketConfig::Redirect,
        BucketWebsiteState::Website { .. } => IdealizedBucketConfig::Website,
    }
}

/// The configuration written for a role
///
/// `primary_domain` is the redirect target; it is ignored for websites.
pub fn website_config_for(
    role: IdealizedBucketConfig,
    primary_domain: &str,
) -> WebsiteConfig {
    match role {
        IdealizedBucketConfig::Website => WebsiteConfig::Website {
            index_document: INDEX_DOCUMENT.to_string(),
            error_document: ERROR_DOCUMENT.to_string(),
        },
        IdealizedBucketConfig::Redirect => WebsiteConfig::Redirect {
            host: primary_domain.to_string(),
            status_code: REDIRECT_STATUS,
        },
    }
}

/// Reads bucket website state and classifies it
pub struct BucketClassifier<'a> {
    storage: &'a dyn StorageClient,
}

impl<'a> BucketClassifier<'a> {
    /// Create a classifier on top of a storage client
    pub fn new(storage: &'a dyn StorageClient) -> Self {
        Self { storage }
    }

    /// Read the bucket's current website state
    pub async fn observe(&self, bucket: &str) -> Result<BucketWebsiteState> {
        let state = self.storage.website_state(bucket).await?;
        debug!(bucket, state = ?state, "Read bucket website state");
        Ok(state)
    }

    /// Read and classify a bucket; no side effects
    pub async fn classify(
        &self,
        bucket: &str,
        desired_if_unconfigured: IdealizedBucketConfig,
    ) -> Result<ClassifiedBucket> {
        let observed = self.observe(bucket).await?;
        let role = classify_state(&observed, desired_if_unconfigured);
        Ok(ClassifiedBucket { observed, role })
    }
}

/// A bucket's website state and the role it was classified into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedBucket {
    pub observed: BucketWebsiteState,
    pub role: IdealizedBucketConfig,
}

/// Creates buckets and writes website configuration
pub struct BucketConfigurator<'a> {
    storage: &'a dyn StorageClient,
}

impl<'a> BucketConfigurator<'a> {
    /// Create a configurator on top of a storage client
    pub fn new(storage: &'a dyn StorageClient) -> Self {
        Self { storage }
    }

    /// Make sure the bucket exists and belongs to the caller
    ///
    /// "Already owned by caller" counts as success; every other failure
    /// propagates.
    pub async fn ensure_bucket_exists(
        &self,
        bucket: &str,
        location_hint: Option<&str>,
    ) -> Result<BucketCreation> {
        let creation = self.storage.create_bucket(bucket, location_hint).await?;
        match creation {
            BucketCreation::Created => info!(bucket, "Created bucket"),
            BucketCreation::AlreadyOwned => debug!(bucket, "Bucket already owned"),
        }
        Ok(creation)
    }

    /// Write the configuration for `role`, but only if `observed` is unconfigured
    ///
    /// Returns whether a configuration was written. An existing configuration
    /// is never replaced, even if it disagrees with `role`.
    pub async fn configure_if_unconfigured(
        &self,
        bucket: &str,
        observed: &BucketWebsiteState,
        role: IdealizedBucketConfig,
        primary_domain: &str,
    ) -> Result<bool> {
        if !observed.is_unconfigured() {
            debug!(bucket, "Bucket already configured, leaving it untouched");
            return Ok(false);
        }

        let config = website_config_for(role, primary_domain);
        self.storage.set_website_config(bucket, &config).await?;

        match &config {
            WebsiteConfig::Website { .. } => info!(bucket, "Configured bucket as website"),
            WebsiteConfig::Redirect { host, .. } => {
                info!(bucket, redirect_to = %host, "Configured bucket as redirect")
            }
        }
        Ok(true)
    }
}
