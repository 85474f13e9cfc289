//! Configuration types for sitehost
//!
//! This module defines the configuration accepted by [`crate::WebsiteProvisioner`].

use serde::{Deserialize, Serialize};

use crate::domain::Domain;
use crate::region::RegionId;

/// Configuration of one provisioning run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionConfig {
    /// Apex domain to host
    pub domain: String,

    /// Region the buckets live in
    #[serde(default)]
    pub region: RegionId,

    /// Upload placeholder `index.html` / `error.html` to the website bucket
    /// when they are missing
    #[serde(default = "default_upload_placeholders")]
    pub upload_placeholders: bool,

    /// Fail instead of warning when both buckets already serve content
    #[serde(default)]
    pub strict_exclusivity: bool,

    /// Capacity of the provisioning event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl ProvisionConfig {
    /// Create a configuration with defaults for the given domain and region
    pub fn new(domain: impl Into<String>, region: RegionId) -> Self {
        Self {
            domain: domain.into(),
            region,
            upload_placeholders: default_upload_placeholders(),
            strict_exclusivity: false,
            event_channel_capacity: default_event_channel_capacity(),
        }
    }

    /// Enable or disable placeholder uploads
    pub fn with_upload_placeholders(mut self, enabled: bool) -> Self {
        self.upload_placeholders = enabled;
        self
    }

    /// Enable or disable strict exclusivity
    pub fn with_strict_exclusivity(mut self, enabled: bool) -> Self {
        self.strict_exclusivity = enabled;
        self
    }

    /// Validate the configuration, returning the parsed domain
    pub fn validate(&self) -> Result<Domain, crate::Error> {
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }

        Domain::parse(&self.domain)
    }
}

fn default_upload_placeholders() -> bool {
    true
}

fn default_event_channel_capacity() -> usize {
    64
}
