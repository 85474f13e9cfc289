//! Hosting region profiles
//!
//! Every region the workflow can host in is listed here at compile time.
//! A profile bundles the values that must agree with each other when a
//! bucket in that region is exposed through DNS.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Static attributes of a hosting region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostingRegion {
    /// Region identifier, e.g. `us-east-1`
    pub name: &'static str,
    /// DNS zone id of the regional website endpoint, used by alias records
    pub alias_zone_id: &'static str,
    /// Website endpoint hostname for buckets in this region
    pub endpoint: &'static str,
    /// Location constraint passed at bucket creation; `None` is the
    /// provider's default location
    pub location_hint: Option<&'static str>,
}

const US_EAST_1: HostingRegion = HostingRegion {
    name: "us-east-1",
    alias_zone_id: "Z3AQBSTGFYJSTF",
    endpoint: "s3-website-us-east-1.amazonaws.com",
    location_hint: None,
};

const US_WEST_2: HostingRegion = HostingRegion {
    name: "us-west-2",
    alias_zone_id: "Z3BJ6K6RIION7M",
    endpoint: "s3-website-us-west-2.amazonaws.com",
    location_hint: Some("us-west-2"),
};

/// Identifier of a known hosting region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RegionId {
    /// US East (N. Virginia), the provider's standard region
    #[default]
    #[serde(rename = "us-east-1", alias = "us-standard")]
    UsEast1,
    /// US West (Oregon)
    #[serde(rename = "us-west-2")]
    UsWest2,
}

impl RegionId {
    /// All known regions
    pub const ALL: [RegionId; 2] = [RegionId::UsEast1, RegionId::UsWest2];

    /// The static profile for this region
    pub fn profile(self) -> &'static HostingRegion {
        match self {
            RegionId::UsEast1 => &US_EAST_1,
            RegionId::UsWest2 => &US_WEST_2,
        }
    }

    /// Region identifier as used on the wire
    pub fn as_str(self) -> &'static str {
        self.profile().name
    }
}

impl FromStr for RegionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "us-east-1" | "us-standard" => Ok(RegionId::UsEast1),
            "us-west-2" => Ok(RegionId::UsWest2),
            _ => Err(Error::invalid_input(format!(
                "Unknown region '{}'. Known regions: {}",
                s,
                RegionId::ALL.map(RegionId::as_str).join(", ")
            ))),
        }
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
