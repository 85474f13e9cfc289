// # DNS Client Trait
//
// Defines the capabilities the workflow needs from a DNS zone/record provider.
//
// ## Implementations
//
// - Route 53: `sitehost-provider-aws` crate
// - In-memory: `sitehost_core::memory::MemoryDns` (tests, dry runs)
//
// ## Usage
//
// ```rust,ignore
// use sitehost_core::DnsClient;
//
// let page = dns.list_zones(None).await?;
// for zone in &page.zones {
//     println!("{} {}", zone.id, zone.name);
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A hosted zone as reported by the provider
///
/// `name` always carries the trailing dot (`example.com.`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsZone {
    /// Opaque provider id
    pub id: String,
    /// Fully qualified zone name
    pub name: String,
}

/// One page of a zone listing
#[derive(Debug, Clone, Default)]
pub struct ZonePage {
    /// Zones on this page
    pub zones: Vec<DnsZone>,
    /// Marker to pass to the next `list_zones` call
    pub next_marker: Option<String>,
    /// Whether more pages follow
    pub truncated: bool,
}

/// DNS record type
///
/// Parsing is case-insensitive; provider payloads may use either case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    /// Address record (used with an alias target at the apex)
    A,
    /// Canonical name record
    Cname,
    /// Any other type; never created by this crate
    Other(String),
}

impl RecordType {
    /// Parse a wire type name
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("A") {
            RecordType::A
        } else if value.eq_ignore_ascii_case("CNAME") {
            RecordType::Cname
        } else {
            RecordType::Other(value.to_ascii_uppercase())
        }
    }

    /// Wire type name
    pub fn as_str(&self) -> &str {
        match self {
            RecordType::A => "A",
            RecordType::Cname => "CNAME",
            RecordType::Other(other) => other,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alias target pointing a record at another service's endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasTarget {
    /// Target hostname, trailing dot included
    pub dns_name: String,
    /// Zone id owning the target hostname
    pub hosted_zone_id: String,
    /// Whether the provider should evaluate target health
    pub evaluate_target_health: bool,
}

/// Type-specific record payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordPayload {
    /// Alias-style record
    Alias(AliasTarget),
    /// Literal values with a TTL
    Values {
        /// Time-to-live in seconds
        ttl: u32,
        /// Record values
        values: Vec<String>,
    },
}

/// A record set, identified by `(name, record_type)` within a zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSet {
    /// Fully qualified record name (trailing dot)
    pub name: String,
    /// Record type
    pub record_type: RecordType,
    /// Payload
    pub payload: RecordPayload,
}

/// One page of a record set listing
#[derive(Debug, Clone, Default)]
pub struct RecordSetPage {
    /// Record sets on this page, in provider order
    pub record_sets: Vec<RecordSet>,
    /// Whether more record sets follow this page
    pub truncated: bool,
}

/// Action of a single change in a batch
///
/// The workflow only ever creates records, so this is the only action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeAction {
    /// Create a record set that does not exist yet
    Create,
}

/// A single change submitted in a change batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordChange {
    /// What to do
    pub action: ChangeAction,
    /// The record set it applies to
    pub record_set: RecordSet,
}

impl RecordChange {
    /// A `CREATE` change for the given record set
    pub fn create(record_set: RecordSet) -> Self {
        Self {
            action: ChangeAction::Create,
            record_set,
        }
    }
}

/// Trait for DNS provider implementations
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Contract
///
/// - Every method performs one provider call and returns its result.
/// - No retry, backoff or caching: transient failures are returned as
///   errors and the caller decides what to do.
/// - Zone and record names are returned in the provider's normalized form
///   (trailing dot).
#[async_trait]
pub trait DnsClient: Send + Sync {
    /// List one page of hosted zones
    ///
    /// # Parameters
    ///
    /// - `marker`: `None` for the first page, else the previous page's `next_marker`
    async fn list_zones(&self, marker: Option<&str>) -> Result<ZonePage, crate::Error>;

    /// Create a hosted zone
    ///
    /// # Parameters
    ///
    /// - `name`: Zone name, trailing dot included
    /// - `caller_reference`: Unique token; the provider rejects reuse
    /// - `comment`: Human-readable comment stored with the zone
    async fn create_zone(
        &self,
        name: &str,
        caller_reference: &str,
        comment: &str,
    ) -> Result<DnsZone, crate::Error>;

    /// List one page of record sets, starting at `start_name`
    async fn list_record_sets(
        &self,
        zone_id: &str,
        start_name: &str,
    ) -> Result<RecordSetPage, crate::Error>;

    /// Submit a change batch; all changes apply atomically or not at all
    async fn submit_change_batch(
        &self,
        zone_id: &str,
        changes: &[RecordChange],
    ) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_type_matches_case_insensitively() {
        assert_eq!(RecordType::parse("cname"), RecordType::Cname);
        assert_eq!(RecordType::parse("CName"), RecordType::Cname);
        assert_eq!(RecordType::parse("a"), RecordType::A);
        assert_eq!(RecordType::parse("aaaa"), RecordType::Other("AAAA".to_string()));
        assert_eq!(RecordType::parse("cname").to_string(), "CNAME");
    }
}
