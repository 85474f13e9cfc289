//! Hosted zone lookup-or-create
//!
//! [`ZoneResolver`] pages through every hosted zone looking for an exact
//! name match and creates the zone only when no page contains it.

use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::Domain;
use crate::error::{Error, Result};
use crate::traits::{DnsClient, DnsZone};

/// Source of caller references for zone creation
///
/// The provider rejects a reused caller reference, so every call must
/// return a fresh value. Tests inject a fixed source.
pub trait CallerReferenceSource: Send + Sync {
    /// Produce a reference for creating the zone of `domain`
    fn next_reference(&self, domain: &Domain) -> String;
}

/// Random v4 UUID caller references
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidCallerReference;

impl CallerReferenceSource for UuidCallerReference {
    fn next_reference(&self, _domain: &Domain) -> String {
        Uuid::new_v4().to_string()
    }
}

/// A zone together with whether this run created it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedZone {
    /// The zone
    pub zone: DnsZone,
    /// Whether `ensure_zone_exists` created it
    pub created: bool,
}

/// Finds or creates the hosted zone for a domain
pub struct ZoneResolver<'a> {
    dns: &'a dyn DnsClient,
    references: &'a dyn CallerReferenceSource,
}

impl<'a> ZoneResolver<'a> {
    /// Create a resolver using random caller references
    pub fn new(dns: &'a dyn DnsClient) -> Self {
        Self {
            dns,
            references: &UuidCallerReference,
        }
    }

    /// Create a resolver with an explicit caller reference source
    pub fn with_references(
        dns: &'a dyn DnsClient,
        references: &'a dyn CallerReferenceSource,
    ) -> Self {
        Self { dns, references }
    }

    /// Return the zone named `domain.`, creating it if no zone matches
    ///
    /// At most one zone is created per call. Provider failures propagate.
    pub async fn ensure_zone_exists(&self, domain: &Domain) -> Result<ResolvedZone> {
        if let Some(zone) = self.find_zone(domain).await? {
            debug!(zone_id = %zone.id, zone = %zone.name, "Found existing hosted zone");
            return Ok(ResolvedZone {
                zone,
                created: false,
            });
        }

        let name = domain.fqdn();
        let caller_reference = self.references.next_reference(domain);
        let comment = format!("Static website zone for {}", domain);

        let zone = self
            .dns
            .create_zone(&name, &caller_reference, &comment)
            .await?;

        info!(
            zone_id = %zone.id,
            zone = %zone.name,
            caller_reference = %caller_reference,
            "Created hosted zone"
        );

        Ok(ResolvedZone {
            zone,
            created: true,
        })
    }

    /// Scan all zone pages for an exact `domain.` match
    pub async fn find_zone(&self, domain: &Domain) -> Result<Option<DnsZone>> {
        let target = domain.fqdn();
        let mut marker: Option<String> = None;
        let mut page_count = 0usize;

        loop {
            page_count += 1;
            let page = self.dns.list_zones(marker.as_deref()).await?;

            debug!(
                page = page_count,
                zones_in_page = page.zones.len(),
                truncated = page.truncated,
                "Fetched hosted zone page"
            );

            if let Some(zone) = page.zones.into_iter().find(|zone| zone.name == target) {
                return Ok(Some(zone));
            }

            if !page.truncated {
                return Ok(None);
            }

            match page.next_marker {
                Some(next) if marker.as_deref() != Some(next.as_str()) => marker = Some(next),
                Some(next) => {
                    return Err(Error::dns(format!(
                        "Zone listing returned the same marker twice: {}",
                        next
                    )));
                }
                None => {
                    return Err(Error::dns(
                        "Zone listing is truncated but has no next marker",
                    ));
                }
            }
        }
    }
}
