//! Create-only record reconciliation
//!
//! [`RecordReconciler`] links the apex and the `www` name to the storage
//! website endpoint. Records are only ever created: an existing record set
//! with the same `(name, type)` is left untouched, whatever its payload.
//!
//! ## Scale Limit
//!
//! Lookups read exactly one page of record sets starting at the wanted name.
//! A truncated page fails with [`Error::ScaleLimit`] instead of silently
//! scanning further, so very large zones are rejected rather than
//! half-checked.

use serde::Serialize;
use tracing::{debug, info};

use crate::domain::{Domain, qualify};
use crate::error::{Error, Result};
use crate::region::HostingRegion;
use crate::traits::{
    AliasTarget, DnsClient, DnsZone, RecordChange, RecordPayload, RecordSet, RecordType,
};

/// TTL of the `www` CNAME record
pub const CNAME_TTL_SECS: u32 = 300;

/// What a link operation did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOutcome {
    /// A record set of that name and type was already present
    Existing,
    /// A record set was created by this call
    Created,
}

/// Build the apex alias record pointing at the region's website endpoint
pub fn apex_alias_record(domain: &Domain, region: &HostingRegion) -> RecordSet {
    RecordSet {
        name: domain.fqdn(),
        record_type: RecordType::A,
        payload: RecordPayload::Alias(AliasTarget {
            dns_name: qualify(region.endpoint),
            hosted_zone_id: region.alias_zone_id.to_string(),
            evaluate_target_health: false,
        }),
    }
}

/// Build the CNAME record for `name`, pointing at `<name>.<endpoint>.`
pub fn cname_record(name: &str, region: &HostingRegion) -> RecordSet {
    let name = name.trim_end_matches('.');
    RecordSet {
        name: qualify(name),
        record_type: RecordType::Cname,
        payload: RecordPayload::Values {
            ttl: CNAME_TTL_SECS,
            values: vec![format!("{}.{}.", name, region.endpoint)],
        },
    }
}

/// Finds record sets and creates the website links when they are absent
pub struct RecordReconciler<'a> {
    dns: &'a dyn DnsClient,
}

impl<'a> RecordReconciler<'a> {
    /// Create a reconciler on top of a DNS client
    pub fn new(dns: &'a dyn DnsClient) -> Self {
        Self { dns }
    }

    /// Find the record set with exactly this name and type
    ///
    /// # Errors
    ///
    /// - [`Error::ScaleLimit`] if the provider reports the page as truncated
    /// - Provider errors, unchanged
    pub async fn find_record(
        &self,
        name: &str,
        record_type: &RecordType,
        zone: &DnsZone,
    ) -> Result<Option<RecordSet>> {
        let fqdn = qualify(name);
        debug!(
            name = %fqdn,
            record_type = %record_type,
            zone_id = %zone.id,
            "Looking up record set"
        );

        let page = self.dns.list_record_sets(&zone.id, &fqdn).await?;

        if page.truncated {
            return Err(Error::scale_limit(format!(
                "Hosted zone {} has more record sets from {} than one page; refusing to scan further",
                zone.name, fqdn
            )));
        }

        Ok(page
            .record_sets
            .into_iter()
            .find(|set| set.name == fqdn && set.record_type == *record_type))
    }

    /// Ensure an `A` alias record exists at the apex
    pub async fn ensure_apex_link(
        &self,
        domain: &Domain,
        zone: &DnsZone,
        region: &HostingRegion,
    ) -> Result<RecordOutcome> {
        self.ensure_record(zone, apex_alias_record(domain, region))
            .await
    }

    /// Ensure a CNAME record exists at `name`
    pub async fn ensure_cname_link(
        &self,
        name: &str,
        zone: &DnsZone,
        region: &HostingRegion,
    ) -> Result<RecordOutcome> {
        self.ensure_record(zone, cname_record(name, region)).await
    }

    async fn ensure_record(&self, zone: &DnsZone, record_set: RecordSet) -> Result<RecordOutcome> {
        if self
            .find_record(&record_set.name, &record_set.record_type, zone)
            .await?
            .is_some()
        {
            debug!(
                name = %record_set.name,
                record_type = %record_set.record_type,
                "Record set already present, leaving it untouched"
            );
            return Ok(RecordOutcome::Existing);
        }

        let name = record_set.name.clone();
        let record_type = record_set.record_type.clone();
        self.dns
            .submit_change_batch(&zone.id, &[RecordChange::create(record_set)])
            .await?;

        info!(name = %name, record_type = %record_type, zone_id = %zone.id, "Created record set");
        Ok(RecordOutcome::Created)
    }
}
