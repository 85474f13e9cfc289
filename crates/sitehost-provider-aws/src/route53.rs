//! Route 53 implementation of [`DnsClient`]

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_route53::Client;
use aws_sdk_route53::error::DisplayErrorContext;
use aws_sdk_route53::types::{
    AliasTarget as SdkAliasTarget, Change, ChangeAction as SdkChangeAction, ChangeBatch,
    HostedZone, HostedZoneConfig, ResourceRecord, ResourceRecordSet, RrType,
};
use sitehost_core::traits::{
    AliasTarget, ChangeAction, DnsClient, DnsZone, RecordChange, RecordPayload, RecordSet,
    RecordSetPage, RecordType, ZonePage,
};
use sitehost_core::{Error, Result};
use tracing::debug;

const PROVIDER: &str = "route53";

/// Prefix Route 53 puts in front of zone ids in responses
const HOSTED_ZONE_PREFIX: &str = "/hostedzone/";

/// Route 53 DNS client
///
/// One SDK call per trait method. Retries are whatever the SDK's default
/// retry policy does; this type adds none.
#[derive(Debug, Clone)]
pub struct Route53Dns {
    client: Client,
}

impl Route53Dns {
    /// Create a client from a loaded SDK configuration
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }
}

fn provider_error(operation: &str, err: impl std::error::Error) -> Error {
    Error::provider(
        PROVIDER,
        format!("{} failed: {}", operation, DisplayErrorContext(err)),
    )
}

/// Strip the `/hostedzone/` prefix from a zone id
pub(crate) fn zone_id_from_sdk(id: &str) -> String {
    id.strip_prefix(HOSTED_ZONE_PREFIX).unwrap_or(id).to_string()
}

pub(crate) fn zone_from_sdk(zone: &HostedZone) -> DnsZone {
    DnsZone {
        id: zone_id_from_sdk(zone.id()),
        name: zone.name().to_string(),
    }
}

/// Convert an SDK record set into the provider-neutral form
pub(crate) fn record_set_from_sdk(set: &ResourceRecordSet) -> RecordSet {
    let payload = match set.alias_target() {
        Some(alias) => RecordPayload::Alias(AliasTarget {
            dns_name: alias.dns_name().to_string(),
            hosted_zone_id: alias.hosted_zone_id().to_string(),
            evaluate_target_health: alias.evaluate_target_health(),
        }),
        None => RecordPayload::Values {
            ttl: set
                .ttl()
                .and_then(|ttl| u32::try_from(ttl).ok())
                .unwrap_or_default(),
            values: set
                .resource_records()
                .iter()
                .map(|record| record.value().to_string())
                .collect(),
        },
    };

    RecordSet {
        name: set.name().to_string(),
        record_type: RecordType::parse(set.r#type().as_str()),
        payload,
    }
}

/// Convert a provider-neutral record set into an SDK record set
pub(crate) fn record_set_to_sdk(set: &RecordSet) -> Result<ResourceRecordSet> {
    let builder = ResourceRecordSet::builder()
        .name(&set.name)
        .r#type(RrType::from(set.record_type.as_str()));

    let builder = match &set.payload {
        RecordPayload::Alias(alias) => {
            let target = SdkAliasTarget::builder()
                .dns_name(&alias.dns_name)
                .hosted_zone_id(&alias.hosted_zone_id)
                .evaluate_target_health(alias.evaluate_target_health)
                .build()
                .map_err(|e| provider_error("building alias target", e))?;
            builder.alias_target(target)
        }
        RecordPayload::Values { ttl, values } => {
            let records = values
                .iter()
                .map(|value| {
                    ResourceRecord::builder()
                        .value(value)
                        .build()
                        .map_err(|e| provider_error("building resource record", e))
                })
                .collect::<Result<Vec<_>>>()?;
            builder
                .ttl(i64::from(*ttl))
                .set_resource_records(Some(records))
        }
    };

    builder
        .build()
        .map_err(|e| provider_error("building record set", e))
}

fn change_to_sdk(change: &RecordChange) -> Result<Change> {
    let action = match change.action {
        ChangeAction::Create => SdkChangeAction::Create,
    };
    Change::builder()
        .action(action)
        .resource_record_set(record_set_to_sdk(&change.record_set)?)
        .build()
        .map_err(|e| provider_error("building change", e))
}

#[async_trait]
impl DnsClient for Route53Dns {
    async fn list_zones(&self, marker: Option<&str>) -> Result<ZonePage> {
        let output = self
            .client
            .list_hosted_zones()
            .set_marker(marker.map(str::to_string))
            .send()
            .await
            .map_err(|e| provider_error("ListHostedZones", e))?;

        let zones: Vec<DnsZone> = output.hosted_zones().iter().map(zone_from_sdk).collect();
        debug!(count = zones.len(), truncated = output.is_truncated(), "Listed hosted zones");

        Ok(ZonePage {
            zones,
            next_marker: output.next_marker().map(str::to_string),
            truncated: output.is_truncated(),
        })
    }

    async fn create_zone(
        &self,
        name: &str,
        caller_reference: &str,
        comment: &str,
    ) -> Result<DnsZone> {
        let output = self
            .client
            .create_hosted_zone()
            .name(name)
            .caller_reference(caller_reference)
            .hosted_zone_config(HostedZoneConfig::builder().comment(comment).build())
            .send()
            .await
            .map_err(|e| provider_error("CreateHostedZone", e))?;

        output
            .hosted_zone()
            .map(zone_from_sdk)
            .ok_or_else(|| Error::provider(PROVIDER, "CreateHostedZone returned no hosted zone"))
    }

    async fn list_record_sets(&self, zone_id: &str, start_name: &str) -> Result<RecordSetPage> {
        let output = self
            .client
            .list_resource_record_sets()
            .hosted_zone_id(zone_id)
            .start_record_name(start_name)
            .send()
            .await
            .map_err(|e| provider_error("ListResourceRecordSets", e))?;

        Ok(RecordSetPage {
            record_sets: output
                .resource_record_sets()
                .iter()
                .map(record_set_from_sdk)
                .collect(),
            truncated: output.is_truncated(),
        })
    }

    async fn submit_change_batch(&self, zone_id: &str, changes: &[RecordChange]) -> Result<()> {
        let count = changes.len();
        let changes = changes
            .iter()
            .map(change_to_sdk)
            .collect::<Result<Vec<_>>>()?;
        let batch = ChangeBatch::builder()
            .set_changes(Some(changes))
            .build()
            .map_err(|e| provider_error("building change batch", e))?;

        self.client
            .change_resource_record_sets()
            .hosted_zone_id(zone_id)
            .change_batch(batch)
            .send()
            .await
            .map_err(|e| provider_error("ChangeResourceRecordSets", e))?;

        debug!(zone_id, changes = count, "Submitted change batch");
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_ids_lose_their_prefix() {
        assert_eq!(zone_id_from_sdk("/hostedzone/Z123ABC"), "Z123ABC");
        assert_eq!(zone_id_from_sdk("Z123ABC"), "Z123ABC");
    }

    #[test]
    fn alias_record_converts_both_ways() {
        let set = RecordSet {
            name: "example.com.".to_string(),
            record_type: RecordType::A,
            payload: RecordPayload::Alias(AliasTarget {
                dns_name: "s3-website-us-east-1.amazonaws.com.".to_string(),
                hosted_zone_id: "Z3AQBSTGFYJSTF".to_string(),
                evaluate_target_health: false,
            }),
        };

        let sdk = record_set_to_sdk(&set).unwrap();
        assert_eq!(sdk.r#type(), &RrType::A);
        assert!(sdk.ttl().is_none());
        assert_eq!(record_set_from_sdk(&sdk), set);
    }

    #[test]
    fn cname_record_keeps_ttl_and_values() {
        let set = RecordSet {
            name: "www.example.com.".to_string(),
            record_type: RecordType::Cname,
            payload: RecordPayload::Values {
                ttl: 300,
                values: vec!["www.example.com.s3-website-us-east-1.amazonaws.com.".to_string()],
            },
        };

        let sdk = record_set_to_sdk(&set).unwrap();
        assert_eq!(sdk.r#type(), &RrType::Cname);
        assert_eq!(sdk.ttl(), Some(300));
        assert_eq!(record_set_from_sdk(&sdk), set);
    }

    #[test]
    fn unknown_types_are_kept_verbatim() {
        let sdk = ResourceRecordSet::builder()
            .name("example.com.")
            .r#type(RrType::Txt)
            .ttl(60)
            .resource_records(ResourceRecord::builder().value("\"v=spf1 -all\"").build().unwrap())
            .build()
            .unwrap();

        let set = record_set_from_sdk(&sdk);
        assert_eq!(set.record_type, RecordType::Other("TXT".to_string()));
    }
}
