//! Website provisioning workflow
//!
//! [`WebsiteProvisioner`] converges a domain onto a static website setup:
//!
//! ```text
//!   EnsureZone ──► SetupBuckets ──► LinkApex ──► LinkWww
//!   (DnsClient)    (StorageClient)  (DnsClient)  (DnsClient)
//! ```
//!
//! Every step reads first and writes only what is missing, so running the
//! workflow again against a converged domain makes no changes.
//!
//! ## Bucket Roles
//!
//! The `www` bucket is classified first, defaulting to a redirect. If it is
//! a website, the apex is classified with a redirect default and `www`
//! becomes the primary domain. If `www` redirects, the apex is the website
//! and the primary domain. Existing configuration is never rewritten.
//!
//! ## Errors
//!
//! The first failure aborts the run and propagates unchanged. Invalid input
//! fails before any provider call. Nothing is rolled back.

pub mod assets;
pub mod report;

pub use assets::{AssetOutcome, AssetUploader, PLACEHOLDER_ASSETS, PlaceholderAsset};
pub use report::{BucketReport, ProvisionReport};

use std::fmt;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::bucket::{BucketClassifier, BucketConfigurator, ClassifiedBucket, IdealizedBucketConfig};
use crate::config::ProvisionConfig;
use crate::domain::Domain;
use crate::error::{Error, Result};
use crate::records::{RecordOutcome, RecordReconciler};
use crate::region::{HostingRegion, RegionId};
use crate::traits::{BucketCreation, BucketWebsiteState, DnsClient, RecordType, StorageClient};
use crate::zone::{CallerReferenceSource, UuidCallerReference, ZoneResolver};

/// Workflow stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Find or create the hosted zone
    EnsureZone,
    /// Create, classify and configure both buckets
    SetupBuckets,
    /// Create the apex alias record
    LinkApex,
    /// Create the `www` CNAME record
    LinkWww,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::EnsureZone => "ensure_zone",
            Stage::SetupBuckets => "setup_buckets",
            Stage::LinkApex => "link_apex",
            Stage::LinkWww => "link_www",
        };
        f.write_str(name)
    }
}

/// Events emitted by the WebsiteProvisioner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionEvent {
    /// A run started
    Started {
        domain: String,
        region: RegionId,
    },

    /// A stage started
    StageStarted {
        stage: Stage,
    },

    /// The hosted zone is known
    ZoneResolved {
        zone_id: String,
        zone_name: String,
        created: bool,
    },

    /// A bucket exists
    BucketEnsured {
        bucket: String,
        creation: BucketCreation,
    },

    /// A bucket's role was decided
    BucketClassified {
        bucket: String,
        observed: BucketWebsiteState,
        role: IdealizedBucketConfig,
    },

    /// Both buckets already serve content
    AmbiguousWebsites {
        apex: String,
        www: String,
    },

    /// A website configuration was written
    BucketConfigured {
        bucket: String,
        role: IdealizedBucketConfig,
    },

    /// A placeholder asset was uploaded
    AssetUploaded {
        bucket: String,
        key: String,
    },

    /// A placeholder existence check failed; the asset was skipped
    AssetCheckFailed {
        bucket: String,
        key: String,
        detail: String,
    },

    /// A DNS link is in place
    RecordLinked {
        name: String,
        record_type: RecordType,
        outcome: RecordOutcome,
    },

    /// The run completed
    Finished {
        changes_made: bool,
    },
}

/// Static website provisioner
///
/// Owns one DNS client and one storage client and drives them strictly in
/// sequence: each provider call is awaited before the next is issued.
///
/// ## Lifecycle
///
/// 1. Create with [`WebsiteProvisioner::new()`]
/// 2. Call [`WebsiteProvisioner::run()`] for the configured domain, or
///    [`WebsiteProvisioner::provision()`] for any other
/// 3. Drain the event receiver if interested
///
/// Events are sent with `try_send`; when the channel is full they are
/// dropped with a warning and the run continues.
pub struct WebsiteProvisioner {
    /// DNS provider for zones and records
    dns: Box<dyn DnsClient>,

    /// Storage provider for buckets and objects
    storage: Box<dyn StorageClient>,

    /// Caller references for zone creation
    references: Box<dyn CallerReferenceSource>,

    /// Domain provisioned by `run()`
    domain: Domain,

    /// Region provisioned by `run()`
    region: RegionId,

    /// Upload placeholder assets to website buckets
    upload_placeholders: bool,

    /// Fail when both buckets serve content
    strict_exclusivity: bool,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<ProvisionEvent>,
}

impl WebsiteProvisioner {
    /// Create a new provisioner
    ///
    /// The configuration is validated before anything else; an invalid
    /// domain is rejected here, without touching either provider.
    ///
    /// # Returns
    ///
    /// A tuple of (provisioner, event_receiver)
    pub fn new(
        dns: Box<dyn DnsClient>,
        storage: Box<dyn StorageClient>,
        config: ProvisionConfig,
    ) -> Result<(Self, mpsc::Receiver<ProvisionEvent>)> {
        let domain = config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let provisioner = Self {
            dns,
            storage,
            references: Box::new(UuidCallerReference),
            domain,
            region: config.region,
            upload_placeholders: config.upload_placeholders,
            strict_exclusivity: config.strict_exclusivity,
            event_tx: tx,
        };

        Ok((provisioner, rx))
    }

    /// Replace the caller reference source used for zone creation
    pub fn with_caller_references(mut self, references: Box<dyn CallerReferenceSource>) -> Self {
        self.references = references;
        self
    }

    /// Provision the configured domain and region
    pub async fn run(&self) -> Result<ProvisionReport> {
        let domain = self.domain.clone();
        self.provision_domain(&domain, self.region).await
    }

    /// Provision `domain` in `region`
    ///
    /// `domain` is validated first; an invalid name fails with
    /// [`Error::InvalidInput`] before any provider call.
    pub async fn provision(&self, domain: &str, region: RegionId) -> Result<ProvisionReport> {
        let domain = Domain::parse(domain)?;
        self.provision_domain(&domain, region).await
    }

    async fn provision_domain(&self, domain: &Domain, region: RegionId) -> Result<ProvisionReport> {
        let started_at = Utc::now();
        let profile = region.profile();

        info!(
            domain = %domain,
            region = %region,
            dns = self.dns.provider_name(),
            storage = self.storage.provider_name(),
            "Provisioning static website"
        );
        self.emit_event(ProvisionEvent::Started {
            domain: domain.to_string(),
            region,
        });

        self.enter_stage(Stage::EnsureZone);
        let zone = ZoneResolver::with_references(self.dns.as_ref(), self.references.as_ref())
            .ensure_zone_exists(domain)
            .await?;
        self.emit_event(ProvisionEvent::ZoneResolved {
            zone_id: zone.zone.id.clone(),
            zone_name: zone.zone.name.clone(),
            created: zone.created,
        });

        self.enter_stage(Stage::SetupBuckets);
        let buckets = self.setup_buckets(domain, profile).await?;

        let records = RecordReconciler::new(self.dns.as_ref());

        self.enter_stage(Stage::LinkApex);
        let apex_record = records
            .ensure_apex_link(domain, &zone.zone, profile)
            .await?;
        self.emit_event(ProvisionEvent::RecordLinked {
            name: domain.fqdn(),
            record_type: RecordType::A,
            outcome: apex_record,
        });

        self.enter_stage(Stage::LinkWww);
        let www_record = records
            .ensure_cname_link(&domain.www(), &zone.zone, profile)
            .await?;
        self.emit_event(ProvisionEvent::RecordLinked {
            name: domain.www_fqdn(),
            record_type: RecordType::Cname,
            outcome: www_record,
        });

        let report = ProvisionReport {
            domain: domain.to_string(),
            region,
            zone,
            primary_domain: buckets.primary_domain,
            apex: buckets.apex,
            www: buckets.www,
            apex_record,
            www_record,
            started_at,
            finished_at: Utc::now(),
        };

        let changes_made = report.changes_made();
        info!(
            domain = %domain,
            primary = %report.primary_domain,
            changes_made,
            "Provisioning complete"
        );
        self.emit_event(ProvisionEvent::Finished { changes_made });

        Ok(report)
    }

    /// Create both buckets, decide their roles and configure the unconfigured ones
    async fn setup_buckets(&self, domain: &Domain, profile: &HostingRegion) -> Result<BucketSetup> {
        let apex = domain.apex().to_string();
        let www = domain.www();
        let storage = self.storage.as_ref();

        let configurator = BucketConfigurator::new(storage);
        let apex_creation = self.ensure_bucket(&configurator, &apex, profile).await?;
        let www_creation = self.ensure_bucket(&configurator, &www, profile).await?;

        let classifier = BucketClassifier::new(storage);
        let ClassifiedBucket {
            observed: www_observed,
            role: www_role,
        } = classifier.classify(&www, IdealizedBucketConfig::Redirect).await?;
        let apex_desired = match www_role {
            IdealizedBucketConfig::Website => IdealizedBucketConfig::Redirect,
            IdealizedBucketConfig::Redirect => IdealizedBucketConfig::Website,
        };
        let ClassifiedBucket {
            observed: apex_observed,
            role: apex_classified,
        } = classifier.classify(&apex, apex_desired).await?;

        let (apex_role, primary_domain) = match www_role {
            IdealizedBucketConfig::Website => (apex_classified, www.clone()),
            IdealizedBucketConfig::Redirect => {
                // The apex serves the site even if it already redirects
                if apex_classified == IdealizedBucketConfig::Redirect {
                    warn!(
                        apex = %apex,
                        www = %www,
                        "Both buckets redirect; leaving them as they are"
                    );
                }
                (IdealizedBucketConfig::Website, apex.clone())
            }
        };

        debug!(
            apex_role = ?apex_role,
            www_role = ?www_role,
            primary = %primary_domain,
            "Resolved bucket roles"
        );
        self.emit_event(ProvisionEvent::BucketClassified {
            bucket: apex.clone(),
            observed: apex_observed.clone(),
            role: apex_role,
        });
        self.emit_event(ProvisionEvent::BucketClassified {
            bucket: www.clone(),
            observed: www_observed.clone(),
            role: www_role,
        });

        if apex_role == IdealizedBucketConfig::Website
            && www_role == IdealizedBucketConfig::Website
        {
            self.emit_event(ProvisionEvent::AmbiguousWebsites {
                apex: apex.clone(),
                www: www.clone(),
            });
            if self.strict_exclusivity {
                return Err(Error::AmbiguousWebsites { apex, www });
            }
            warn!(
                apex = %apex,
                www = %www,
                "Both buckets are configured as websites; neither is changed"
            );
        }

        let apex_configured = self
            .configure_bucket(&configurator, &apex, &apex_observed, apex_role, &primary_domain)
            .await?;
        let www_configured = self
            .configure_bucket(&configurator, &www, &www_observed, www_role, &primary_domain)
            .await?;

        let apex_assets = self.upload_assets(&apex, apex_role).await?;
        let www_assets = self.upload_assets(&www, www_role).await?;

        Ok(BucketSetup {
            primary_domain,
            apex: BucketReport {
                name: apex,
                creation: apex_creation,
                observed: apex_observed,
                role: apex_role,
                configured: apex_configured,
                assets: apex_assets,
            },
            www: BucketReport {
                name: www,
                creation: www_creation,
                observed: www_observed,
                role: www_role,
                configured: www_configured,
                assets: www_assets,
            },
        })
    }

    async fn ensure_bucket(
        &self,
        configurator: &BucketConfigurator<'_>,
        bucket: &str,
        profile: &HostingRegion,
    ) -> Result<BucketCreation> {
        let creation = configurator
            .ensure_bucket_exists(bucket, profile.location_hint)
            .await?;
        self.emit_event(ProvisionEvent::BucketEnsured {
            bucket: bucket.to_string(),
            creation,
        });
        Ok(creation)
    }

    async fn configure_bucket(
        &self,
        configurator: &BucketConfigurator<'_>,
        bucket: &str,
        observed: &BucketWebsiteState,
        role: IdealizedBucketConfig,
        primary_domain: &str,
    ) -> Result<bool> {
        let written = configurator
            .configure_if_unconfigured(bucket, observed, role, primary_domain)
            .await?;
        if written {
            self.emit_event(ProvisionEvent::BucketConfigured {
                bucket: bucket.to_string(),
                role,
            });
        }
        Ok(written)
    }

    async fn upload_assets(
        &self,
        bucket: &str,
        role: IdealizedBucketConfig,
    ) -> Result<Vec<AssetOutcome>> {
        if !self.upload_placeholders || role != IdealizedBucketConfig::Website {
            return Ok(Vec::new());
        }

        let outcomes = AssetUploader::new(self.storage.as_ref())
            .ensure_placeholders(bucket)
            .await?;

        for outcome in &outcomes {
            match outcome {
                AssetOutcome::Present { .. } => {}
                AssetOutcome::Uploaded { key } => self.emit_event(ProvisionEvent::AssetUploaded {
                    bucket: bucket.to_string(),
                    key: key.clone(),
                }),
                AssetOutcome::CheckFailed { key, detail } => {
                    self.emit_event(ProvisionEvent::AssetCheckFailed {
                        bucket: bucket.to_string(),
                        key: key.clone(),
                        detail: detail.clone(),
                    })
                }
            }
        }

        Ok(outcomes)
    }

    fn enter_stage(&self, stage: Stage) {
        debug!(stage = %stage, "Entering stage");
        self.emit_event(ProvisionEvent::StageStarted { stage });
    }

    /// Emit a provisioning event
    fn emit_event(&self, event: ProvisionEvent) {
        if self.event_tx.try_send(event).is_err() {
            // Full or closed; the run does not wait for consumers.
            warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
        }
    }
}

/// Outcome of the bucket stage
struct BucketSetup {
    primary_domain: String,
    apex: BucketReport,
    www: BucketReport,
}
