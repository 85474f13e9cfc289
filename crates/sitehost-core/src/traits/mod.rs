//! Core traits for sitehost
//!
//! This module defines the abstract interfaces that all provider
//! implementations must follow.
//!
//! - [`DnsClient`]: Hosted zones and record sets
//! - [`StorageClient`]: Buckets, website configuration and objects

pub mod dns_client;
pub mod storage_client;

pub use dns_client::{
    AliasTarget, ChangeAction, DnsClient, DnsZone, RecordChange, RecordPayload, RecordSet,
    RecordSetPage, RecordType, ZonePage,
};
pub use storage_client::{
    BucketCreation, BucketWebsiteState, ObjectAcl, ObjectPresence, ObjectUpload, StorageClass,
    StorageClient, WebsiteConfig,
};
