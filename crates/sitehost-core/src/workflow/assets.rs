//! Placeholder content for website buckets
//!
//! A freshly configured website bucket has nothing to serve. The uploader
//! puts a minimal `index.html` and `error.html` in place, and only when the
//! storage provider positively reports the key as missing.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::bucket::{ERROR_DOCUMENT, INDEX_DOCUMENT};
use crate::error::Result;
use crate::traits::{ObjectAcl, ObjectPresence, ObjectUpload, StorageClass, StorageClient};

/// A placeholder object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceholderAsset {
    /// Object key
    pub key: &'static str,
    /// HTML body
    pub body: &'static str,
}

/// Placeholders uploaded to website buckets, in upload order
pub const PLACEHOLDER_ASSETS: [PlaceholderAsset; 2] = [
    PlaceholderAsset {
        key: INDEX_DOCUMENT,
        body: "<html><head></head><body>Hello World!</body></html>",
    },
    PlaceholderAsset {
        key: ERROR_DOCUMENT,
        body: "<html><head></head><body>ERROR</body></html>",
    },
];

/// What happened to one placeholder
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AssetOutcome {
    /// The object already existed
    Present {
        /// Object key
        key: String,
    },
    /// The object was missing and has been uploaded
    Uploaded {
        /// Object key
        key: String,
    },
    /// The existence check failed for another reason; nothing was uploaded
    CheckFailed {
        /// Object key
        key: String,
        /// Provider detail
        detail: String,
    },
}

impl AssetOutcome {
    /// Whether this outcome wrote an object
    pub fn is_upload(&self) -> bool {
        matches!(self, AssetOutcome::Uploaded { .. })
    }
}

/// Uploads missing placeholder assets
pub struct AssetUploader<'a> {
    storage: &'a dyn StorageClient,
}

impl<'a> AssetUploader<'a> {
    /// Create an uploader on top of a storage client
    pub fn new(storage: &'a dyn StorageClient) -> Self {
        Self { storage }
    }

    /// Ensure every placeholder exists in `bucket`
    ///
    /// Only a "no such key" answer triggers an upload. Any other failure of
    /// the existence check is reported as [`AssetOutcome::CheckFailed`] and
    /// the asset is left alone. Upload failures propagate.
    pub async fn ensure_placeholders(&self, bucket: &str) -> Result<Vec<AssetOutcome>> {
        let mut outcomes = Vec::with_capacity(PLACEHOLDER_ASSETS.len());

        for asset in PLACEHOLDER_ASSETS {
            let key = asset.key.to_string();
            let outcome = match self.storage.object_presence(bucket, asset.key).await {
                ObjectPresence::Found => {
                    debug!(bucket, key = asset.key, "Asset already present");
                    AssetOutcome::Present { key }
                }
                ObjectPresence::NotFound => {
                    self.upload(bucket, asset).await?;
                    AssetOutcome::Uploaded { key }
                }
                ObjectPresence::Failed(detail) => {
                    warn!(
                        bucket,
                        key = asset.key,
                        detail = %detail,
                        "Could not check asset, not uploading"
                    );
                    AssetOutcome::CheckFailed { key, detail }
                }
            };
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }

    async fn upload(&self, bucket: &str, asset: PlaceholderAsset) -> Result<()> {
        let upload = ObjectUpload {
            bucket: bucket.to_string(),
            key: asset.key.to_string(),
            body: asset.body.as_bytes().to_vec(),
            content_type: "text/html".to_string(),
            acl: ObjectAcl::PublicRead,
            storage_class: StorageClass::ReducedRedundancy,
        };
        self.storage.put_object(&upload).await?;
        info!(bucket, key = asset.key, bytes = upload.body.len(), "Uploaded placeholder asset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStorage;
    use crate::traits::BucketWebsiteState;

    #[tokio::test]
    async fn uploads_only_missing_assets() {
        let storage = MemoryStorage::new();
        storage.insert_bucket("example.com", BucketWebsiteState::Unconfigured);
        storage.insert_object("example.com", "index.html", b"<p>mine</p>");

        let outcomes = AssetUploader::new(&storage)
            .ensure_placeholders("example.com")
            .await
            .unwrap();

        assert_eq!(
            outcomes,
            vec![
                AssetOutcome::Present {
                    key: "index.html".to_string()
                },
                AssetOutcome::Uploaded {
                    key: "error.html".to_string()
                },
            ]
        );
        assert_eq!(
            storage.object("example.com", "index.html").unwrap(),
            b"<p>mine</p>".to_vec()
        );

        let uploads = storage.uploads();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].content_type, "text/html");
        assert_eq!(uploads[0].acl, ObjectAcl::PublicRead);
        assert_eq!(uploads[0].storage_class, StorageClass::ReducedRedundancy);
    }

    #[tokio::test]
    async fn failed_checks_do_not_upload() {
        let storage = MemoryStorage::new();
        storage.insert_bucket("example.com", BucketWebsiteState::Unconfigured);
        storage.set_fail_object_reads(true);

        let outcomes = AssetUploader::new(&storage)
            .ensure_placeholders("example.com")
            .await
            .unwrap();

        assert_eq!(outcomes.len(), PLACEHOLDER_ASSETS.len());
        for outcome in &outcomes {
            assert!(matches!(outcome, AssetOutcome::CheckFailed { .. }), "{outcome:?}");
        }
        assert!(storage.uploads().is_empty());
    }
}
