//! S3 implementation of [`StorageClient`]

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CreateBucketConfiguration, ErrorDocument, IndexDocument,
    ObjectCannedAcl, RedirectAllRequestsTo, StorageClass as SdkStorageClass, WebsiteConfiguration,
};
use sitehost_core::traits::{
    BucketCreation, BucketWebsiteState, ObjectAcl, ObjectPresence, ObjectUpload, StorageClass,
    StorageClient, WebsiteConfig,
};
use sitehost_core::{Error, Result};
use tracing::{debug, warn};

const PROVIDER: &str = "s3";

/// Error code returned when a bucket has no website configuration
const NO_SUCH_WEBSITE_CONFIGURATION: &str = "NoSuchWebsiteConfiguration";

/// Status S3 uses for "redirect all requests"
const S3_REDIRECT_STATUS: u16 = 301;

/// S3 storage client
///
/// The client's region decides where buckets are created; load the SDK
/// configuration for the hosting region.
#[derive(Debug, Clone)]
pub struct S3Storage {
    client: Client,
}

impl S3Storage {
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

/// Bucket configuration for a location hint; `None` means the default location
pub(crate) fn bucket_configuration(
    location_hint: Option<&str>,
) -> Option<CreateBucketConfiguration> {
    location_hint.map(|hint| {
        CreateBucketConfiguration::builder()
            .location_constraint(BucketLocationConstraint::from(hint))
            .build()
    })
}

/// Interpret the parts of a website configuration response
pub(crate) fn website_state_from_parts(
    index: Option<&IndexDocument>,
    error: Option<&ErrorDocument>,
    redirect: Option<&RedirectAllRequestsTo>,
) -> BucketWebsiteState {
    if let Some(redirect) = redirect {
        return BucketWebsiteState::Redirect {
            host: redirect.host_name().to_string(),
            status_code: S3_REDIRECT_STATUS,
        };
    }

    match index {
        Some(index) => BucketWebsiteState::Website {
            index_document: index.suffix().to_string(),
            error_document: error.map(|e| e.key().to_string()).unwrap_or_default(),
        },
        // Routing rules alone; nothing we recognize
        None => BucketWebsiteState::Unconfigured,
    }
}

/// Build the SDK website configuration
///
/// S3 redirects all requests with a fixed 301, so `status_code` is not sent.
pub(crate) fn website_configuration(config: &WebsiteConfig) -> Result<WebsiteConfiguration> {
    let configuration = match config {
        WebsiteConfig::Website {
            index_document,
            error_document,
        } => WebsiteConfiguration::builder()
            .index_document(
                IndexDocument::builder()
                    .suffix(index_document)
                    .build()
                    .map_err(|e| provider_error("building index document", e))?,
            )
            .error_document(
                ErrorDocument::builder()
                    .key(error_document)
                    .build()
                    .map_err(|e| provider_error("building error document", e))?,
            )
            .build(),
        WebsiteConfig::Redirect { host, status_code } => {
            if *status_code != S3_REDIRECT_STATUS {
                warn!(status_code, "S3 always redirects with 301; ignoring requested status");
            }
            WebsiteConfiguration::builder()
                .redirect_all_requests_to(
                    RedirectAllRequestsTo::builder()
                        .host_name(host)
                        .build()
                        .map_err(|e| provider_error("building redirect", e))?,
                )
                .build()
        }
    };
    Ok(configuration)
}

/// What `HeadBucket` reported before a create
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HeadBucketOutcome {
    /// The bucket exists and the caller can reach it
    Exists,
    /// No such bucket
    NotFound,
    /// Any other answer, e.g. 403 for a bucket owned by someone else
    Unknown,
}

/// The creation outcome settled without calling `CreateBucket`
///
/// In us-east-1, `CreateBucket` answers 200 for a bucket the caller already
/// owns, so only `HeadBucket` can tell a rerun from a fresh create.
pub(crate) fn creation_from_head(outcome: HeadBucketOutcome) -> Option<BucketCreation> {
    match outcome {
        HeadBucketOutcome::Exists => Some(BucketCreation::AlreadyOwned),
        HeadBucketOutcome::NotFound | HeadBucketOutcome::Unknown => None,
    }
}

pub(crate) fn canned_acl(acl: ObjectAcl) -> ObjectCannedAcl {
    match acl {
        ObjectAcl::PublicRead => ObjectCannedAcl::PublicRead,
    }
}

pub(crate) fn storage_class(class: StorageClass) -> SdkStorageClass {
    match class {
        StorageClass::ReducedRedundancy => SdkStorageClass::ReducedRedundancy,
    }
}

#[async_trait]
impl StorageClient for S3Storage {
    async fn create_bucket(
        &self,
        name: &str,
        location_hint: Option<&str>,
    ) -> Result<BucketCreation> {
        let head = match self.client.head_bucket().bucket(name).send().await {
            Ok(_) => HeadBucketOutcome::Exists,
            Err(err) if err.as_service_error().is_some_and(|e| e.is_not_found()) => {
                HeadBucketOutcome::NotFound
            }
            Err(err) => {
                debug!(
                    bucket = name,
                    error = %DisplayErrorContext(err),
                    "HeadBucket inconclusive"
                );
                HeadBucketOutcome::Unknown
            }
        };
        if let Some(creation) = creation_from_head(head) {
            debug!(bucket = name, "Bucket already exists");
            return Ok(creation);
        }

        let result = self
            .client
            .create_bucket()
            .bucket(name)
            .set_create_bucket_configuration(bucket_configuration(location_hint))
            .send()
            .await;

        match result {
            Ok(_) => Ok(BucketCreation::Created),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_bucket_already_owned_by_you()) =>
            {
                debug!(bucket = name, "Bucket already owned by caller");
                Ok(BucketCreation::AlreadyOwned)
            }
            Err(err) => Err(provider_error("CreateBucket", err)),
        }
    }

    async fn website_state(&self, bucket: &str) -> Result<BucketWebsiteState> {
        match self.client.get_bucket_website().bucket(bucket).send().await {
            Ok(output) => Ok(website_state_from_parts(
                output.index_document(),
                output.error_document(),
                output.redirect_all_requests_to(),
            )),
            Err(err)
                if err.as_service_error().and_then(|e| e.code())
                    == Some(NO_SUCH_WEBSITE_CONFIGURATION) =>
            {
                Ok(BucketWebsiteState::Unconfigured)
            }
            Err(err) => Err(provider_error("GetBucketWebsite", err)),
        }
    }

    async fn set_website_config(&self, bucket: &str, config: &WebsiteConfig) -> Result<()> {
        self.client
            .put_bucket_website()
            .bucket(bucket)
            .website_configuration(website_configuration(config)?)
            .send()
            .await
            .map_err(|e| provider_error("PutBucketWebsite", e))?;
        Ok(())
    }

    async fn object_presence(&self, bucket: &str, key: &str) -> ObjectPresence {
        match self.client.head_object().bucket(bucket).key(key).send().await {
            Ok(_) => ObjectPresence::Found,
            Err(err) if err.as_service_error().is_some_and(|e| e.is_not_found()) => {
                ObjectPresence::NotFound
            }
            Err(err) => ObjectPresence::Failed(DisplayErrorContext(err).to_string()),
        }
    }

    async fn put_object(&self, upload: &ObjectUpload) -> Result<()> {
        self.client
            .put_object()
            .bucket(&upload.bucket)
            .key(&upload.key)
            .body(ByteStream::from(upload.body.clone()))
            .content_type(&upload.content_type)
            .acl(canned_acl(upload.acl))
            .storage_class(storage_class(upload.storage_class))
            .send()
            .await
            .map_err(|e| provider_error("PutObject", e))?;
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
    fn default_location_sends_no_constraint() {
        assert!(bucket_configuration(None).is_none());

        let config = bucket_configuration(Some("us-west-2")).unwrap();
        assert_eq!(
            config.location_constraint(),
            Some(&BucketLocationConstraint::UsWest2)
        );
    }

    #[test]
    fn redirect_wins_over_documents() {
        let redirect = RedirectAllRequestsTo::builder()
            .host_name("example.com")
            .build()
            .unwrap();
        let index = IndexDocument::builder().suffix("index.html").build().unwrap();

        assert_eq!(
            website_state_from_parts(Some(&index), None, Some(&redirect)),
            BucketWebsiteState::Redirect {
                host: "example.com".to_string(),
                status_code: 301,
            }
        );
    }

    #[test]
    fn index_document_means_website() {
        let index = IndexDocument::builder().suffix("index.html").build().unwrap();
        let error = ErrorDocument::builder().key("error.html").build().unwrap();

        assert_eq!(
            website_state_from_parts(Some(&index), Some(&error), None),
            BucketWebsiteState::Website {
                index_document: "index.html".to_string(),
                error_document: "error.html".to_string(),
            }
        );
        assert_eq!(
            website_state_from_parts(None, None, None),
            BucketWebsiteState::Unconfigured
        );
    }

    #[test]
    fn website_config_maps_to_sdk() {
        let sdk = website_configuration(&WebsiteConfig::Website {
            index_document: "index.html".to_string(),
            error_document: "error.html".to_string(),
        })
        .unwrap();
        assert_eq!(sdk.index_document().map(|d| d.suffix()), Some("index.html"));
        assert_eq!(sdk.error_document().map(|d| d.key()), Some("error.html"));
        assert!(sdk.redirect_all_requests_to().is_none());

        let sdk = website_configuration(&WebsiteConfig::Redirect {
            host: "example.com".to_string(),
            status_code: 301,
        })
        .unwrap();
        assert_eq!(
            sdk.redirect_all_requests_to().map(|r| r.host_name()),
            Some("example.com")
        );
    }

    #[test]
    fn existing_bucket_skips_create() {
        assert_eq!(
            creation_from_head(HeadBucketOutcome::Exists),
            Some(BucketCreation::AlreadyOwned)
        );
        assert_eq!(creation_from_head(HeadBucketOutcome::NotFound), None);
        // A bucket we cannot see goes through CreateBucket, which reports
        // whether someone else owns it
        assert_eq!(creation_from_head(HeadBucketOutcome::Unknown), None);
    }

    #[test]
    fn upload_options_map_to_sdk() {
        assert_eq!(canned_acl(ObjectAcl::PublicRead), ObjectCannedAcl::PublicRead);
        assert_eq!(
            storage_class(StorageClass::ReducedRedundancy),
            SdkStorageClass::ReducedRedundancy
        );
    }
}
