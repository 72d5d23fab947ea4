use std::path::Path;

use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

use audiogen_domain::{storage_uri, DependencyProbe, DomainError, ObjectStoragePort, StoredObject};

const SERVICE: &str = "object_storage";

#[derive(Debug, Clone)]
pub struct StorageSettings {
    pub bucket: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Custom endpoint for S3-compatible stores. Switches to path-style URLs.
    pub endpoint_url: Option<String>,
}

pub struct S3ObjectStorage {
    client: Client,
    bucket: String,
}

impl S3ObjectStorage {
    pub fn new(settings: StorageSettings) -> Self {
        let credentials = Credentials::new(
            settings.access_key_id,
            settings.secret_access_key,
            None,
            None,
            "audiogen-static",
        );
        let mut builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(settings.region))
            .credentials_provider(credentials);
        if let Some(endpoint) = settings.endpoint_url.filter(|url| !url.is_empty()) {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: Client::from_conf(builder.build()),
            bucket: settings.bucket,
        }
    }
}

#[async_trait]
impl ObjectStoragePort for S3ObjectStorage {
    async fn upload(
        &self,
        file: &Path,
        key: &str,
        content_type: &str,
    ) -> Result<StoredObject, DomainError> {
        let body = ByteStream::from_path(file).await.map_err(|err| {
            DomainError::io_error(&format!("cannot read {}: {err}", file.display()))
        })?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(body)
            .send()
            .await
            .map_err(|err| {
                DomainError::external_service_error(
                    SERVICE,
                    &format!("put_object failed: {}", DisplayErrorContext(&err)),
                )
            })?;

        let uri = storage_uri(&self.bucket, key);
        tracing::info!(s3_uri = %uri, "uploaded artifact");

        Ok(StoredObject {
            bucket: self.bucket.clone(),
            key: key.to_string(),
            uri,
        })
    }
}

#[async_trait]
impl DependencyProbe for S3ObjectStorage {
    fn dependency_name(&self) -> &'static str {
        SERVICE
    }

    async fn is_available(&self) -> bool {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => true,
            Err(err) => {
                tracing::warn!(
                    bucket = %self.bucket,
                    error = %DisplayErrorContext(&err),
                    "bucket is not reachable"
                );
                false
            }
        }
    }
}
