//! S3 bucket and object version management

use crate::aws::context::{AwsContext, FromAwsContext};
use crate::aws::error::AwsError;
use anyhow::{Context, Result};
use aws_sdk_s3::Client;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use tracing::debug;

/// One object version or delete marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectVersion {
    pub key: String,
    pub version_id: Option<String>,
}

/// One page of a version listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectVersionPage {
    /// Versions and delete markers on this page
    pub versions: Vec<ObjectVersion>,
    pub next_key_marker: Option<String>,
    pub next_version_id_marker: Option<String>,
}

impl ObjectVersionPage {
    /// Whether another page follows this one
    pub fn has_more(&self) -> bool {
        self.next_key_marker.is_some() || self.next_version_id_marker.is_some()
    }
}

/// A per-object failure reported by DeleteObjects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectDeletionError {
    pub code: String,
    pub key: String,
    pub version_id: String,
    pub message: String,
}

/// S3 client for emptying and deleting buckets
pub struct S3Client {
    client: Client,
}

impl FromAwsContext for S3Client {
    fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.s3_client(),
        }
    }
}

impl S3Client {
    /// Check whether a bucket exists
    pub async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(e) => {
                let err = AwsError::from_sdk(&e);
                if err.is_not_found() {
                    debug!(bucket = %bucket, "Bucket does not exist");
                    Ok(false)
                } else {
                    Err(err).context("Failed to check bucket existence")
                }
            }
        }
    }

    /// List one page of object versions and delete markers
    pub async fn list_object_versions(
        &self,
        bucket: &str,
        key_marker: Option<String>,
        version_id_marker: Option<String>,
    ) -> Result<ObjectVersionPage> {
        let response = self
            .client
            .list_object_versions()
            .bucket(bucket)
            .set_key_marker(key_marker)
            .set_version_id_marker(version_id_marker)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk(&e))
            .context("Failed to list object versions")?;

        let versions = response
            .versions()
            .iter()
            .filter_map(|v| {
                v.key().map(|key| ObjectVersion {
                    key: key.to_string(),
                    version_id: v.version_id().map(str::to_string),
                })
            })
            .chain(response.delete_markers().iter().filter_map(|m| {
                m.key().map(|key| ObjectVersion {
                    key: key.to_string(),
                    version_id: m.version_id().map(str::to_string),
                })
            }))
            .collect();

        let truncated = response.is_truncated() == Some(true);
        Ok(ObjectVersionPage {
            versions,
            next_key_marker: truncated
                .then(|| response.next_key_marker().map(str::to_string))
                .flatten(),
            next_version_id_marker: truncated
                .then(|| response.next_version_id_marker().map(str::to_string))
                .flatten(),
        })
    }

    /// Delete up to 1000 object versions in one request.
    ///
    /// Returns the per-object failures; an empty vec means every object
    /// was deleted.
    pub async fn delete_objects(
        &self,
        bucket: &str,
        objects: Vec<ObjectVersion>,
    ) -> Result<Vec<ObjectDeletionError>> {
        let identifiers = objects
            .into_iter()
            .map(|o| {
                ObjectIdentifier::builder()
                    .key(o.key)
                    .set_version_id(o.version_id)
                    .build()
            })
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to build object identifier")?;

        let delete = Delete::builder()
            .set_objects(Some(identifiers))
            .quiet(true)
            .build()
            .context("Failed to build delete request")?;

        let response = self
            .client
            .delete_objects()
            .bucket(bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk(&e))
            .context("Failed to delete objects")?;

        Ok(response
            .errors()
            .iter()
            .map(|e| ObjectDeletionError {
                code: e.code().unwrap_or_default().to_string(),
                key: e.key().unwrap_or_default().to_string(),
                version_id: e.version_id().unwrap_or_default().to_string(),
                message: e.message().unwrap_or_default().to_string(),
            })
            .collect())
    }

    /// Delete an empty bucket
    pub async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        self.client
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk(&e))
            .context("Failed to delete bucket")?;

        Ok(())
    }
}

/// Trait for the S3 calls the bucket operator needs, mockable in tests.
#[allow(async_fn_in_trait)] // Futures are awaited in place, never spawned
#[cfg_attr(test, mockall::automock)]
pub trait S3Operations: Send + Sync {
    /// Check whether a bucket exists
    async fn bucket_exists(&self, bucket: &str) -> Result<bool>;

    /// List one page of object versions and delete markers
    async fn list_object_versions(
        &self,
        bucket: &str,
        key_marker: Option<String>,
        version_id_marker: Option<String>,
    ) -> Result<ObjectVersionPage>;

    /// Delete a batch of object versions, returning per-object failures
    async fn delete_objects(
        &self,
        bucket: &str,
        objects: Vec<ObjectVersion>,
    ) -> Result<Vec<ObjectDeletionError>>;

    /// Delete an empty bucket
    async fn delete_bucket(&self, bucket: &str) -> Result<()>;
}

impl S3Operations for S3Client {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        S3Client::bucket_exists(self, bucket).await
    }

    async fn list_object_versions(
        &self,
        bucket: &str,
        key_marker: Option<String>,
        version_id_marker: Option<String>,
    ) -> Result<ObjectVersionPage> {
        S3Client::list_object_versions(self, bucket, key_marker, version_id_marker).await
    }

    async fn delete_objects(
        &self,
        bucket: &str,
        objects: Vec<ObjectVersion>,
    ) -> Result<Vec<ObjectDeletionError>> {
        S3Client::delete_objects(self, bucket, objects).await
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        S3Client::delete_bucket(self, bucket).await
    }
}
