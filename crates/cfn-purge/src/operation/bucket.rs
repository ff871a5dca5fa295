//! S3 bucket operator: empties every version, then deletes the bucket

use super::error::PurgeError;
use super::executor::run_bounded;
use super::DeleteOperator;
use crate::aws::{ObjectVersion, S3Operations};
use anyhow::Result;
use cfn_purge_common::defaults::S3_DELETE_BATCH_SIZE;
use cfn_purge_common::{ResourceKind, StackResourceSummary};
use std::sync::Arc;
use tracing::{debug, info};

pub struct BucketOperator<S> {
    s3: Arc<S>,
    concurrency: usize,
    max_passes: u32,
    resources: Vec<StackResourceSummary>,
}

impl<S: S3Operations> BucketOperator<S> {
    pub fn new(s3: Arc<S>, concurrency: usize, max_passes: u32) -> Self {
        Self {
            s3,
            concurrency,
            max_passes,
            resources: Vec::new(),
        }
    }

    /// Empty and delete one bucket. A missing bucket counts as deleted.
    pub async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        if !self.s3.bucket_exists(bucket).await? {
            info!(bucket = %bucket, "Bucket already deleted");
            return Ok(());
        }

        self.empty_bucket(bucket).await?;
        self.s3.delete_bucket(bucket).await?;

        info!(bucket = %bucket, "Deleted bucket");
        Ok(())
    }

    /// Delete versions and delete markers until a listing comes back empty
    async fn empty_bucket(&self, bucket: &str) -> Result<()> {
        let mut remaining = 0;

        for pass in 1..=self.max_passes {
            let versions = self.list_versions(bucket).await?;
            if versions.is_empty() {
                return Ok(());
            }
            remaining = versions.len();
            debug!(bucket = %bucket, pass, remaining, "Emptying bucket");

            let mut failed = Vec::new();
            for batch in versions.chunks(S3_DELETE_BATCH_SIZE) {
                failed.extend(self.s3.delete_objects(bucket, batch.to_vec()).await?);
            }

            if !failed.is_empty() {
                return Err(PurgeError::ObjectDeletion(failed).into());
            }
        }

        Err(PurgeError::BucketNotEmptied {
            bucket: bucket.to_string(),
            passes: self.max_passes,
            remaining,
        }
        .into())
    }

    /// Every version and delete marker currently in the bucket
    async fn list_versions(&self, bucket: &str) -> Result<Vec<ObjectVersion>> {
        let mut versions = Vec::new();
        let mut key_marker = None;
        let mut version_id_marker = None;

        loop {
            let page = self
                .s3
                .list_object_versions(bucket, key_marker, version_id_marker)
                .await?;
            let has_more = page.has_more();
            versions.extend(page.versions);

            if !has_more {
                return Ok(versions);
            }
            key_marker = page.next_key_marker;
            version_id_marker = page.next_version_id_marker;
        }
    }
}

impl<S: S3Operations> DeleteOperator for BucketOperator<S> {
    fn kind(&self) -> ResourceKind {
        ResourceKind::S3Bucket
    }

    fn add_resource(&mut self, resource: StackResourceSummary) {
        self.resources.push(resource);
    }

    fn resources(&self) -> &[StackResourceSummary] {
        &self.resources
    }

    async fn delete_resources(&self) -> Result<()> {
        run_bounded(
            self.concurrency,
            self.resources
                .iter()
                .map(|r| move || self.delete_bucket(&r.physical_resource_id)),
        )
        .await
    }
}
