//! ECR repository operator

use super::executor::run_bounded;
use super::DeleteOperator;
use crate::aws::EcrOperations;
use anyhow::Result;
use cfn_purge_common::{ResourceKind, StackResourceSummary};
use std::sync::Arc;
use tracing::info;

pub struct EcrOperator<E> {
    ecr: Arc<E>,
    concurrency: usize,
    resources: Vec<StackResourceSummary>,
}

impl<E: EcrOperations> EcrOperator<E> {
    pub fn new(ecr: Arc<E>, concurrency: usize) -> Self {
        Self {
            ecr,
            concurrency,
            resources: Vec::new(),
        }
    }

    /// Force-delete a repository together with its images
    pub async fn delete_repository(&self, repository: &str) -> Result<()> {
        if !self.ecr.repository_exists(repository).await? {
            info!(repository = %repository, "Repository already deleted");
            return Ok(());
        }

        self.ecr.delete_repository(repository).await?;
        info!(repository = %repository, "Deleted repository");
        Ok(())
    }
}

impl<E: EcrOperations> DeleteOperator for EcrOperator<E> {
    fn kind(&self) -> ResourceKind {
        ResourceKind::EcrRepository
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
                .map(|r| move || self.delete_repository(&r.physical_resource_id)),
        )
        .await
    }
}
