//! AWS Backup vault operator: deletes recovery points, then the vault

use super::executor::run_bounded;
use super::DeleteOperator;
use crate::aws::BackupOperations;
use anyhow::Result;
use cfn_purge_common::{ResourceKind, StackResourceSummary};
use std::sync::Arc;
use tracing::{debug, info};

pub struct BackupVaultOperator<B> {
    backup: Arc<B>,
    concurrency: usize,
    resources: Vec<StackResourceSummary>,
}

impl<B: BackupOperations> BackupVaultOperator<B> {
    pub fn new(backup: Arc<B>, concurrency: usize) -> Self {
        Self {
            backup,
            concurrency,
            resources: Vec::new(),
        }
    }

    /// Delete every recovery point in the vault, then the vault itself
    pub async fn delete_backup_vault(&self, vault: &str) -> Result<()> {
        if !self.backup.backup_vault_exists(vault).await? {
            info!(vault = %vault, "Backup vault already deleted");
            return Ok(());
        }

        let recovery_points = self.list_recovery_points(vault).await?;
        for arn in &recovery_points {
            self.backup.delete_recovery_point(vault, arn).await?;
            debug!(vault = %vault, recovery_point = %arn, "Deleted recovery point");
        }

        self.backup.delete_backup_vault(vault).await?;
        info!(vault = %vault, recovery_points = recovery_points.len(), "Deleted backup vault");
        Ok(())
    }

    async fn list_recovery_points(&self, vault: &str) -> Result<Vec<String>> {
        let mut arns = Vec::new();
        let mut next_token = None;

        loop {
            let page = self.backup.list_recovery_points(vault, next_token).await?;
            arns.extend(page.recovery_point_arns);

            match page.next_token {
                Some(token) => next_token = Some(token),
                None => return Ok(arns),
            }
        }
    }
}

impl<B: BackupOperations> DeleteOperator for BackupVaultOperator<B> {
    fn kind(&self) -> ResourceKind {
        ResourceKind::BackupVault
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
                .map(|r| move || self.delete_backup_vault(&r.physical_resource_id)),
        )
        .await
    }
}
