//! AWS Backup vault and recovery point management

use crate::aws::context::{AwsContext, FromAwsContext};
use crate::aws::error::AwsError;
use anyhow::{Context, Result};
use aws_sdk_backup::Client;
use tracing::debug;

/// One page of recovery points held by a vault
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryPointPage {
    /// Recovery point ARNs on this page
    pub recovery_point_arns: Vec<String>,
    pub next_token: Option<String>,
}

/// Backup client for emptying and deleting vaults
pub struct BackupClient {
    client: Client,
}

impl FromAwsContext for BackupClient {
    fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.backup_client(),
        }
    }
}

impl BackupClient {
    /// Check whether a backup vault exists
    pub async fn backup_vault_exists(&self, vault: &str) -> Result<bool> {
        match self
            .client
            .describe_backup_vault()
            .backup_vault_name(vault)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                let err = AwsError::from_sdk(&e);
                if err.is_not_found() {
                    debug!(vault = %vault, "Backup vault does not exist");
                    Ok(false)
                } else {
                    Err(err).context("Failed to describe backup vault")
                }
            }
        }
    }

    /// List one page of recovery points in a vault
    pub async fn list_recovery_points(
        &self,
        vault: &str,
        next_token: Option<String>,
    ) -> Result<RecoveryPointPage> {
        let response = self
            .client
            .list_recovery_points_by_backup_vault()
            .backup_vault_name(vault)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk(&e))
            .context("Failed to list recovery points")?;

        Ok(RecoveryPointPage {
            recovery_point_arns: response
                .recovery_points()
                .iter()
                .filter_map(|p| p.recovery_point_arn().map(str::to_string))
                .collect(),
            next_token: response.next_token().map(str::to_string),
        })
    }

    /// Delete one recovery point
    pub async fn delete_recovery_point(&self, vault: &str, recovery_point_arn: &str) -> Result<()> {
        self.client
            .delete_recovery_point()
            .backup_vault_name(vault)
            .recovery_point_arn(recovery_point_arn)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk(&e))
            .context("Failed to delete recovery point")?;

        Ok(())
    }

    /// Delete an empty backup vault
    pub async fn delete_backup_vault(&self, vault: &str) -> Result<()> {
        self.client
            .delete_backup_vault()
            .backup_vault_name(vault)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk(&e))
            .context("Failed to delete backup vault")?;

        Ok(())
    }
}

/// Trait for AWS Backup operations, mockable in tests.
#[allow(async_fn_in_trait)] // Futures are awaited in place, never spawned
#[cfg_attr(test, mockall::automock)]
pub trait BackupOperations: Send + Sync {
    /// Check whether a backup vault exists
    async fn backup_vault_exists(&self, vault: &str) -> Result<bool>;

    /// List one page of recovery points in a vault
    async fn list_recovery_points(
        &self,
        vault: &str,
        next_token: Option<String>,
    ) -> Result<RecoveryPointPage>;

    /// Delete one recovery point
    async fn delete_recovery_point(&self, vault: &str, recovery_point_arn: &str) -> Result<()>;

    /// Delete an empty backup vault
    async fn delete_backup_vault(&self, vault: &str) -> Result<()>;
}

impl BackupOperations for BackupClient {
    async fn backup_vault_exists(&self, vault: &str) -> Result<bool> {
        BackupClient::backup_vault_exists(self, vault).await
    }

    async fn list_recovery_points(
        &self,
        vault: &str,
        next_token: Option<String>,
    ) -> Result<RecoveryPointPage> {
        BackupClient::list_recovery_points(self, vault, next_token).await
    }

    async fn delete_recovery_point(&self, vault: &str, recovery_point_arn: &str) -> Result<()> {
        BackupClient::delete_recovery_point(self, vault, recovery_point_arn).await
    }

    async fn delete_backup_vault(&self, vault: &str) -> Result<()> {
        BackupClient::delete_backup_vault(self, vault).await
    }
}
