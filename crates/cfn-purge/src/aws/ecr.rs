//! ECR repository management

use crate::aws::context::{AwsContext, FromAwsContext};
use crate::aws::error::AwsError;
use anyhow::{Context, Result};
use aws_sdk_ecr::Client;
use tracing::debug;

/// ECR client for deleting repositories together with their images
pub struct EcrClient {
    client: Client,
}

impl FromAwsContext for EcrClient {
    fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.ecr_client(),
        }
    }
}

impl EcrClient {
    /// Check whether a repository exists
    pub async fn repository_exists(&self, repository: &str) -> Result<bool> {
        match self
            .client
            .describe_repositories()
            .repository_names(repository)
            .send()
            .await
        {
            Ok(response) => Ok(!response.repositories().is_empty()),
            Err(e) => {
                let err = AwsError::from_sdk(&e);
                if err.is_not_found() {
                    debug!(repository = %repository, "Repository does not exist");
                    Ok(false)
                } else {
                    Err(err).context("Failed to describe ECR repository")
                }
            }
        }
    }

    /// Delete a repository, removing any images it still holds
    pub async fn delete_repository(&self, repository: &str) -> Result<()> {
        self.client
            .delete_repository()
            .repository_name(repository)
            .force(true)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk(&e))
            .context("Failed to delete ECR repository")?;

        Ok(())
    }
}

/// Trait for ECR operations, mockable in tests.
#[allow(async_fn_in_trait)] // Futures are awaited in place, never spawned
#[cfg_attr(test, mockall::automock)]
pub trait EcrOperations: Send + Sync {
    /// Check whether a repository exists
    async fn repository_exists(&self, repository: &str) -> Result<bool>;

    /// Delete a repository, removing any images it still holds
    async fn delete_repository(&self, repository: &str) -> Result<()>;
}

impl EcrOperations for EcrClient {
    async fn repository_exists(&self, repository: &str) -> Result<bool> {
        EcrClient::repository_exists(self, repository).await
    }

    async fn delete_repository(&self, repository: &str) -> Result<()> {
        EcrClient::delete_repository(self, repository).await
    }
}
