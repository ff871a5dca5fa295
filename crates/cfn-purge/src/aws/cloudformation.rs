//! CloudFormation stack inspection and deletion

use crate::aws::context::{AwsContext, FromAwsContext};
use crate::aws::error::AwsError;
use crate::wait::{WaitConfig, wait_for};
use anyhow::{Context, Result};
use aws_sdk_cloudformation::Client;
use cfn_purge_common::{ResourceStatus, StackResourceSummary};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Stack status after a completed deletion
pub const DELETE_COMPLETE: &str = "DELETE_COMPLETE";
/// Stack status after a failed deletion
pub const DELETE_FAILED: &str = "DELETE_FAILED";

/// The parts of a stack description cfn-purge acts on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackInfo {
    pub stack_id: String,
    pub stack_name: String,
    /// Raw status, e.g. `DELETE_FAILED`
    pub status: String,
    pub status_reason: Option<String>,
    pub termination_protection: bool,
}

impl StackInfo {
    pub fn is_delete_failed(&self) -> bool {
        self.status == DELETE_FAILED
    }

    /// Whether another operation is still running on the stack
    pub fn is_in_progress(&self) -> bool {
        self.status.ends_with("_IN_PROGRESS")
    }
}

/// One page of stack resource summaries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackResourcePage {
    pub summaries: Vec<StackResourceSummary>,
    pub next_token: Option<String>,
}

/// Terminal outcome of a stack deletion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackDeletion {
    Deleted,
    Failed { reason: String },
}

/// CloudFormation client for describing and deleting stacks
pub struct CloudFormationClient {
    client: Client,
    wait: WaitConfig,
    cancel: Option<CancellationToken>,
}

impl FromAwsContext for CloudFormationClient {
    fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.cloudformation_client(),
            wait: WaitConfig::default(),
            cancel: None,
        }
    }
}

impl CloudFormationClient {
    /// Use a custom wait configuration and cancellation token for deletion waits
    pub fn with_wait(mut self, wait: WaitConfig, cancel: Option<CancellationToken>) -> Self {
        self.wait = wait;
        self.cancel = cancel;
        self
    }

    /// Describe a stack by name or ID, returning None if it does not exist
    pub async fn describe_stack(&self, stack: &str) -> Result<Option<StackInfo>> {
        let response = match self.client.describe_stacks().stack_name(stack).send().await {
            Ok(response) => response,
            Err(e) => {
                let err = AwsError::from_sdk(&e);
                if err.is_not_found() {
                    debug!(stack = %stack, "Stack does not exist");
                    return Ok(None);
                }
                return Err(err).context("Failed to describe stack");
            }
        };

        Ok(response.stacks().first().map(|s| StackInfo {
            stack_id: s.stack_id().unwrap_or(stack).to_string(),
            stack_name: s.stack_name().unwrap_or(stack).to_string(),
            status: s
                .stack_status()
                .map(|status| status.as_str().to_string())
                .unwrap_or_default(),
            status_reason: s.stack_status_reason().map(str::to_string),
            termination_protection: s.enable_termination_protection().unwrap_or(false),
        }))
    }

    /// List one page of a stack's resources
    pub async fn list_stack_resources(
        &self,
        stack: &str,
        next_token: Option<String>,
    ) -> Result<StackResourcePage> {
        let response = self
            .client
            .list_stack_resources()
            .stack_name(stack)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk(&e))
            .context("Failed to list stack resources")?;

        let summaries = response
            .stack_resource_summaries()
            .iter()
            .map(|r| StackResourceSummary {
                logical_resource_id: r.logical_resource_id().unwrap_or_default().to_string(),
                physical_resource_id: r.physical_resource_id().unwrap_or_default().to_string(),
                resource_type: r.resource_type().unwrap_or_default().to_string(),
                resource_status: r
                    .resource_status()
                    .map(|s| ResourceStatus::from(s.as_str()))
                    .unwrap_or_else(|| ResourceStatus::Other(String::new())),
            })
            .collect();

        Ok(StackResourcePage {
            summaries,
            next_token: response.next_token().map(str::to_string),
        })
    }

    /// Request deletion of a stack
    pub async fn delete_stack(&self, stack: &str) -> Result<()> {
        self.client
            .delete_stack()
            .stack_name(stack)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk(&e))
            .context("Failed to delete stack")?;

        info!(stack = %stack, "Stack deletion requested");
        Ok(())
    }

    /// Wait until a stack is gone or its deletion failed.
    ///
    /// Pass the stack ID rather than the name: deleted stacks can only be
    /// described by ID.
    pub async fn wait_stack_deleted(&self, stack: &str) -> Result<StackDeletion> {
        wait_for(
            self.wait.clone(),
            self.cancel.as_ref(),
            || async move {
                Ok(match self.describe_stack(stack).await? {
                    None => Some(StackDeletion::Deleted),
                    Some(info) if info.status == DELETE_COMPLETE => Some(StackDeletion::Deleted),
                    Some(info) if info.is_delete_failed() => Some(StackDeletion::Failed {
                        reason: info.status_reason.unwrap_or_default(),
                    }),
                    Some(_) => None,
                })
            },
            stack,
        )
        .await
    }
}

/// Trait for CloudFormation operations, mockable in tests.
#[allow(async_fn_in_trait)] // Futures are awaited in place, never spawned
#[cfg_attr(test, mockall::automock)]
pub trait CloudFormationOperations: Send + Sync {
    /// Describe a stack, returning None if it does not exist
    async fn describe_stack(&self, stack: &str) -> Result<Option<StackInfo>>;

    /// List one page of a stack's resources
    async fn list_stack_resources(
        &self,
        stack: &str,
        next_token: Option<String>,
    ) -> Result<StackResourcePage>;

    /// Request deletion of a stack
    async fn delete_stack(&self, stack: &str) -> Result<()>;

    /// Wait until a stack is gone or its deletion failed
    async fn wait_stack_deleted(&self, stack: &str) -> Result<StackDeletion>;
}

impl CloudFormationOperations for CloudFormationClient {
    async fn describe_stack(&self, stack: &str) -> Result<Option<StackInfo>> {
        CloudFormationClient::describe_stack(self, stack).await
    }

    async fn list_stack_resources(
        &self,
        stack: &str,
        next_token: Option<String>,
    ) -> Result<StackResourcePage> {
        CloudFormationClient::list_stack_resources(self, stack, next_token).await
    }

    async fn delete_stack(&self, stack: &str) -> Result<()> {
        CloudFormationClient::delete_stack(self, stack).await
    }

    async fn wait_stack_deleted(&self, stack: &str) -> Result<StackDeletion> {
        CloudFormationClient::wait_stack_deleted(self, stack).await
    }
}
