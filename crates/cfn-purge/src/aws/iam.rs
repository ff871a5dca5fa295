//! IAM role and managed policy attachment management

use crate::aws::context::{AwsContext, FromAwsContext};
use crate::aws::error::AwsError;
use anyhow::{Context, Result};
use aws_sdk_iam::Client;
use tracing::debug;

/// One page of managed policies attached to a role
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachedPolicyPage {
    /// Policy ARNs on this page
    pub policy_arns: Vec<String>,
    /// Marker for the next page, absent on the last page
    pub marker: Option<String>,
}

/// IAM client for detaching policies and deleting roles
pub struct IamClient {
    client: Client,
}

impl FromAwsContext for IamClient {
    fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.iam_client(),
        }
    }
}

impl IamClient {
    /// Check whether a role exists
    pub async fn role_exists(&self, role_name: &str) -> Result<bool> {
        match self.client.get_role().role_name(role_name).send().await {
            Ok(_) => Ok(true),
            Err(e) => {
                let err = AwsError::from_sdk(&e);
                if err.is_not_found() {
                    debug!(role_name = %role_name, "Role does not exist");
                    Ok(false)
                } else {
                    Err(err).context("Failed to get IAM role")
                }
            }
        }
    }

    /// List one page of managed policies attached to a role
    pub async fn list_attached_role_policies(
        &self,
        role_name: &str,
        marker: Option<String>,
    ) -> Result<AttachedPolicyPage> {
        let response = self
            .client
            .list_attached_role_policies()
            .role_name(role_name)
            .set_marker(marker)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk(&e))
            .context("Failed to list attached role policies")?;

        let policy_arns = response
            .attached_policies()
            .iter()
            .filter_map(|p| p.policy_arn().map(str::to_string))
            .collect();

        Ok(AttachedPolicyPage {
            policy_arns,
            // IAM only returns a marker when the listing is truncated
            marker: response.marker().map(str::to_string),
        })
    }

    /// Detach a managed policy from a role
    pub async fn detach_role_policy(&self, role_name: &str, policy_arn: &str) -> Result<()> {
        self.client
            .detach_role_policy()
            .role_name(role_name)
            .policy_arn(policy_arn)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk(&e))
            .context("Failed to detach role policy")?;

        Ok(())
    }

    /// Delete a role
    pub async fn delete_role(&self, role_name: &str) -> Result<()> {
        self.client
            .delete_role()
            .role_name(role_name)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk(&e))
            .context("Failed to delete IAM role")?;

        Ok(())
    }
}

/// Trait for IAM operations, mockable in tests.
#[allow(async_fn_in_trait)] // Futures are awaited in place, never spawned
#[cfg_attr(test, mockall::automock)]
pub trait IamOperations: Send + Sync {
    /// Check whether a role exists
    async fn role_exists(&self, role_name: &str) -> Result<bool>;

    /// List one page of managed policies attached to a role
    async fn list_attached_role_policies(
        &self,
        role_name: &str,
        marker: Option<String>,
    ) -> Result<AttachedPolicyPage>;

    /// Detach a managed policy from a role
    async fn detach_role_policy(&self, role_name: &str, policy_arn: &str) -> Result<()>;

    /// Delete a role
    async fn delete_role(&self, role_name: &str) -> Result<()>;
}

impl IamOperations for IamClient {
    async fn role_exists(&self, role_name: &str) -> Result<bool> {
        IamClient::role_exists(self, role_name).await
    }

    async fn list_attached_role_policies(
        &self,
        role_name: &str,
        marker: Option<String>,
    ) -> Result<AttachedPolicyPage> {
        IamClient::list_attached_role_policies(self, role_name, marker).await
    }

    async fn detach_role_policy(&self, role_name: &str, policy_arn: &str) -> Result<()> {
        IamClient::detach_role_policy(self, role_name, policy_arn).await
    }

    async fn delete_role(&self, role_name: &str) -> Result<()> {
        IamClient::delete_role(self, role_name).await
    }
}
