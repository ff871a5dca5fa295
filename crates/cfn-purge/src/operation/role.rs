//! IAM role operator: detaches managed policies, then deletes the role

use super::executor::run_bounded;
use super::DeleteOperator;
use crate::aws::IamOperations;
use crate::aws::error::{is_not_found, should_retry};
use anyhow::Result;
use backon::{ConstantBuilder, Retryable};
use cfn_purge_common::{ResourceKind, StackResourceSummary};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct RoleOperator<I> {
    iam: Arc<I>,
    concurrency: usize,
    retry_delay: Duration,
    retry_attempts: usize,
    resources: Vec<StackResourceSummary>,
}

impl<I: IamOperations> RoleOperator<I> {
    pub fn new(
        iam: Arc<I>,
        concurrency: usize,
        retry_delay: Duration,
        retry_attempts: usize,
    ) -> Self {
        Self {
            iam,
            concurrency,
            retry_delay,
            retry_attempts,
            resources: Vec::new(),
        }
    }

    fn backoff(&self) -> ConstantBuilder {
        ConstantBuilder::default()
            .with_delay(self.retry_delay)
            .with_max_times(self.retry_attempts)
    }

    /// Detach every managed policy and delete the role.
    ///
    /// A role or policy that disappears along the way counts as done.
    /// Conflicts from IAM eventual consistency are retried.
    pub async fn delete_role(&self, role_name: &str) -> Result<()> {
        if !self.iam.role_exists(role_name).await? {
            info!(role = %role_name, "Role already deleted");
            return Ok(());
        }

        let policies = self.list_policies(role_name).await?;

        // Detach one at a time; IAM rejects concurrent changes to one role
        for policy_arn in &policies {
            let detached = (|| async { self.iam.detach_role_policy(role_name, policy_arn).await })
                .retry(self.backoff())
                .when(should_retry)
                .notify(|e, delay| {
                    warn!(
                        role = %role_name,
                        policy = %policy_arn,
                        delay = ?delay,
                        error = %e,
                        "Detaching policy failed, retrying..."
                    );
                })
                .await;

            match detached {
                Ok(()) => debug!(role = %role_name, policy = %policy_arn, "Detached policy"),
                Err(e) if is_not_found(&e) => {
                    debug!(role = %role_name, policy = %policy_arn, "Policy already detached");
                }
                Err(e) => return Err(e),
            }
        }

        let deleted = (|| async { self.iam.delete_role(role_name).await })
            .retry(self.backoff())
            .when(should_retry)
            .notify(|e, delay| {
                warn!(
                    role = %role_name,
                    delay = ?delay,
                    error = %e,
                    "Deleting role failed, retrying..."
                );
            })
            .await;

        match deleted {
            Ok(()) => info!(role = %role_name, detached = policies.len(), "Deleted role"),
            Err(e) if is_not_found(&e) => debug!(role = %role_name, "Role already deleted"),
            Err(e) => return Err(e),
        }
        Ok(())
    }

    async fn list_policies(&self, role_name: &str) -> Result<Vec<String>> {
        let mut policies = Vec::new();
        let mut marker = None;

        loop {
            let page = self.iam.list_attached_role_policies(role_name, marker).await?;
            policies.extend(page.policy_arns);

            match page.marker {
                Some(next) => marker = Some(next),
                None => return Ok(policies),
            }
        }
    }
}

impl<I: IamOperations> DeleteOperator for RoleOperator<I> {
    fn kind(&self) -> ResourceKind {
        ResourceKind::IamRole
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
                .map(|r| move || self.delete_role(&r.physical_resource_id)),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::AttachedPolicyPage;
    use anyhow::Context;
    use crate::aws::error::{AwsError, classify_aws_error};
    use crate::aws::iam::MockIamOperations;
    use cfn_purge_test_utils::delete_failed;
    use mockall::Sequence;

    fn operator(iam: MockIamOperations) -> RoleOperator<MockIamOperations> {
        RoleOperator::new(Arc::new(iam), 2, Duration::ZERO, 2)
    }

    fn no_such_entity(message: &str) -> anyhow::Error {
        anyhow::Error::new(AwsError::NotFound {
            code: "NoSuchEntity".to_string(),
            message: message.to_string(),
        })
    }

    fn one_policy() -> AttachedPolicyPage {
        AttachedPolicyPage {
            policy_arns: vec!["arn:aws:iam::aws:policy/A".to_string()],
            marker: None,
        }
    }

    #[tokio::test]
    async fn test_no_resources_makes_no_calls() {
        operator(MockIamOperations::new())
            .delete_resources()
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_missing_role_succeeds() {
        let mut iam = MockIamOperations::new();
        iam.expect_role_exists().times(1).returning(|_| Ok(false));
        iam.expect_list_attached_role_policies().never();
        iam.expect_delete_role().never();

        operator(iam).delete_role("gone").await.unwrap();
    }

    #[tokio::test]
    async fn test_detaches_every_policy_before_delete() {
        let mut seq = Sequence::new();
        let mut iam = MockIamOperations::new();
        iam.expect_role_exists().returning(|_| Ok(true));
        iam.expect_list_attached_role_policies()
            .withf(|_, marker| marker.is_none())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| {
                Ok(AttachedPolicyPage {
                    policy_arns: vec!["arn:aws:iam::aws:policy/A".to_string()],
                    marker: Some("page-2".to_string()),
                })
            });
        iam.expect_list_attached_role_policies()
            .withf(|_, marker| marker.as_deref() == Some("page-2"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| {
                Ok(AttachedPolicyPage {
                    policy_arns: vec!["arn:aws:iam::aws:policy/B".to_string()],
                    marker: None,
                })
            });
        for arn in ["arn:aws:iam::aws:policy/A", "arn:aws:iam::aws:policy/B"] {
            iam.expect_detach_role_policy()
                .withf(move |role, policy| role == "app-role" && policy == arn)
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_, _| Ok(()));
        }
        iam.expect_delete_role()
            .withf(|role| role == "app-role")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        operator(iam).delete_role("app-role").await.unwrap();
    }

    #[tokio::test]
    async fn test_list_error_propagates_unchanged() {
        let mut iam = MockIamOperations::new();
        iam.expect_role_exists().returning(|_| Ok(true));
        iam.expect_list_attached_role_policies()
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("ListAttachedRolePoliciesError")));
        iam.expect_detach_role_policy().never();
        iam.expect_delete_role().never();

        let err = operator(iam).delete_role("r").await.unwrap_err();

        assert_eq!(err.to_string(), "ListAttachedRolePoliciesError");
    }

    #[tokio::test]
    async fn test_detach_retried_until_success() {
        let mut seq = Sequence::new();
        let mut iam = MockIamOperations::new();
        iam.expect_role_exists().returning(|_| Ok(true));
        iam.expect_list_attached_role_policies()
            .returning(|_, _| Ok(one_policy()));
        iam.expect_detach_role_policy()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| {
                Err(anyhow::Error::new(classify_aws_error(
                    Some("DeleteConflict"),
                    Some("role is being modified"),
                )))
            });
        iam.expect_detach_role_policy()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        iam.expect_delete_role()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        operator(iam).delete_role("r").await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_error_after_retries() {
        let mut iam = MockIamOperations::new();
        iam.expect_role_exists().returning(|_| Ok(true));
        iam.expect_list_attached_role_policies()
            .returning(|_, _| Ok(AttachedPolicyPage::default()));
        // One attempt plus two retries
        iam.expect_delete_role()
            .times(3)
            .returning(|_| Err(anyhow::anyhow!("DeleteRoleError")));

        let err = operator(iam).delete_role("r").await.unwrap_err();

        assert_eq!(err.to_string(), "DeleteRoleError");
    }

    #[tokio::test]
    async fn test_policy_detached_elsewhere_is_not_an_error() {
        let mut iam = MockIamOperations::new();
        iam.expect_role_exists().returning(|_| Ok(true));
        iam.expect_list_attached_role_policies()
            .returning(|_, _| Ok(one_policy()));
        // Not retried: the policy is already gone
        iam.expect_detach_role_policy().times(1).returning(|_, _| {
            Err(no_such_entity("policy not attached")).context("Failed to detach role policy")
        });
        iam.expect_delete_role().times(1).returning(|_| Ok(()));

        operator(iam).delete_role("r").await.unwrap();
    }

    #[tokio::test]
    async fn test_role_removed_after_existence_check() {
        let mut iam = MockIamOperations::new();
        iam.expect_role_exists().returning(|_| Ok(true));
        iam.expect_list_attached_role_policies()
            .returning(|_, _| Ok(AttachedPolicyPage::default()));
        iam.expect_delete_role()
            .times(1)
            .returning(|_| Err(no_such_entity("role gone")));

        operator(iam).delete_role("r").await.unwrap();
    }

    #[tokio::test]
    async fn test_final_error_not_retried() {
        let mut iam = MockIamOperations::new();
        iam.expect_role_exists().returning(|_| Ok(true));
        iam.expect_list_attached_role_policies()
            .returning(|_, _| Ok(one_policy()));
        iam.expect_detach_role_policy().times(1).returning(|_, _| {
            Err(anyhow::Error::new(classify_aws_error(
                Some("AccessDenied"),
                Some("not authorized"),
            )))
        });
        iam.expect_delete_role().never();

        let err = operator(iam).delete_role("r").await.unwrap_err();

        assert_eq!(err.to_string(), "AccessDenied: not authorized");
    }

    #[tokio::test]
    async fn test_delete_resources_covers_each_role() {
        let mut iam = MockIamOperations::new();
        iam.expect_role_exists().times(3).returning(|_| Ok(false));

        let mut op = operator(iam);
        for id in ["A", "B", "C"] {
            op.add_resource(delete_failed(id, "AWS::IAM::Role"));
        }

        op.delete_resources().await.unwrap();
    }
}
