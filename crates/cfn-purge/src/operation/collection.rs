//! Classification of DELETE_FAILED resources into operators

use super::error::{OperatorFailure, PurgeError};
use super::factory::{ClientSet, OperatorFactory};
use super::report::unsupported_resource_report;
use super::{DeleteOperator, Operator};
use cfn_purge_common::{StackResourceSummary, TargetResourceTypes};
use tracing::{info, warn};

/// Every DELETE_FAILED resource of one stack, routed to its operator.
///
/// Each failed resource lands either in exactly one operator or in the
/// unsupported list. There is always one operator per resource kind,
/// in execution order, even when it has nothing to do.
pub struct OperatorCollection<C: ClientSet> {
    stack_name: String,
    logical_resource_ids: Vec<String>,
    unsupported: Vec<StackResourceSummary>,
    operators: Vec<Operator<C>>,
}

impl<C: ClientSet> OperatorCollection<C> {
    /// Classify `summaries`; entries not in DELETE_FAILED are ignored.
    pub fn new(
        stack_name: &str,
        summaries: impl IntoIterator<Item = StackResourceSummary>,
        targets: &TargetResourceTypes,
        factory: &OperatorFactory<C>,
    ) -> Self {
        let mut collection = Self {
            stack_name: stack_name.to_string(),
            logical_resource_ids: Vec::new(),
            unsupported: Vec::new(),
            operators: factory.create_all(targets),
        };

        for resource in summaries.into_iter().filter(|r| r.is_delete_failed()) {
            collection
                .logical_resource_ids
                .push(resource.logical_resource_id.clone());

            let operator = match targets.classify(&resource.resource_type) {
                Some(kind) => collection
                    .operators
                    .iter_mut()
                    .find(|op| op.kind() == kind),
                None => None,
            };

            match operator {
                Some(operator) => operator.add_resource(resource),
                None => collection.unsupported.push(resource),
            }
        }

        collection
    }

    pub fn stack_name(&self) -> &str {
        &self.stack_name
    }

    /// Logical IDs of every DELETE_FAILED resource seen, supported or not
    pub fn logical_resource_ids(&self) -> &[String] {
        &self.logical_resource_ids
    }

    /// Resources whose type is unsupported or not targeted
    pub fn unsupported_resources(&self) -> &[StackResourceSummary] {
        &self.unsupported
    }

    /// Operators in execution order
    pub fn operators(&self) -> &[Operator<C>] {
        &self.operators
    }

    /// Error describing the unsupported resources and the supported types
    pub fn raise_unsupported_resource_error(&self) -> PurgeError {
        PurgeError::UnsupportedResources(unsupported_resource_report(
            &self.stack_name,
            &self.unsupported,
        ))
    }

    /// Run every operator in order, then report.
    ///
    /// A failing operator does not stop later kinds; all failures are
    /// returned together with the unsupported-resource report, if any.
    pub async fn execute(&self) -> Result<(), PurgeError> {
        let mut failures = Vec::new();

        for operator in &self.operators {
            let count = operator.resource_count();
            if count == 0 {
                continue;
            }

            let kind = operator.kind();
            info!(
                stack = %self.stack_name,
                resource_type = %kind.display_type(),
                count,
                "Force deleting resources"
            );

            if let Err(error) = operator.delete_resources().await {
                warn!(
                    stack = %self.stack_name,
                    resource_type = %kind.display_type(),
                    error = %format!("{error:#}"),
                    "Resource deletion failed"
                );
                failures.push(OperatorFailure { kind, error });
            }
        }

        if failures.is_empty() {
            if self.unsupported.is_empty() {
                return Ok(());
            }
            return Err(self.raise_unsupported_resource_error());
        }

        let unsupported = (!self.unsupported.is_empty())
            .then(|| unsupported_resource_report(&self.stack_name, &self.unsupported));
        Err(PurgeError::OperatorsFailed {
            failures,
            unsupported,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::ObjectVersionPage;
    use crate::aws::iam::MockIamOperations;
    use crate::aws::s3::MockS3Operations;
    use crate::aws::AttachedPolicyPage;
    use crate::operation::testing::{MockClients, factory};
    use cfn_purge_common::{ResourceKind, ResourceStatus};
    use cfn_purge_test_utils::{delete_failed, summary};
    use std::sync::Arc;

    fn targets(kinds: &[ResourceKind]) -> TargetResourceTypes {
        TargetResourceTypes::from_kinds(kinds.iter().copied())
    }

    fn counts(collection: &OperatorCollection<MockClients>) -> Vec<(ResourceKind, usize)> {
        collection
            .operators()
            .iter()
            .map(|op| (op.kind(), op.resource_count()))
            .collect()
    }

    #[test]
    fn test_every_failed_resource_classified_once() {
        let summaries = vec![
            delete_failed("Bucket", "AWS::S3::Bucket"),
            delete_failed("Role", "AWS::IAM::Role"),
            delete_failed("Repo", "AWS::ECR::Repository"),
            delete_failed("Vault", "AWS::Backup::BackupVault"),
            delete_failed("Child", "AWS::CloudFormation::Stack"),
            delete_failed("Hook", "Custom::Cleanup"),
            delete_failed("Topic", "AWS::SNS::Topic"),
            summary("Done", "AWS::S3::Bucket", ResourceStatus::DeleteComplete),
        ];

        let collection = OperatorCollection::new(
            "s",
            summaries,
            &TargetResourceTypes::all(),
            &factory(MockClients::default()),
        );

        let routed: usize = collection.operators().iter().map(|op| op.resource_count()).sum();
        assert_eq!(routed + collection.unsupported_resources().len(), 7);
        assert_eq!(collection.logical_resource_ids().len(), 7);
        assert!(!collection.logical_resource_ids().contains(&"Done".to_string()));
        assert!(counts(&collection).iter().all(|(_, n)| *n == 1));
        assert_eq!(collection.unsupported_resources()[0].logical_resource_id, "Topic");
    }

    #[test]
    fn test_untargeted_types_are_unsupported() {
        let collection = OperatorCollection::new(
            "s",
            vec![
                delete_failed("Bucket", "AWS::S3::Bucket"),
                delete_failed("Hook", "Custom::Cleanup"),
            ],
            &targets(&[ResourceKind::IamRole]),
            &factory(MockClients::default()),
        );

        assert_eq!(collection.unsupported_resources().len(), 2);
        assert!(counts(&collection).iter().all(|(_, n)| *n == 0));
        assert_eq!(collection.operators().len(), ResourceKind::ALL.len());
    }

    #[test]
    fn test_custom_wildcard_routes_every_custom_type() {
        let collection = OperatorCollection::new(
            "s",
            vec![
                delete_failed("A", "Custom::A"),
                delete_failed("B", "Custom::B"),
            ],
            &targets(&[ResourceKind::Custom]),
            &factory(MockClients::default()),
        );

        assert!(collection.unsupported_resources().is_empty());
        assert_eq!(
            counts(&collection).last(),
            Some(&(ResourceKind::Custom, 2))
        );
    }

    #[tokio::test]
    async fn test_empty_collection_executes_without_calls() {
        let collection = OperatorCollection::new(
            "s",
            vec![],
            &TargetResourceTypes::all(),
            &factory(MockClients::default()),
        );

        collection.execute().await.unwrap();
    }

    #[tokio::test]
    async fn test_stack_with_unknown_type() {
        let mut s3 = MockS3Operations::new();
        s3.expect_bucket_exists().times(1).returning(|_| Ok(true));
        s3.expect_list_object_versions()
            .returning(|_, _, _| Ok(ObjectVersionPage::default()));
        s3.expect_delete_bucket()
            .withf(|bucket| bucket == "bucket-physical")
            .times(1)
            .returning(|_| Ok(()));

        let mut iam = MockIamOperations::new();
        iam.expect_role_exists().times(1).returning(|_| Ok(true));
        iam.expect_list_attached_role_policies()
            .returning(|_, _| Ok(AttachedPolicyPage::default()));
        iam.expect_delete_role()
            .withf(|role| role == "role-physical")
            .times(1)
            .returning(|_| Ok(()));

        let clients = MockClients {
            s3: Arc::new(s3),
            iam: Arc::new(iam),
            ..Default::default()
        };
        let collection = OperatorCollection::new(
            "S",
            vec![
                delete_failed("Bucket", "AWS::S3::Bucket"),
                delete_failed("Role", "AWS::IAM::Role"),
                delete_failed("Server", "AWS::EC2::Instance"),
            ],
            &targets(&[ResourceKind::S3Bucket, ResourceKind::IamRole]),
            &factory(clients),
        );

        assert_eq!(
            &counts(&collection)[..2],
            &[(ResourceKind::S3Bucket, 1), (ResourceKind::IamRole, 1)]
        );
        assert_eq!(collection.unsupported_resources().len(), 1);
        assert_eq!(
            collection.unsupported_resources()[0].resource_type,
            "AWS::EC2::Instance"
        );

        let message = collection.raise_unsupported_resource_error().to_string();
        assert!(message.starts_with("UnsupportedResourceError: S deletion is FAILED !!!"));
        assert!(message.contains("AWS::EC2::Instance"));

        // Bucket and role are deleted, then the unknown type is reported
        let err = collection.execute().await.unwrap_err();
        assert!(matches!(err, PurgeError::UnsupportedResources(_)));
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_later_kinds() {
        let mut s3 = MockS3Operations::new();
        s3.expect_bucket_exists()
            .returning(|_| Err(anyhow::anyhow!("HeadBucketError")));

        let mut iam = MockIamOperations::new();
        iam.expect_role_exists().times(1).returning(|_| Ok(false));

        let clients = MockClients {
            s3: Arc::new(s3),
            iam: Arc::new(iam),
            ..Default::default()
        };
        let collection = OperatorCollection::new(
            "s",
            vec![
                delete_failed("Bucket", "AWS::S3::Bucket"),
                delete_failed("Role", "AWS::IAM::Role"),
            ],
            &TargetResourceTypes::all(),
            &factory(clients),
        );

        match collection.execute().await.unwrap_err() {
            PurgeError::OperatorsFailed {
                failures,
                unsupported,
            } => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].kind, ResourceKind::S3Bucket);
                assert_eq!(failures[0].error.to_string(), "HeadBucketError");
                assert!(unsupported.is_none());
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
