//! Operator construction and capability injection

use super::backup_vault::BackupVaultOperator;
use super::bucket::BucketOperator;
use super::custom::CustomOperator;
use super::ecr::EcrOperator;
use super::role::RoleOperator;
use super::stack::StackOperator;
use super::Operator;
use crate::aws::{
    AwsContext, BackupClient, BackupOperations, CloudFormationClient, CloudFormationOperations,
    EcrClient, EcrOperations, FromAwsContext, IamClient, IamOperations, S3Client, S3Operations,
};
use crate::wait::WaitConfig;
use cfn_purge_common::defaults::{
    DEFAULT_CONCURRENCY, DEFAULT_IAM_RETRY_ATTEMPTS, DEFAULT_IAM_RETRY_DELAY,
    DEFAULT_MAX_BUCKET_PASSES,
};
use cfn_purge_common::{ResourceKind, TargetResourceTypes};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// The remote capabilities operators are built from.
///
/// Implemented by [`AwsClients`] for real runs and by mock sets in tests.
pub trait ClientSet {
    type S3: S3Operations;
    type Iam: IamOperations;
    type Ecr: EcrOperations;
    type Backup: BackupOperations;
    type CloudFormation: CloudFormationOperations;

    fn s3(&self) -> Arc<Self::S3>;
    fn iam(&self) -> Arc<Self::Iam>;
    fn ecr(&self) -> Arc<Self::Ecr>;
    fn backup(&self) -> Arc<Self::Backup>;
    fn cloudformation(&self) -> Arc<Self::CloudFormation>;
}

/// SDK-backed clients sharing one AWS configuration
pub struct AwsClients {
    s3: Arc<S3Client>,
    iam: Arc<IamClient>,
    ecr: Arc<EcrClient>,
    backup: Arc<BackupClient>,
    cloudformation: Arc<CloudFormationClient>,
}

impl AwsClients {
    /// Build every client from one context; stack waits use `wait` and
    /// stop early when `cancel` fires.
    pub fn new(ctx: &AwsContext, wait: WaitConfig, cancel: CancellationToken) -> Self {
        Self {
            s3: Arc::new(S3Client::from_context(ctx)),
            iam: Arc::new(IamClient::from_context(ctx)),
            ecr: Arc::new(EcrClient::from_context(ctx)),
            backup: Arc::new(BackupClient::from_context(ctx)),
            cloudformation: Arc::new(
                CloudFormationClient::from_context(ctx).with_wait(wait, Some(cancel)),
            ),
        }
    }
}

impl ClientSet for AwsClients {
    type S3 = S3Client;
    type Iam = IamClient;
    type Ecr = EcrClient;
    type Backup = BackupClient;
    type CloudFormation = CloudFormationClient;

    fn s3(&self) -> Arc<S3Client> {
        self.s3.clone()
    }

    fn iam(&self) -> Arc<IamClient> {
        self.iam.clone()
    }

    fn ecr(&self) -> Arc<EcrClient> {
        self.ecr.clone()
    }

    fn backup(&self) -> Arc<BackupClient> {
        self.backup.clone()
    }

    fn cloudformation(&self) -> Arc<CloudFormationClient> {
        self.cloudformation.clone()
    }
}

/// Tunables passed to every operator
#[derive(Debug, Clone)]
pub struct OperatorSettings {
    /// Maximum concurrent deletions inside one operator
    pub concurrency: usize,
    /// Delay between IAM detach/delete attempts
    pub iam_retry_delay: Duration,
    pub iam_retry_attempts: usize,
    /// Maximum list-and-delete passes when emptying a bucket
    pub max_bucket_passes: u32,
}

impl Default for OperatorSettings {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            iam_retry_delay: DEFAULT_IAM_RETRY_DELAY,
            iam_retry_attempts: DEFAULT_IAM_RETRY_ATTEMPTS,
            max_bucket_passes: DEFAULT_MAX_BUCKET_PASSES,
        }
    }
}

/// Builds one operator per resource kind
pub struct OperatorFactory<C: ClientSet> {
    clients: Arc<C>,
    settings: OperatorSettings,
}

impl<C: ClientSet> Clone for OperatorFactory<C> {
    fn clone(&self) -> Self {
        Self {
            clients: self.clients.clone(),
            settings: self.settings.clone(),
        }
    }
}

impl<C: ClientSet> OperatorFactory<C> {
    pub fn new(clients: C, settings: OperatorSettings) -> Self {
        Self {
            clients: Arc::new(clients),
            settings,
        }
    }

    pub fn clients(&self) -> &C {
        &self.clients
    }

    pub fn settings(&self) -> &OperatorSettings {
        &self.settings
    }

    /// Create an empty operator for `kind`.
    ///
    /// Nested stack operators re-run classification with `targets`.
    pub fn create(&self, kind: ResourceKind, targets: &TargetResourceTypes) -> Operator<C> {
        let concurrency = self.settings.concurrency;
        match kind {
            ResourceKind::S3Bucket => Operator::Bucket(BucketOperator::new(
                self.clients.s3(),
                concurrency,
                self.settings.max_bucket_passes,
            )),
            ResourceKind::IamRole => Operator::Role(RoleOperator::new(
                self.clients.iam(),
                concurrency,
                self.settings.iam_retry_delay,
                self.settings.iam_retry_attempts,
            )),
            ResourceKind::EcrRepository => {
                Operator::Ecr(EcrOperator::new(self.clients.ecr(), concurrency))
            }
            ResourceKind::BackupVault => Operator::BackupVault(BackupVaultOperator::new(
                self.clients.backup(),
                concurrency,
            )),
            ResourceKind::CloudFormationStack => {
                Operator::Stack(StackOperator::new(self.clone(), targets.clone()))
            }
            ResourceKind::Custom => Operator::Custom(CustomOperator::new()),
        }
    }

    /// One empty operator per kind, in execution order
    pub fn create_all(&self, targets: &TargetResourceTypes) -> Vec<Operator<C>> {
        ResourceKind::ALL
            .into_iter()
            .map(|kind| self.create(kind, targets))
            .collect()
    }
}
