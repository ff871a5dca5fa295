//! Mock client set for operator tests

use super::factory::{ClientSet, OperatorFactory, OperatorSettings};
use crate::aws::backup::MockBackupOperations;
use crate::aws::cloudformation::MockCloudFormationOperations;
use crate::aws::ecr::MockEcrOperations;
use crate::aws::iam::MockIamOperations;
use crate::aws::s3::MockS3Operations;
use std::sync::Arc;
use std::time::Duration;

/// Mocks without expectations panic on any call
#[derive(Default)]
pub struct MockClients {
    pub s3: Arc<MockS3Operations>,
    pub iam: Arc<MockIamOperations>,
    pub ecr: Arc<MockEcrOperations>,
    pub backup: Arc<MockBackupOperations>,
    pub cloudformation: Arc<MockCloudFormationOperations>,
}

impl ClientSet for MockClients {
    type S3 = MockS3Operations;
    type Iam = MockIamOperations;
    type Ecr = MockEcrOperations;
    type Backup = MockBackupOperations;
    type CloudFormation = MockCloudFormationOperations;

    fn s3(&self) -> Arc<MockS3Operations> {
        self.s3.clone()
    }

    fn iam(&self) -> Arc<MockIamOperations> {
        self.iam.clone()
    }

    fn ecr(&self) -> Arc<MockEcrOperations> {
        self.ecr.clone()
    }

    fn backup(&self) -> Arc<MockBackupOperations> {
        self.backup.clone()
    }

    fn cloudformation(&self) -> Arc<MockCloudFormationOperations> {
        self.cloudformation.clone()
    }
}

/// Settings with no retry delay so failing IAM calls do not slow tests
pub fn fast_settings() -> OperatorSettings {
    OperatorSettings {
        concurrency: 2,
        iam_retry_delay: Duration::ZERO,
        iam_retry_attempts: 2,
        max_bucket_passes: 5,
    }
}

pub fn factory(clients: MockClients) -> OperatorFactory<MockClients> {
    OperatorFactory::new(clients, fast_settings())
}
