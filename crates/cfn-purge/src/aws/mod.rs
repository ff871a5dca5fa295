//! AWS SDK client wrappers
//!
//! This module provides thin wrappers around the AWS SDK clients that
//! cfn-purge needs to clear blocking state and delete stack resources.
//! Each wrapper implements a capability trait so the deletion engine can
//! run against mocks in tests.

pub mod backup;
pub mod cloudformation;
pub mod context;
pub mod ecr;
pub mod error;
pub mod iam;
pub mod s3;

pub use backup::{BackupClient, BackupOperations, RecoveryPointPage};
pub use cloudformation::{
    CloudFormationClient, CloudFormationOperations, StackDeletion, StackInfo, StackResourcePage,
};
pub use context::{AwsContext, FromAwsContext};
pub use ecr::{EcrClient, EcrOperations};
pub use error::{AwsError, classify_anyhow_error, classify_aws_error};
pub use iam::{AttachedPolicyPage, IamClient, IamOperations};
pub use s3::{ObjectDeletionError, ObjectVersion, ObjectVersionPage, S3Client, S3Operations};
