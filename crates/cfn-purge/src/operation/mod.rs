//! Force deletion of DELETE_FAILED stack resources
//!
//! Failed resources are classified by type into an [`OperatorCollection`].
//! Each [`Operator`] clears the blocking state of its resources (emptying
//! buckets, detaching policies, removing recovery points, recursing into
//! nested stacks) and deletes them with bounded concurrency.

pub mod backup_vault;
pub mod bucket;
pub mod collection;
pub mod custom;
pub mod ecr;
pub mod error;
pub mod executor;
pub mod factory;
pub mod purger;
pub mod report;
pub mod role;
pub mod stack;

#[cfg(test)]
pub(crate) mod testing;

pub use collection::OperatorCollection;
pub use error::{OperatorFailure, PurgeError};
pub use executor::run_bounded;
pub use factory::{AwsClients, ClientSet, OperatorFactory, OperatorSettings};
pub use purger::StackPurger;

use anyhow::Result;
use backup_vault::BackupVaultOperator;
use bucket::BucketOperator;
use cfn_purge_common::{ResourceKind, StackResourceSummary};
use custom::CustomOperator;
use ecr::EcrOperator;
use role::RoleOperator;
use stack::StackOperator;

/// Common contract of every per-type operator
#[allow(async_fn_in_trait)] // Futures are awaited in place, never spawned
pub trait DeleteOperator {
    /// Resource kind this operator handles
    fn kind(&self) -> ResourceKind;

    fn add_resource(&mut self, resource: StackResourceSummary);

    fn resources(&self) -> &[StackResourceSummary];

    fn resource_count(&self) -> usize {
        self.resources().len()
    }

    /// Clear and delete every resource, returning the first failure.
    ///
    /// Succeeds without any remote call when no resources were added.
    async fn delete_resources(&self) -> Result<()>;
}

/// Closed set of operators, one variant per [`ResourceKind`]
pub enum Operator<C: ClientSet> {
    Bucket(BucketOperator<C::S3>),
    Role(RoleOperator<C::Iam>),
    Ecr(EcrOperator<C::Ecr>),
    BackupVault(BackupVaultOperator<C::Backup>),
    Stack(StackOperator<C>),
    Custom(CustomOperator),
}

impl<C: ClientSet> DeleteOperator for Operator<C> {
    fn kind(&self) -> ResourceKind {
        match self {
            Operator::Bucket(op) => op.kind(),
            Operator::Role(op) => op.kind(),
            Operator::Ecr(op) => op.kind(),
            Operator::BackupVault(op) => op.kind(),
            Operator::Stack(op) => op.kind(),
            Operator::Custom(op) => op.kind(),
        }
    }

    fn add_resource(&mut self, resource: StackResourceSummary) {
        match self {
            Operator::Bucket(op) => op.add_resource(resource),
            Operator::Role(op) => op.add_resource(resource),
            Operator::Ecr(op) => op.add_resource(resource),
            Operator::BackupVault(op) => op.add_resource(resource),
            Operator::Stack(op) => op.add_resource(resource),
            Operator::Custom(op) => op.add_resource(resource),
        }
    }

    fn resources(&self) -> &[StackResourceSummary] {
        match self {
            Operator::Bucket(op) => op.resources(),
            Operator::Role(op) => op.resources(),
            Operator::Ecr(op) => op.resources(),
            Operator::BackupVault(op) => op.resources(),
            Operator::Stack(op) => op.resources(),
            Operator::Custom(op) => op.resources(),
        }
    }

    async fn delete_resources(&self) -> Result<()> {
        match self {
            Operator::Bucket(op) => op.delete_resources().await,
            Operator::Role(op) => op.delete_resources().await,
            Operator::Ecr(op) => op.delete_resources().await,
            Operator::BackupVault(op) => op.delete_resources().await,
            Operator::Stack(op) => op.delete_resources().await,
            Operator::Custom(op) => op.delete_resources().await,
        }
    }
}
