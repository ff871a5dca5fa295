//! Root stack driver

use super::error::PurgeError;
use super::factory::{ClientSet, OperatorFactory};
use super::stack::{delete_and_wait, force_delete};
use crate::aws::{CloudFormationOperations, StackDeletion};
use anyhow::Result;
use cfn_purge_common::TargetResourceTypes;
use tracing::{info, warn};

/// Deletes a root stack, force-deleting its DELETE_FAILED resources if an
/// ordinary deletion does not succeed.
pub struct StackPurger<C: ClientSet> {
    factory: OperatorFactory<C>,
    targets: TargetResourceTypes,
}

impl<C: ClientSet> StackPurger<C> {
    pub fn new(factory: OperatorFactory<C>, targets: TargetResourceTypes) -> Self {
        Self { factory, targets }
    }

    pub async fn purge(&self, stack_name: &str) -> Result<()> {
        let cfn = self.factory.clients().cloudformation();
        let stack = cfn
            .describe_stack(stack_name)
            .await?
            .ok_or_else(|| PurgeError::StackNotFound(stack_name.to_string()))?;

        if stack.termination_protection {
            return Err(PurgeError::TerminationProtection(stack.stack_name).into());
        }
        if stack.is_in_progress() {
            return Err(PurgeError::OperationInProgress {
                stack: stack.stack_name,
                status: stack.status,
            }
            .into());
        }

        if !stack.is_delete_failed() {
            info!(stack = %stack.stack_name, status = %stack.status, "Deleting stack");
            match delete_and_wait(cfn.as_ref(), &stack).await? {
                StackDeletion::Deleted => {
                    info!(stack = %stack.stack_name, "Stack deleted");
                    return Ok(());
                }
                StackDeletion::Failed { reason } => {
                    warn!(stack = %stack.stack_name, reason = %reason, "Stack deletion failed");
                }
            }
        }

        force_delete(&self.factory, &self.targets, &stack).await
    }
}
