//! Nested stack operator and the force-delete pipeline shared with the root
//!
//! A nested stack gets its own classification pass, its own operators and
//! its own concurrency limit before the stack itself is deleted again. The
//! recursion follows the stack tree, so it always terminates.

use super::collection::OperatorCollection;
use super::error::PurgeError;
use super::executor::run_bounded;
use super::factory::{ClientSet, OperatorFactory};
use super::DeleteOperator;
use crate::aws::cloudformation::DELETE_COMPLETE;
use crate::aws::{CloudFormationOperations, StackDeletion, StackInfo};
use anyhow::Result;
use cfn_purge_common::{ResourceKind, StackResourceSummary, TargetResourceTypes};
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use tracing::{debug, info};

pub struct StackOperator<C: ClientSet> {
    factory: OperatorFactory<C>,
    targets: TargetResourceTypes,
    resources: Vec<StackResourceSummary>,
}

impl<C: ClientSet> StackOperator<C> {
    pub fn new(factory: OperatorFactory<C>, targets: TargetResourceTypes) -> Self {
        Self {
            factory,
            targets,
            resources: Vec::new(),
        }
    }

    /// Force-delete a nested stack by ID. A missing stack counts as deleted.
    ///
    /// Boxed because the pipeline below can come back here for deeper
    /// nested stacks.
    pub fn delete_stack<'a>(&'a self, stack_id: &'a str) -> LocalBoxFuture<'a, Result<()>> {
        async move {
            let cfn = self.factory.clients().cloudformation();
            let stack = match cfn.describe_stack(stack_id).await? {
                Some(stack) if stack.status != DELETE_COMPLETE => stack,
                _ => {
                    info!(stack = %stack_id, "Nested stack already deleted");
                    return Ok(());
                }
            };

            force_delete(&self.factory, &self.targets, &stack).await
        }
        .boxed_local()
    }
}

impl<C: ClientSet> DeleteOperator for StackOperator<C> {
    fn kind(&self) -> ResourceKind {
        ResourceKind::CloudFormationStack
    }

    fn add_resource(&mut self, resource: StackResourceSummary) {
        self.resources.push(resource);
    }

    fn resources(&self) -> &[StackResourceSummary] {
        &self.resources
    }

    async fn delete_resources(&self) -> Result<()> {
        run_bounded(
            self.factory.settings().concurrency,
            self.resources
                .iter()
                .map(|r| move || self.delete_stack(&r.physical_resource_id)),
        )
        .await
    }
}

/// Every resource of a stack, across all pages
pub async fn list_all_resources<F: CloudFormationOperations>(
    cfn: &F,
    stack: &str,
) -> Result<Vec<StackResourceSummary>> {
    let mut summaries = Vec::new();
    let mut next_token = None;

    loop {
        let page = cfn.list_stack_resources(stack, next_token).await?;
        summaries.extend(page.summaries);

        match page.next_token {
            Some(token) => next_token = Some(token),
            None => return Ok(summaries),
        }
    }
}

/// Request deletion of a stack and wait for the outcome
pub async fn delete_and_wait<F: CloudFormationOperations>(
    cfn: &F,
    stack: &StackInfo,
) -> Result<StackDeletion> {
    cfn.delete_stack(&stack.stack_id).await?;
    let outcome = cfn.wait_stack_deleted(&stack.stack_id).await?;
    debug!(stack = %stack.stack_name, outcome = ?outcome, "Stack deletion finished");
    Ok(outcome)
}

/// Clear the DELETE_FAILED resources of `stack`, then delete it again
pub async fn force_delete<C: ClientSet>(
    factory: &OperatorFactory<C>,
    targets: &TargetResourceTypes,
    stack: &StackInfo,
) -> Result<()> {
    let cfn = factory.clients().cloudformation();
    let summaries = list_all_resources(cfn.as_ref(), &stack.stack_id).await?;

    let collection = OperatorCollection::new(&stack.stack_name, summaries, targets, factory);
    info!(
        stack = %collection.stack_name(),
        resources = ?collection.logical_resource_ids(),
        "Force deleting DELETE_FAILED resources"
    );
    collection.execute().await?;

    match delete_and_wait(cfn.as_ref(), stack).await? {
        StackDeletion::Deleted => {
            info!(stack = %stack.stack_name, "Stack deleted");
            Ok(())
        }
        StackDeletion::Failed { reason } => Err(PurgeError::StackDeleteFailed {
            stack: stack.stack_name.clone(),
            reason,
        }
        .into()),
    }
}
