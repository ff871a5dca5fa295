//! Custom resource operator
//!
//! Custom resources are removed by their provider when the owning stack
//! deletion is retried, so this operator only marks them as handled.

use super::DeleteOperator;
use anyhow::Result;
use cfn_purge_common::{ResourceKind, StackResourceSummary};
use tracing::debug;

#[derive(Debug, Default)]
pub struct CustomOperator {
    resources: Vec<StackResourceSummary>,
}

impl CustomOperator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DeleteOperator for CustomOperator {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Custom
    }

    fn add_resource(&mut self, resource: StackResourceSummary) {
        self.resources.push(resource);
    }

    fn resources(&self) -> &[StackResourceSummary] {
        &self.resources
    }

    async fn delete_resources(&self) -> Result<()> {
        for r in &self.resources {
            debug!(
                resource = %r.logical_resource_id,
                resource_type = %r.resource_type,
                "Left to provider"
            );
        }
        Ok(())
    }
}
