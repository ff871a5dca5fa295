//! Run configuration for the delete command

use crate::operation::OperatorSettings;
use crate::wait::WaitConfig;
use cfn_purge_common::{ParseResourceTypeError, TargetResourceTypes};
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// No stack names were given
    #[error("at least one stack name is required")]
    NoStacks,

    /// A stack name was empty
    #[error("stack name cannot be empty")]
    EmptyStackName,

    #[error("concurrency must be at least 1, got {0}")]
    InvalidConcurrency(usize),

    #[error("max bucket passes must be at least 1")]
    InvalidMaxBucketPasses,

    /// Resource type list selected nothing
    #[error("no resource types selected")]
    NoResourceTypes,

    #[error(transparent)]
    ResourceType(#[from] ParseResourceTypeError),
}

/// AWS connection settings
#[derive(Debug, Clone, Default)]
pub struct AwsSettings {
    /// Region override; the SDK default chain is used when unset
    pub region: Option<String>,
    /// Named profile override
    pub profile: Option<String>,
}

/// Configuration for one `delete` invocation
#[derive(Debug, Clone)]
pub struct PurgeConfig {
    /// Stacks to delete, processed in order
    pub stacks: Vec<String>,
    pub aws: AwsSettings,
    /// Resource types the run may force-delete
    pub targets: TargetResourceTypes,
    pub operators: OperatorSettings,
    /// Polling used while waiting for stack deletion
    pub stack_wait: WaitConfig,
}

impl PurgeConfig {
    /// Parse a comma-separated type list; `None` permits every type
    pub fn parse_targets(list: Option<&str>) -> Result<TargetResourceTypes, ConfigError> {
        match list {
            None => Ok(TargetResourceTypes::all()),
            Some(list) => Ok(TargetResourceTypes::parse_list(list)?),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stacks.is_empty() {
            return Err(ConfigError::NoStacks);
        }
        if self.stacks.iter().any(|s| s.trim().is_empty()) {
            return Err(ConfigError::EmptyStackName);
        }
        if self.operators.concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency(0));
        }
        if self.operators.max_bucket_passes == 0 {
            return Err(ConfigError::InvalidMaxBucketPasses);
        }
        if self.targets.is_empty() {
            return Err(ConfigError::NoResourceTypes);
        }
        Ok(())
    }
}
