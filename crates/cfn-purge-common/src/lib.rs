//! cfn-purge-common - Shared types and defaults
//!
//! This crate holds the types shared by the cfn-purge library, its binary
//! and its test helpers, without any AWS SDK dependencies to keep it
//! lightweight.
//!
//! ## Modules
//!
//! - [`defaults`]: Default configuration values
//! - [`resource_kind`]: Supported resource types and the permitted-type set
//! - [`stack_resource`]: Stack resource summaries reported by CloudFormation

pub mod defaults;
pub mod resource_kind;
pub mod stack_resource;

// Re-export commonly used types
pub use resource_kind::{ParseResourceTypeError, ResourceKind, TargetResourceTypes};
pub use stack_resource::{ResourceStatus, StackResourceSummary};
