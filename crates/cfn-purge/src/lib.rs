//! cfn-purge - Force deletion of CloudFormation stacks stuck in DELETE_FAILED
//!
//! Clears whatever blocks deletion of a stack's failed resources (bucket
//! contents, attached role policies, repository images, recovery points,
//! nested stacks) and then deletes the stack again.

pub mod aws;
pub mod config;
pub mod operation;
pub mod wait;
