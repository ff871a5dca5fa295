//! Typed errors raised by the deletion engine

use crate::aws::ObjectDeletionError;
use cfn_purge_common::ResourceKind;
use std::fmt::Write as _;
use thiserror::Error;

/// One resource kind whose operator failed during a pass
#[derive(Debug)]
pub struct OperatorFailure {
    pub kind: ResourceKind,
    pub error: anyhow::Error,
}

/// Errors raised while force-deleting a stack
#[derive(Debug, Error)]
pub enum PurgeError {
    /// DELETE_FAILED resources whose type is unsupported or not targeted
    #[error("UnsupportedResourceError: {0}")]
    UnsupportedResources(String),

    /// One or more operators failed; every operator was still attempted
    #[error("{}", render_failures(.failures, .unsupported.as_deref()))]
    OperatorsFailed {
        failures: Vec<OperatorFailure>,
        /// Unsupported-resource report from the same pass, if any
        unsupported: Option<String>,
    },

    #[error("Stack {0} does not exist")]
    StackNotFound(String),

    #[error("Stack {0} has termination protection enabled")]
    TerminationProtection(String),

    #[error("Stack {stack} is in {status}, wait for the running operation to finish")]
    OperationInProgress { stack: String, status: String },

    #[error("Stack {stack} deletion failed: {reason}")]
    StackDeleteFailed { stack: String, reason: String },

    /// Objects kept appearing in a bucket across every emptying pass
    #[error("Bucket {bucket} still held {remaining} objects after {passes} passes")]
    BucketNotEmptied {
        bucket: String,
        passes: u32,
        remaining: usize,
    },

    /// Per-object failures reported by DeleteObjects
    #[error("{}", render_object_errors(.0))]
    ObjectDeletion(Vec<ObjectDeletionError>),
}

fn render_failures(failures: &[OperatorFailure], unsupported: Option<&str>) -> String {
    let mut out = format!("{} resource type(s) failed to delete:", failures.len());
    for failure in failures {
        let _ = write!(out, "\n  {}: {:#}", failure.kind.display_type(), failure.error);
    }
    if let Some(report) = unsupported {
        let _ = write!(out, "\nUnsupportedResourceError: {report}");
    }
    out
}

fn render_object_errors(errors: &[ObjectDeletionError]) -> String {
    let mut out = String::from("DeleteObjectsError: followings \n");
    for e in errors {
        let _ = write!(
            out,
            "Code: {}\nKey: {}\nVersionId: {}\nMessage: {}\n",
            e.code, e.key, e.version_id, e.message
        );
    }
    out
}
