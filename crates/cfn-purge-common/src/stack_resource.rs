//! Stack resource summaries as reported by CloudFormation

use std::fmt;

/// Status of a stack resource
///
/// Only the statuses cfn-purge acts on get their own variant; everything
/// else is kept verbatim in [`ResourceStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceStatus {
    DeleteFailed,
    DeleteInProgress,
    DeleteComplete,
    DeleteSkipped,
    Other(String),
}

impl ResourceStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ResourceStatus::DeleteFailed => "DELETE_FAILED",
            ResourceStatus::DeleteInProgress => "DELETE_IN_PROGRESS",
            ResourceStatus::DeleteComplete => "DELETE_COMPLETE",
            ResourceStatus::DeleteSkipped => "DELETE_SKIPPED",
            ResourceStatus::Other(s) => s,
        }
    }
}

impl From<&str> for ResourceStatus {
    fn from(s: &str) -> Self {
        match s {
            "DELETE_FAILED" => ResourceStatus::DeleteFailed,
            "DELETE_IN_PROGRESS" => ResourceStatus::DeleteInProgress,
            "DELETE_COMPLETE" => ResourceStatus::DeleteComplete,
            "DELETE_SKIPPED" => ResourceStatus::DeleteSkipped,
            other => ResourceStatus::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only snapshot of one resource in a stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackResourceSummary {
    /// Logical ID from the template
    pub logical_resource_id: String,
    /// Physical name or ID (bucket name, role name, stack ID, ...)
    pub physical_resource_id: String,
    /// CloudFormation type, e.g. `AWS::S3::Bucket`
    pub resource_type: String,
    pub resource_status: ResourceStatus,
}

impl StackResourceSummary {
    /// Whether this resource is eligible for force deletion
    pub fn is_delete_failed(&self) -> bool {
        self.resource_status == ResourceStatus::DeleteFailed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip_known() {
        for s in ["DELETE_FAILED", "DELETE_IN_PROGRESS", "DELETE_COMPLETE", "DELETE_SKIPPED"] {
            assert_eq!(ResourceStatus::from(s).as_str(), s);
        }
        assert_eq!(ResourceStatus::from("DELETE_FAILED"), ResourceStatus::DeleteFailed);
    }

    #[test]
    fn test_status_keeps_unknown_verbatim() {
        let status = ResourceStatus::from("UPDATE_ROLLBACK_COMPLETE");
        assert_eq!(status, ResourceStatus::Other("UPDATE_ROLLBACK_COMPLETE".to_string()));
        assert_eq!(status.to_string(), "UPDATE_ROLLBACK_COMPLETE");
    }

    #[test]
    fn test_is_delete_failed() {
        let mut summary = StackResourceSummary {
            logical_resource_id: "Bucket".to_string(),
            physical_resource_id: "my-bucket".to_string(),
            resource_type: "AWS::S3::Bucket".to_string(),
            resource_status: ResourceStatus::DeleteFailed,
        };
        assert!(summary.is_delete_failed());

        summary.resource_status = ResourceStatus::DeleteComplete;
        assert!(!summary.is_delete_failed());
    }
}
