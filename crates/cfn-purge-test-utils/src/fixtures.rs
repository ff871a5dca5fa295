//! Builders for stack resource summaries used across tests

use cfn_purge_common::{ResourceStatus, StackResourceSummary};

/// Build a summary with an explicit status
pub fn summary(
    logical_id: &str,
    resource_type: &str,
    status: ResourceStatus,
) -> StackResourceSummary {
    StackResourceSummary {
        logical_resource_id: logical_id.to_string(),
        physical_resource_id: format!("{}-physical", logical_id.to_lowercase()),
        resource_type: resource_type.to_string(),
        resource_status: status,
    }
}

/// Build a `DELETE_FAILED` summary; the physical ID is the lowercased
/// logical ID with a `-physical` suffix.
pub fn delete_failed(logical_id: &str, resource_type: &str) -> StackResourceSummary {
    summary(logical_id, resource_type, ResourceStatus::DeleteFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_failed_fixture() {
        let s = delete_failed("MyBucket", "AWS::S3::Bucket");
        assert_eq!(s.physical_resource_id, "mybucket-physical");
        assert!(s.is_delete_failed());
    }
}
