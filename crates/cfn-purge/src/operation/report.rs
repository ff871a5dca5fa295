//! Human-readable reports for unsupported resources and supported types

use cfn_purge_common::{ResourceKind, StackResourceSummary};
use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};

/// Describe the resources left behind because their type was not targeted,
/// followed by the reference table of supported types.
pub fn unsupported_resource_report(
    stack_name: &str,
    unsupported: &[StackResourceSummary],
) -> String {
    let mut resources = Table::new();
    resources
        .load_preset(UTF8_FULL_CONDENSED)
        .set_header(vec![Cell::new("ResourceType"), Cell::new("Resource")]);
    for r in unsupported {
        resources.add_row(vec![
            Cell::new(&r.resource_type),
            Cell::new(&r.logical_resource_id),
        ]);
    }

    format!(
        "{stack_name} deletion is FAILED !!!\n\
         \nThese are the resources unsupported (or not included in the target resource types), so failed delete:\n\
         {resources}\n\
         \nSupported resources for force deletion of DELETE_FAILED resources are followings.\n\
         {}",
        supported_types_table(ContentArrangement::Disabled)
    )
}

/// Table of every supported resource type and what force deletion covers
pub fn supported_types_table(arrangement: ContentArrangement) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(arrangement)
        .set_header(vec![Cell::new("ResourceType"), Cell::new("Description")]);

    for kind in ResourceKind::ALL {
        table.add_row(vec![
            Cell::new(kind.display_type()),
            Cell::new(kind.description()),
        ]);
    }

    table
}

/// Supported resource types as JSON, in execution order
pub fn supported_types_json() -> serde_json::Value {
    serde_json::Value::Array(
        ResourceKind::ALL
            .into_iter()
            .map(|kind| {
                serde_json::json!({
                    "resourceType": kind.display_type(),
                    "description": kind.description(),
                    "order": kind.execution_order(),
                })
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfn_purge_test_utils::delete_failed;

    #[test]
    fn test_report_names_stack_and_resources() {
        let report = unsupported_resource_report(
            "my-stack",
            &[delete_failed("Server", "AWS::EC2::Instance")],
        );

        assert!(report.starts_with("my-stack deletion is FAILED !!!\n"));
        assert!(report.contains("AWS::EC2::Instance"));
        assert!(report.contains("Server"));
        for kind in ResourceKind::ALL {
            assert!(report.contains(kind.display_type()), "missing {kind}");
        }
    }

    #[test]
    fn test_types_json_lists_every_kind() {
        let json = supported_types_json();
        let entries = json.as_array().unwrap();

        assert_eq!(entries.len(), ResourceKind::ALL.len());
        assert_eq!(entries[0]["resourceType"], "AWS::S3::Bucket");
        assert_eq!(entries[5]["resourceType"], "Custom::Xxx");
    }
}
