//! Supported CloudFormation resource types and their deletion order
//!
//! Provides the fixed registry of resource types cfn-purge knows how to
//! force-delete, plus the set of types a run is permitted to touch.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Prefix shared by every provider-defined custom resource type
pub const CUSTOM_RESOURCE_PREFIX: &str = "Custom::";

/// Resource types cfn-purge can force-delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKind {
    /// S3 bucket, possibly non-empty or versioned
    S3Bucket,
    /// IAM role with managed policies attached from outside the stack
    IamRole,
    /// ECR repository still holding images
    EcrRepository,
    /// AWS Backup vault still holding recovery points
    BackupVault,
    /// Nested child stack with its own DELETE_FAILED resources
    CloudFormationStack,
    /// Any `Custom::*` resource (deleted by its provider)
    Custom,
}

impl ResourceKind {
    /// Every kind, in execution order
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::S3Bucket,
        ResourceKind::IamRole,
        ResourceKind::EcrRepository,
        ResourceKind::BackupVault,
        ResourceKind::CloudFormationStack,
        ResourceKind::Custom,
    ];

    /// CloudFormation type identifier (`Custom::` for the custom family)
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::S3Bucket => "AWS::S3::Bucket",
            ResourceKind::IamRole => "AWS::IAM::Role",
            ResourceKind::EcrRepository => "AWS::ECR::Repository",
            ResourceKind::BackupVault => "AWS::Backup::BackupVault",
            ResourceKind::CloudFormationStack => "AWS::CloudFormation::Stack",
            ResourceKind::Custom => CUSTOM_RESOURCE_PREFIX,
        }
    }

    /// Identifier shown to users in tables (`Custom::Xxx` for the custom family)
    pub fn display_type(self) -> &'static str {
        match self {
            ResourceKind::Custom => "Custom::Xxx",
            other => other.as_str(),
        }
    }

    /// Human-readable description of what force deletion covers
    pub fn description(self) -> &'static str {
        match self {
            ResourceKind::S3Bucket => {
                "S3 Buckets, including buckets with Non-empty or Versioning enabled and DeletionPolicy not Retain."
            }
            ResourceKind::IamRole => {
                "IAM Roles, including roles with policies from outside the stack."
            }
            ResourceKind::EcrRepository => {
                "ECR Repositories, including repositories containing images."
            }
            ResourceKind::BackupVault => {
                "Backup Vaults, including vaults containing recovery points."
            }
            ResourceKind::CloudFormationStack => "Nested Child Stacks that failed to delete.",
            ResourceKind::Custom => "Custom Resources, but they will be deleted on its own.",
        }
    }

    /// Get execution order (lower number = deleted first)
    ///
    /// Independent, typically fast deletions run first; nested stacks
    /// recurse into their own resources and may be slow, so they run
    /// after every other real deletion. Custom resources are a no-op.
    pub fn execution_order(self) -> u8 {
        match self {
            ResourceKind::S3Bucket => 0,
            ResourceKind::IamRole => 1,
            ResourceKind::EcrRepository => 2,
            ResourceKind::BackupVault => 3,
            ResourceKind::CloudFormationStack => 4,
            ResourceKind::Custom => 5,
        }
    }

    /// Map a raw CloudFormation resource type to a supported kind.
    ///
    /// Any type starting with `Custom::` maps to [`ResourceKind::Custom`].
    pub fn classify(resource_type: &str) -> Option<ResourceKind> {
        match resource_type {
            "AWS::S3::Bucket" => Some(ResourceKind::S3Bucket),
            "AWS::IAM::Role" => Some(ResourceKind::IamRole),
            "AWS::ECR::Repository" => Some(ResourceKind::EcrRepository),
            "AWS::Backup::BackupVault" => Some(ResourceKind::BackupVault),
            "AWS::CloudFormation::Stack" => Some(ResourceKind::CloudFormationStack),
            t if t.starts_with(CUSTOM_RESOURCE_PREFIX) => Some(ResourceKind::Custom),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a permitted-type identifier is not in the registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported resource type '{0}' (run `cfn-purge types` to list supported types)")]
pub struct ParseResourceTypeError(pub String);

impl FromStr for ResourceKind {
    type Err = ParseResourceTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        // Accept the wildcard in its table spelling too
        if s == "Custom::Xxx" {
            return Ok(ResourceKind::Custom);
        }
        ResourceKind::classify(s).ok_or_else(|| ParseResourceTypeError(s.to_string()))
    }
}

/// The set of resource types a run is authorized to force-delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetResourceTypes {
    kinds: BTreeSet<ResourceKind>,
}

impl TargetResourceTypes {
    /// Permit every supported kind
    pub fn all() -> Self {
        Self::from_kinds(ResourceKind::ALL)
    }

    /// Permit exactly the given kinds
    pub fn from_kinds(kinds: impl IntoIterator<Item = ResourceKind>) -> Self {
        Self {
            kinds: kinds.into_iter().collect(),
        }
    }

    /// Parse a comma-separated list of type identifiers
    pub fn parse_list(list: &str) -> Result<Self, ParseResourceTypeError> {
        let kinds = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self { kinds })
    }

    /// Kind of a raw resource type, if the run may force-delete it.
    ///
    /// A `Custom::` wildcard entry matches every custom resource type.
    pub fn classify(&self, resource_type: &str) -> Option<ResourceKind> {
        ResourceKind::classify(resource_type).filter(|kind| self.contains(*kind))
    }

    /// Whether a given kind is permitted
    pub fn contains(&self, kind: ResourceKind) -> bool {
        self.kinds.contains(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Permitted kinds in execution order
    pub fn iter(&self) -> impl Iterator<Item = ResourceKind> + '_ {
        self.kinds.iter().copied()
    }
}

impl Default for TargetResourceTypes {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_order_matches_all() {
        let orders: Vec<u8> = ResourceKind::ALL.iter().map(|k| k.execution_order()).collect();
        let mut sorted = orders.clone();
        sorted.sort();
        assert_eq!(orders, sorted, "ALL must be listed in execution order");
    }

    #[test]
    fn test_nested_stacks_after_independent_kinds() {
        for kind in [
            ResourceKind::S3Bucket,
            ResourceKind::IamRole,
            ResourceKind::EcrRepository,
            ResourceKind::BackupVault,
        ] {
            assert!(
                kind.execution_order() < ResourceKind::CloudFormationStack.execution_order(),
                "{kind} must be deleted before nested stacks"
            );
        }
    }

    #[test]
    fn test_classify_known_types() {
        for kind in ResourceKind::ALL {
            if kind == ResourceKind::Custom {
                continue;
            }
            assert_eq!(ResourceKind::classify(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn test_classify_custom_prefix() {
        assert_eq!(
            ResourceKind::classify("Custom::S3AutoDeleteObjects"),
            Some(ResourceKind::Custom)
        );
        assert_eq!(ResourceKind::classify("AWS::EC2::Instance"), None);
        assert_eq!(ResourceKind::classify("aws::s3::bucket"), None);
    }

    #[test]
    fn test_parse_list() {
        let targets = TargetResourceTypes::parse_list("AWS::S3::Bucket, AWS::IAM::Role,,").unwrap();
        assert!(targets.contains(ResourceKind::S3Bucket));
        assert!(targets.contains(ResourceKind::IamRole));
        assert!(!targets.contains(ResourceKind::BackupVault));
    }

    #[test]
    fn test_parse_list_rejects_unknown() {
        let err =
            TargetResourceTypes::parse_list("AWS::S3::Bucket,AWS::EC2::Instance").unwrap_err();
        assert_eq!(err, ParseResourceTypeError("AWS::EC2::Instance".to_string()));
    }

    #[test]
    fn test_wildcard_permits_any_custom_type() {
        let targets = TargetResourceTypes::parse_list("Custom::").unwrap();
        assert_eq!(targets.classify("Custom::Foo"), Some(ResourceKind::Custom));
        assert_eq!(targets.classify("Custom::Bar"), Some(ResourceKind::Custom));
        assert_eq!(targets.classify("AWS::S3::Bucket"), None);

        let targets = TargetResourceTypes::parse_list("Custom::Xxx").unwrap();
        assert_eq!(targets.classify("Custom::Foo"), Some(ResourceKind::Custom));
    }

    #[test]
    fn test_permits_exact_type_only() {
        let targets = TargetResourceTypes::from_kinds([ResourceKind::S3Bucket]);
        assert_eq!(targets.classify("AWS::S3::Bucket"), Some(ResourceKind::S3Bucket));
        assert_eq!(targets.classify("AWS::S3::BucketPolicy"), None);
        assert_eq!(targets.classify("Custom::Foo"), None);
    }

    #[test]
    fn test_all_permits_every_kind() {
        let targets = TargetResourceTypes::all();
        assert_eq!(targets.iter().collect::<Vec<_>>(), ResourceKind::ALL.to_vec());
    }
}
