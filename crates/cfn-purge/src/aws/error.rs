//! AWS error classification and handling
//!
//! Provides typed errors for AWS SDK operations using the error code from
//! `ProvideErrorMetadata` instead of string matching on Debug output.

use aws_sdk_cloudformation::error::{DisplayErrorContext, ProvideErrorMetadata};
use thiserror::Error;

/// AWS error categories for existence checks and retry logic
#[derive(Debug, Error)]
pub enum AwsError {
    /// Resource was not found (already deleted)
    #[error("Resource not found ({code}): {message}")]
    NotFound { code: String, message: String },

    /// Rate limit exceeded (retryable)
    #[error("Rate limit exceeded ({code}): {message}")]
    Throttled { code: String, message: String },

    /// Resource is still referenced or in a conflicting state (retryable)
    #[error("Resource conflict ({code}): {message}")]
    Conflict { code: String, message: String },

    /// Generic AWS SDK error with code and message
    #[error("{code}: {message}")]
    Sdk { code: String, message: String },
}

impl AwsError {
    /// Classify any SDK error (service or transport) by its metadata.
    pub fn from_sdk<E>(err: &E) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error,
    {
        let message = match err.message() {
            Some(m) => m.to_string(),
            None => DisplayErrorContext(err).to_string(),
        };
        classify_aws_error(err.code(), Some(&message))
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, AwsError::NotFound { .. })
    }

    /// Check if this is a retryable error
    pub fn is_retryable(&self) -> bool {
        matches!(self, AwsError::Throttled { .. } | AwsError::Conflict { .. })
    }
}

/// Known AWS error codes for "not found" conditions
const NOT_FOUND_CODES: &[&str] = &[
    "NotFound",
    "NoSuchBucket",
    "NoSuchEntity",
    "RepositoryNotFoundException",
    "ResourceNotFoundException",
];

/// Known AWS error codes for throttling/rate limiting
const THROTTLING_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "RequestLimitExceeded",
    "SlowDown",
    "TooManyRequestsException",
];

/// Known AWS error codes for resources still in use
const CONFLICT_CODES: &[&str] = &[
    "DeleteConflict",
    "ConcurrentModification",
    "InvalidRequestException",
    "BucketNotEmpty",
];

/// Classify an AWS SDK error using the error code.
pub fn classify_aws_error(code: Option<&str>, message: Option<&str>) -> AwsError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        Some(c) if NOT_FOUND_CODES.contains(&c) => AwsError::NotFound {
            code: c.to_string(),
            message,
        },
        // CloudFormation reports missing stacks as a validation error
        Some("ValidationError") if message.contains("does not exist") => AwsError::NotFound {
            code: "ValidationError".to_string(),
            message,
        },
        Some(c) if THROTTLING_CODES.contains(&c) => AwsError::Throttled {
            code: c.to_string(),
            message,
        },
        Some(c) if CONFLICT_CODES.contains(&c) => AwsError::Conflict {
            code: c.to_string(),
            message,
        },
        _ => AwsError::Sdk {
            code: code.unwrap_or("Unknown").to_string(),
            message,
        },
    }
}

/// Find the first [`AwsError`] in an anyhow error chain.
pub fn classify_anyhow_error(error: &anyhow::Error) -> Option<&AwsError> {
    error.chain().find_map(|cause| cause.downcast_ref::<AwsError>())
}

/// Whether an anyhow error was caused by a missing resource
pub fn is_not_found(error: &anyhow::Error) -> bool {
    classify_anyhow_error(error).is_some_and(AwsError::is_not_found)
}

/// Whether a failed call is worth repeating.
///
/// Throttling and conflicts are retried, as are errors without an AWS
/// error code (transport failures). Other classified errors are final.
pub fn should_retry(error: &anyhow::Error) -> bool {
    classify_anyhow_error(error).is_none_or(AwsError::is_retryable)
}
