//! Shared test utilities for cfn-purge
//!
//! ## Modules
//!
//! - [`aws`]: AWS region detection and unique test resource names
//! - [`fixtures`]: Builders for stack resource summaries
//! - [`probe`]: Concurrency probe recording peak in-flight work

pub mod aws;
pub mod fixtures;
pub mod probe;

// Re-export commonly used items
pub use aws::{get_test_region, test_bucket_name, test_run_id};
pub use fixtures::{delete_failed, summary};
pub use probe::ConcurrencyProbe;
