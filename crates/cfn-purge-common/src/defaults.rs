//! Default configuration values shared between the library and the CLI

use std::time::Duration;

/// Default ceiling for concurrent deletions inside one operator
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Delay between attempts when detaching IAM policies or deleting roles
pub const DEFAULT_IAM_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Number of attempts for each IAM detach/delete call
pub const DEFAULT_IAM_RETRY_ATTEMPTS: usize = 10;

/// Maximum list-and-delete passes before a bucket is reported as not emptying
pub const DEFAULT_MAX_BUCKET_PASSES: u32 = 10;

/// Maximum number of keys accepted by a single S3 DeleteObjects call
pub const S3_DELETE_BATCH_SIZE: usize = 1000;

/// How long to wait for a stack to reach a terminal deletion state
pub const DEFAULT_STACK_WAIT_TIMEOUT: Duration = Duration::from_secs(60 * 60);
