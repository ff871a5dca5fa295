//! cfn-purge: force-delete CloudFormation stacks stuck in DELETE_FAILED
//!
//! Deletes each stack normally first; if that fails, clears the blocking
//! state of its DELETE_FAILED resources and deletes it again.

use anyhow::{Context, Result};
use cfn_purge::aws::AwsContext;
use cfn_purge::config::{AwsSettings, PurgeConfig};
use cfn_purge::operation::report::{supported_types_json, supported_types_table};
use cfn_purge::operation::{AwsClients, OperatorFactory, OperatorSettings, StackPurger};
use cfn_purge::wait::WaitConfig;
use cfn_purge_common::defaults::{
    DEFAULT_CONCURRENCY, DEFAULT_IAM_RETRY_ATTEMPTS, DEFAULT_IAM_RETRY_DELAY,
    DEFAULT_MAX_BUCKET_PASSES, DEFAULT_STACK_WAIT_TIMEOUT,
};
use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::ContentArrangement;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "cfn-purge")]
#[command(about = "Force-delete CloudFormation stacks stuck in DELETE_FAILED")]
#[command(version)]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Arguments for the delete command (extracted to reduce enum size)
#[derive(clap::Args, Debug)]
struct DeleteArgs {
    /// Stack name or ID to delete (repeatable, processed in order)
    #[arg(short, long = "stack-name", required = true)]
    stack_names: Vec<String>,

    /// AWS region (default: from the AWS config chain)
    #[arg(short, long)]
    region: Option<String>,

    /// AWS profile to use (overrides AWS_PROFILE env var)
    #[arg(short, long)]
    profile: Option<String>,

    /// Comma-separated resource types to force-delete (default: all supported)
    #[arg(short = 't', long)]
    resource_types: Option<String>,

    /// Maximum concurrent deletions per resource type
    #[arg(long, env = "CFN_PURGE_CONCURRENCY", default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Seconds between IAM detach/delete retries
    #[arg(long, default_value_t = DEFAULT_IAM_RETRY_DELAY.as_secs())]
    iam_retry_delay: u64,

    /// Maximum list-and-delete passes when emptying a bucket
    #[arg(long, default_value_t = DEFAULT_MAX_BUCKET_PASSES)]
    max_bucket_passes: u32,

    /// Seconds to wait for each stack deletion to finish
    #[arg(long, default_value_t = DEFAULT_STACK_WAIT_TIMEOUT.as_secs())]
    stack_wait_timeout: u64,
}

impl TryFrom<DeleteArgs> for PurgeConfig {
    type Error = cfn_purge::config::ConfigError;

    fn try_from(args: DeleteArgs) -> Result<Self, Self::Error> {
        let config = Self {
            targets: PurgeConfig::parse_targets(args.resource_types.as_deref())?,
            stacks: args.stack_names,
            aws: AwsSettings {
                region: args.region,
                profile: args.profile,
            },
            operators: OperatorSettings {
                concurrency: args.concurrency,
                iam_retry_delay: Duration::from_secs(args.iam_retry_delay),
                iam_retry_attempts: DEFAULT_IAM_RETRY_ATTEMPTS,
                max_bucket_passes: args.max_bucket_passes,
            },
            stack_wait: WaitConfig {
                timeout: Duration::from_secs(args.stack_wait_timeout),
                ..Default::default()
            },
        };
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Delete stacks, force-deleting resources that block deletion
    Delete(Box<DeleteArgs>),

    /// List the resource types that can be force-deleted
    Types {
        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();

    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        // Reduce noise from AWS SDK (show only warnings and errors)
        tracing_subscriber::EnvFilter::new(format!(
            "{level},aws_config=warn,aws_sdk=warn,aws_smithy=warn,hyper=warn"
        ))
    });

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    match args.command {
        Command::Delete(delete_args) => {
            let config = PurgeConfig::try_from(*delete_args)?;
            handle_delete(config).await
        }
        Command::Types { format } => handle_types(format),
    }
}

/// Handle the delete command
async fn handle_delete(config: PurgeConfig) -> Result<()> {
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping after the current step");
            signal_token.cancel();
        }
    });

    let aws = AwsContext::load(config.aws.region.as_deref(), config.aws.profile.as_deref()).await;
    info!(
        region = ?aws.region(),
        stacks = ?config.stacks,
        resource_types = ?config.targets.iter().map(|k| k.as_str()).collect::<Vec<_>>(),
        concurrency = config.operators.concurrency,
        "Starting stack deletion"
    );

    let clients = AwsClients::new(&aws, config.stack_wait.clone(), cancel);
    let purger = StackPurger::new(
        OperatorFactory::new(clients, config.operators.clone()),
        config.targets.clone(),
    );

    for stack in &config.stacks {
        purger
            .purge(stack)
            .await
            .with_context(|| format!("Failed to delete stack {stack}"))?;
        info!(stack = %stack, "Stack deletion completed");
    }

    Ok(())
}

/// Handle the types command
fn handle_types(format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => {
            println!("{}", supported_types_table(ContentArrangement::Dynamic));
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&supported_types_json())?);
        }
    }
    Ok(())
}
