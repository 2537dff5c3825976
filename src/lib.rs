/// Workflow-engine plugins for AWS Systems Manager and PubNub.
///
/// This crate provides two configuration-driven adapters hosted by a workflow engine:
/// 1. An activity that stores and retrieves parameters in AWS SSM Parameter Store
/// 2. A trigger that subscribes to PubNub channels and forwards messages to handlers
///
/// # Architecture
///
/// The system uses:
/// - aws-sdk-ssm for Parameter Store calls, with a fresh session per invocation
/// - serde_json with `arbitrary_precision` so numeric output keeps its exact text
/// - async-trait seams for the parameter store and the subscription client
/// - Tokio for async runtime
///
/// # Example
///
/// ```no_run
/// use flowplugins::core::context::InvocationContext;
/// use flowplugins::ssm::{AwsSessionFactory, SsmActivity};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     flowplugins::setup_logging();
///
///     let mut context = InvocationContext::from_value(serde_json::json!({
///         "action": "retrieve",
///         "awsAccessKeyID": "AKIA...",
///         "awsSecretAccessKey": "secret",
///         "awsRegion": "us-east-1",
///         "parameterName": "/app/db/host",
///         "decryptParameter": true
///     }))?;
///
///     let activity = SsmActivity::new(AwsSessionFactory)?;
///     activity.eval(&mut context).await?;
///     println!("{}", context.output("result").cloned().unwrap_or_default());
///     Ok(())
/// }
/// ```
pub mod core;
pub mod errors;
pub mod pubnub;
pub mod ssm;

pub use errors::PluginError;

/// Configure structured logging with JSON format.
///
/// Honors `RUST_LOG` and falls back to `info`. Safe to call more than once; only
/// the first call installs the subscriber.
///
/// # Example
///
/// ```
/// flowplugins::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
