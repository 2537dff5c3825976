// Lambda host for the Parameter Store activity: the event payload is the
// activity's input object and the response is its output object.

use flowplugins::core::context::InvocationContext;
use flowplugins::ssm::{AwsSessionFactory, SsmActivity};
use lambda_runtime::{Error, LambdaEvent, run, service_fn};
use serde_json::Value;
use tracing::{error, info};

async fn function_handler(event: LambdaEvent<Value>) -> Result<Value, Error> {
    info!("Activity invoked, request id {}", event.context.request_id);

    let mut context = InvocationContext::from_value(event.payload).map_err(|e| {
        error!("Invalid event payload: {}", e);
        Error::from(e.to_string())
    })?;

    let activity = SsmActivity::new(AwsSessionFactory)?;
    activity.eval(&mut context).await?;

    Ok(context.outputs_to_value())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    flowplugins::setup_logging();
    run(service_fn(function_handler)).await
}
