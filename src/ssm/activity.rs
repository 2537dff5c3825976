use serde_json::Value;
use tracing::{Instrument, debug, error, info, info_span, warn};

use super::output::{ParameterResultMap, ParameterValue, shape};
use super::request::{Action, ActionRequest, Credentials};
use super::store::{ParameterStore, PutParameter, SessionFactory};
use super::{OV_RESULT, UNKNOWN_ACTION_RESULT};
use crate::core::context::ActivityContext;
use crate::core::metadata::PluginMetadata;
use crate::errors::PluginError;

const ACTIVITY_METADATA: &str = include_str!("activity.json");

/// Parameter Store activity. Stateless between invocations: every `eval`
/// validates its inputs, opens its own session and drops it when done.
pub struct SsmActivity<F> {
    metadata: PluginMetadata,
    sessions: F,
}

impl<F: SessionFactory> SsmActivity<F> {
    /// # Errors
    ///
    /// Returns a `ConfigError` if the embedded metadata document is invalid.
    pub fn new(sessions: F) -> Result<Self, PluginError> {
        Ok(Self {
            metadata: PluginMetadata::parse(ACTIVITY_METADATA)?,
            sessions,
        })
    }

    #[must_use]
    pub fn metadata(&self) -> &PluginMetadata {
        &self.metadata
    }

    /// Runs one invocation and writes the `result` output.
    ///
    /// Returns `Ok(true)` when the activity is done. An unrecognized action is
    /// not an error: `result` is set to `"NOK"` and no session is opened.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for invalid inputs, a `SessionError` if the
    /// session cannot be opened, an `AwsError` for the first failing remote
    /// call and an `OutputError` if the result cannot be shaped. Nothing is
    /// written to `result` on failure.
    pub async fn eval(&self, ctx: &mut dyn ActivityContext) -> Result<bool, PluginError> {
        let request = ActionRequest::from_context(ctx).map_err(|e| {
            error!("Invalid activity inputs: {}", e);
            e
        })?;

        let span = info_span!("ssm_activity", action = %request.action.kind());
        async move {
            if let Action::Unknown(action) = &request.action {
                warn!("Unknown action '{}', returning {}", action, UNKNOWN_ACTION_RESULT);
                ctx.set_output(OV_RESULT, Value::String(UNKNOWN_ACTION_RESULT.to_string()));
                return Ok(true);
            }

            let map = self.perform(&request.credentials, &request.action).await?;
            let envelope = shape(&map).map_err(|e| {
                error!("Error while preparing activity output: {}", e);
                e
            })?;

            info!("Action completed with {} parameter(s)", map.len());
            ctx.set_output(OV_RESULT, envelope.into_value());
            Ok(true)
        }
        .instrument(span)
        .await
    }

    async fn perform(
        &self,
        credentials: &Credentials,
        action: &Action,
    ) -> Result<ParameterResultMap, PluginError> {
        let store = self.sessions.open(credentials).await.map_err(|e| {
            error!("Error while opening SSM session: {}", e);
            e
        })?;

        let mut results = ParameterResultMap::new();
        match action {
            Action::Store {
                name,
                value,
                parameter_type,
                overwrite,
            } => {
                let request = PutParameter {
                    name,
                    value,
                    parameter_type,
                    overwrite: *overwrite,
                };
                let version = store.put_parameter(&request).await.map_err(|e| {
                    error!(parameter = %name, "Error while storing parameter in SSM: {}", e);
                    e
                })?;
                results.insert(name.clone(), ParameterValue::Version(version));
            }
            Action::Retrieve { name, decrypt } => {
                let value = fetch(store.as_ref(), name, *decrypt).await?;
                results.insert(name.clone(), ParameterValue::Text(value));
            }
            Action::RetrieveList { names, decrypt } => {
                // One lookup at a time, in order; the first failure ends the
                // invocation and discards whatever was already fetched.
                for name in names {
                    let value = fetch(store.as_ref(), name, *decrypt).await?;
                    results.insert(name.clone(), ParameterValue::Text(value));
                }
            }
            // eval answers unknown actions before a session is opened
            Action::Unknown(_) => {}
        }

        Ok(results)
    }
}

async fn fetch(store: &dyn ParameterStore, name: &str, decrypt: bool) -> Result<String, PluginError> {
    debug!(parameter = %name, decrypt, "get_parameter");
    store.get_parameter(name, decrypt).await.map_err(|e| {
        error!(parameter = %name, "Error while retrieving parameter from SSM: {}", e);
        e
    })
}
