use thiserror::Error;

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("Invalid plugin configuration: {0}")]
    ConfigError(String),

    #[error("Failed to open AWS session: {0}")]
    SessionError(String),

    #[error("Failed to interact with AWS services: {0}")]
    AwsError(String),

    #[error("Failed to subscribe to PubNub: {0}")]
    SubscribeError(String),

    #[error("Trigger handler failed: {0}")]
    HandlerError(String),

    #[error("Failed to prepare output: {0}")]
    OutputError(String),
}

impl From<serde_json::Error> for PluginError {
    fn from(error: serde_json::Error) -> Self {
        PluginError::OutputError(error.to_string())
    }
}
