use std::fmt;

use super::{
    IV_ACTION, IV_AWS_ACCESS_KEY_ID, IV_AWS_REGION, IV_AWS_SECRET_ACCESS_KEY,
    IV_DECRYPT_PARAMETER, IV_OVERWRITE_EXISTING_PARAMETER, IV_PARAMETER_NAME, IV_PARAMETER_TYPE,
    IV_PARAMETER_VALUE,
};
use crate::core::context::{ActivityContext, input_bool, input_str};
use crate::errors::PluginError;

/// Static AWS credentials supplied with each invocation.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("region", &self.region)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Store {
        name: String,
        value: String,
        parameter_type: String,
        overwrite: bool,
    },
    Retrieve {
        name: String,
        decrypt: bool,
    },
    RetrieveList {
        names: Vec<String>,
        decrypt: bool,
    },
    Unknown(String),
}

impl Action {
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Action::Store { .. } => "store",
            Action::Retrieve { .. } => "retrieve",
            Action::RetrieveList { .. } => "retrieveList",
            Action::Unknown(other) => other,
        }
    }
}

/// Every input the activity needs, validated once at invocation entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest {
    pub credentials: Credentials,
    pub action: Action,
}

impl ActionRequest {
    /// # Errors
    ///
    /// Returns a `ConfigError` for the first missing or mistyped input.
    pub fn from_context(ctx: &dyn ActivityContext) -> Result<Self, PluginError> {
        let action = input_str(ctx, IV_ACTION)?;
        let credentials = Credentials {
            access_key_id: input_str(ctx, IV_AWS_ACCESS_KEY_ID)?,
            secret_access_key: input_str(ctx, IV_AWS_SECRET_ACCESS_KEY)?,
            region: input_str(ctx, IV_AWS_REGION)?,
        };

        let action = match action.as_str() {
            "store" => Action::Store {
                name: input_str(ctx, IV_PARAMETER_NAME)?,
                overwrite: input_bool(ctx, IV_OVERWRITE_EXISTING_PARAMETER)?,
                parameter_type: input_str(ctx, IV_PARAMETER_TYPE)?,
                value: input_str(ctx, IV_PARAMETER_VALUE)?,
            },
            "retrieve" => Action::Retrieve {
                name: input_str(ctx, IV_PARAMETER_NAME)?,
                decrypt: input_bool(ctx, IV_DECRYPT_PARAMETER)?,
            },
            "retrieveList" => Action::RetrieveList {
                names: split_names(&input_str(ctx, IV_PARAMETER_NAME)?),
                decrypt: input_bool(ctx, IV_DECRYPT_PARAMETER)?,
            },
            _ => Action::Unknown(action),
        };

        Ok(Self {
            credentials,
            action,
        })
    }
}

// Names are taken verbatim: no trimming, empty segments kept.
fn split_names(names: &str) -> Vec<String> {
    names.split(',').map(str::to_string).collect()
}
