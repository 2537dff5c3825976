//! Declarative plugin metadata, the document the engine reads to route
//! settings, inputs and outputs.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::context::type_name;
use crate::errors::PluginError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Boolean,
    Integer,
    Number,
    Object,
    Any,
}

impl FieldType {
    fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::Number => value.is_number(),
            FieldType::Object => value.is_object(),
            FieldType::Any => true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HandlerMetadata {
    #[serde(default)]
    pub settings: Vec<FieldDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginMetadata {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub version: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub settings: Vec<FieldDescriptor>,
    #[serde(default)]
    pub inputs: Vec<FieldDescriptor>,
    #[serde(default)]
    pub outputs: Vec<FieldDescriptor>,
    #[serde(default)]
    pub handler: Option<HandlerMetadata>,
}

impl PluginMetadata {
    /// # Errors
    ///
    /// Returns a `ConfigError` if the document is not valid metadata JSON.
    pub fn parse(document: &str) -> Result<Self, PluginError> {
        serde_json::from_str(document)
            .map_err(|e| PluginError::ConfigError(format!("metadata parse: {e}")))
    }

    #[must_use]
    pub fn input(&self, name: &str) -> Option<&FieldDescriptor> {
        self.inputs.iter().find(|f| f.name == name)
    }

    #[must_use]
    pub fn output(&self, name: &str) -> Option<&FieldDescriptor> {
        self.outputs.iter().find(|f| f.name == name)
    }

    /// Checks trigger-level settings against the declared descriptors.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` naming the first missing required setting or the
    /// first setting whose value does not match its declared type.
    pub fn require_settings(&self, config: &Map<String, Value>) -> Result<(), PluginError> {
        check_fields(&self.settings, config, "setting")
    }

    /// Same as [`Self::require_settings`] for per-handler settings.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` on the first invalid handler setting.
    pub fn require_handler_settings(
        &self,
        config: &Map<String, Value>,
    ) -> Result<(), PluginError> {
        let fields = self
            .handler
            .as_ref()
            .map(|h| h.settings.as_slice())
            .unwrap_or_default();
        check_fields(fields, config, "handler setting")
    }
}

fn check_fields(
    fields: &[FieldDescriptor],
    config: &Map<String, Value>,
    what: &str,
) -> Result<(), PluginError> {
    for field in fields {
        match config.get(&field.name) {
            None | Some(Value::Null) if field.required => {
                return Err(PluginError::ConfigError(format!(
                    "missing required {what} '{}'",
                    field.name
                )));
            }
            None | Some(Value::Null) => {}
            Some(value) if !field.field_type.accepts(value) => {
                return Err(PluginError::ConfigError(format!(
                    "{what} '{}' has type {}, expected {:?}",
                    field.name,
                    type_name(value),
                    field.field_type
                )));
            }
            Some(_) => {}
        }
    }
    Ok(())
}
