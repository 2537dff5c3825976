use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::errors::PluginError;

/// Engine invocation context as seen by an activity.
pub trait ActivityContext: Send {
    fn get_input(&self, name: &str) -> Option<&Value>;
    fn set_output(&mut self, name: &str, value: Value);
}

/// # Errors
///
/// Returns a `ConfigError` if the input is missing or not a string.
pub fn input_str(ctx: &dyn ActivityContext, name: &str) -> Result<String, PluginError> {
    match ctx.get_input(name) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(PluginError::ConfigError(format!(
            "input '{name}' must be a string, got {}",
            type_name(other)
        ))),
        None => Err(PluginError::ConfigError(format!(
            "missing required input '{name}'"
        ))),
    }
}

/// # Errors
///
/// Returns a `ConfigError` if the input is missing or not a boolean.
pub fn input_bool(ctx: &dyn ActivityContext, name: &str) -> Result<bool, PluginError> {
    match ctx.get_input(name) {
        Some(Value::Bool(b)) => Ok(*b),
        Some(other) => Err(PluginError::ConfigError(format!(
            "input '{name}' must be a boolean, got {}",
            type_name(other)
        ))),
        None => Err(PluginError::ConfigError(format!(
            "missing required input '{name}'"
        ))),
    }
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Map-backed context used by the Lambda host and by tests.
#[derive(Debug, Default, Clone)]
pub struct InvocationContext {
    inputs: HashMap<String, Value>,
    outputs: HashMap<String, Value>,
}

impl InvocationContext {
    #[must_use]
    pub fn new(inputs: HashMap<String, Value>) -> Self {
        Self {
            inputs,
            outputs: HashMap::new(),
        }
    }

    /// Builds a context from a JSON object of inputs.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if `value` is not a JSON object.
    pub fn from_value(value: Value) -> Result<Self, PluginError> {
        match value {
            Value::Object(map) => Ok(Self::new(map.into_iter().collect())),
            other => Err(PluginError::ConfigError(format!(
                "activity inputs must be an object, got {}",
                type_name(&other)
            ))),
        }
    }

    #[must_use]
    pub fn output(&self, name: &str) -> Option<&Value> {
        self.outputs.get(name)
    }

    #[must_use]
    pub fn outputs_to_value(&self) -> Value {
        let map: Map<String, Value> = self
            .outputs
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Value::Object(map)
    }
}

impl ActivityContext for InvocationContext {
    fn get_input(&self, name: &str) -> Option<&Value> {
        self.inputs.get(name)
    }

    fn set_output(&mut self, name: &str, value: Value) {
        self.outputs.insert(name.to_string(), value);
    }
}
