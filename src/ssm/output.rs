//! Output shaping for the activity's `result`.
//!
//! Results go through a JSON round trip with `serde_json`'s
//! `arbitrary_precision` numbers, so a number keeps the exact text it was
//! written with. A version like `9007199254740993` never passes through `f64`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::errors::PluginError;

pub const RESULTS_KEY: &str = "results";

/// A retrieved value (`Text`) or the version returned by a store (`Version`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Text(String),
    Version(i64),
}

pub type ParameterResultMap = BTreeMap<String, ParameterValue>;

/// The `{"results": {...}}` wrapper handed back to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputEnvelope {
    pub results: Map<String, Value>,
}

impl OutputEnvelope {
    #[must_use]
    pub fn into_value(self) -> Value {
        let mut root = Map::new();
        root.insert(RESULTS_KEY.to_string(), Value::Object(self.results));
        Value::Object(root)
    }
}

/// # Errors
///
/// Returns an `OutputError` if the intermediate encoding fails.
pub fn shape(map: &ParameterResultMap) -> Result<OutputEnvelope, PluginError> {
    let encoded = serde_json::to_vec(map)?;
    let results: Map<String, Value> = serde_json::from_slice(&encoded)?;
    Ok(OutputEnvelope { results })
}
