//! Instance state exchanged with the orchestrator
//!
//! Attributes are a flat JSON object: the (normalized) configuration the
//! instance was applied with, overlaid with the attributes observed by the
//! last read. Observed values win, so drift shows up as a difference
//! between the stored attributes and the next configuration.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::kind::ResourceKind;

/// Recorded state of one resource instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceState {
    /// Kind of the resource
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    /// Identifier assigned by the cloud
    pub id: String,
    /// Configuration and observed attributes
    pub attributes: Map<String, Value>,
}

impl InstanceState {
    /// Attribute by name
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// String attribute by name
    pub fn str_attribute(&self, name: &str) -> Option<&str> {
        self.attribute(name).and_then(Value::as_str)
    }
}

/// Overlay the fields of `top` onto `base`
///
/// Both values are expected to be JSON objects; anything else contributes
/// no fields.
pub(crate) fn overlay(base: &Value, top: &Value) -> Map<String, Value> {
    let mut merged = base.as_object().cloned().unwrap_or_default();
    if let Some(fields) = top.as_object() {
        for (key, value) in fields {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}
