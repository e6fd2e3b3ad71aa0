//! Side-effecting actions requested by the reasoning backend
//!
//! Wire form: `{"action_type": ..., "arguments": {...}}`. Decoding happens per
//! action so one unrecognized entry only fails itself.

use crate::core::error::{BrainError, Result};
use crate::graph::mutation::split_wire_entry;
use crate::render::CategorizedLayout;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Untyped wire form of a single action
///
/// Any JSON value decodes; a bare string or a null/non-string `action_type`
/// surfaces as an unknown action when executed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActionSpec {
    pub action_type: String,
    pub arguments: Value,
}

impl ActionSpec {
    pub fn new(action_type: impl Into<String>, arguments: Value) -> Self {
        Self {
            action_type: action_type.into(),
            arguments,
        }
    }

    pub fn from_wire(value: Value) -> Self {
        let (action_type, arguments) = split_wire_entry(value, "action_type", "arguments");
        Self {
            action_type,
            arguments,
        }
    }
}

impl<'de> Deserialize<'de> for ActionSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(Self::from_wire(Value::deserialize(deserializer)?))
    }
}

/// Decoded action
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Re-render the consolidated checklist and upsert it by title
    UpdateArtifact(UpdateArtifact),
    /// Remove a consumed source item (a reminder)
    DeleteSourceItem(DeleteSourceItem),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateArtifact {
    /// Falls back to the configured artifact folder
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_folder: Option<String>,
    /// Falls back to the configured artifact title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_title: Option<String>,
    #[serde(default)]
    pub layout: CategorizedLayout,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteSourceItem {
    /// Checked for presence by the executor, not by decoding
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
}

impl Action {
    pub fn from_spec(spec: &ActionSpec) -> Result<Self> {
        match spec.action_type.as_str() {
            "update_apple_note" | "update_artifact" => {
                Ok(Self::UpdateArtifact(decode_arguments(spec)?))
            }
            "delete_reminder" | "delete_source_item" => {
                Ok(Self::DeleteSourceItem(decode_arguments(spec)?))
            }
            other => Err(BrainError::UnknownOperation(format!(
                "action_type '{}'",
                other
            ))),
        }
    }

    /// Canonical wire tag
    pub fn action_type(&self) -> &'static str {
        match self {
            Self::UpdateArtifact(_) => "update_apple_note",
            Self::DeleteSourceItem(_) => "delete_reminder",
        }
    }

    pub fn to_spec(&self) -> Result<ActionSpec> {
        let arguments = match self {
            Self::UpdateArtifact(update) => serde_json::to_value(update)?,
            Self::DeleteSourceItem(delete) => serde_json::to_value(delete)?,
        };
        Ok(ActionSpec::new(self.action_type(), arguments))
    }

    pub fn delete(source_id: impl Into<String>) -> Self {
        Self::DeleteSourceItem(DeleteSourceItem {
            source_id: Some(source_id.into()),
        })
    }
}

fn decode_arguments<T: DeserializeOwned>(spec: &ActionSpec) -> Result<T> {
    let arguments = match &spec.arguments {
        Value::Null => Value::Object(Map::new()),
        other => other.clone(),
    };
    serde_json::from_value(arguments).map_err(|e| {
        BrainError::Validation(format!("invalid {} arguments: {}", spec.action_type, e))
    })
}
