//! Graph mutations emitted by the reasoning backend
//!
//! On the wire every mutation is `{"op_type": ..., "payload": {...}}`. The raw
//! shape is kept as [`MutationSpec`] so that one malformed or unrecognized
//! entry can be rejected on its own, without failing the whole response.

use crate::core::error::{BrainError, Result};
use crate::graph::types::Properties;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Untyped wire form of a single mutation
///
/// Decoding never fails: an entry that is not an object, or whose `op_type`
/// is missing or not a string, still becomes a spec and is rejected later by
/// [`GraphMutation::from_spec`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MutationSpec {
    pub op_type: String,
    pub payload: Value,
}

impl MutationSpec {
    pub fn from_wire(value: Value) -> Self {
        let (op_type, payload) = split_wire_entry(value, "op_type", "payload");
        Self { op_type, payload }
    }
}

impl<'de> Deserialize<'de> for MutationSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(Self::from_wire(Value::deserialize(deserializer)?))
    }
}

/// Split a `{tag: ..., body: ...}` wire entry into a tag string and a body
///
/// A non-string tag is stringified (`42` -> `"42"`), a missing or null tag is
/// empty. Anything other than an object keeps an empty tag and becomes the body.
pub(crate) fn split_wire_entry(value: Value, tag: &str, body: &str) -> (String, Value) {
    match value {
        Value::Object(mut map) => {
            let tag = match map.remove(tag) {
                Some(Value::String(s)) => s,
                None | Some(Value::Null) => String::new(),
                Some(other) => other.to_string(),
            };
            (tag, map.remove(body).unwrap_or(Value::Null))
        }
        other => (String::new(), other),
    }
}

/// Decoded mutation, applied through `GraphStore::apply_mutation`
#[derive(Debug, Clone, PartialEq)]
pub enum GraphMutation {
    CreateNode(NodeDraft),
    UpdateNode(NodePatch),
    CreateEdge(EdgeDraft),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePatch {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,
    /// Shallow-merge into existing properties instead of replacing them.
    /// Absent means merge; an explicit `null` means replace.
    #[serde(default = "default_merge", deserialize_with = "null_as_replace")]
    pub merge: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub edge_type: String,
    #[serde(default)]
    pub from_id: String,
    #[serde(default)]
    pub to_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,
}

fn default_merge() -> bool {
    true
}

fn null_as_replace<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

impl NodePatch {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
            properties: None,
            merge: true,
        }
    }
}

impl GraphMutation {
    /// Decode a wire mutation
    ///
    /// An empty or unrecognized `op_type` is `UnknownOperation`; a payload
    /// that does not fit the variant is `Validation`.
    pub fn from_spec(spec: &MutationSpec) -> Result<Self> {
        match spec.op_type.as_str() {
            "create_node" => Ok(Self::CreateNode(decode_payload(spec)?)),
            "update_node" => Ok(Self::UpdateNode(decode_payload(spec)?)),
            "create_edge" => Ok(Self::CreateEdge(decode_payload(spec)?)),
            other => Err(BrainError::UnknownOperation(format!(
                "graph update op_type '{}'",
                other
            ))),
        }
    }

    /// Wire form of this mutation
    pub fn to_spec(&self) -> Result<MutationSpec> {
        let payload = match self {
            Self::CreateNode(draft) => serde_json::to_value(draft)?,
            Self::UpdateNode(patch) => serde_json::to_value(patch)?,
            Self::CreateEdge(draft) => serde_json::to_value(draft)?,
        };
        Ok(MutationSpec {
            op_type: self.op_type().to_string(),
            payload,
        })
    }

    pub fn op_type(&self) -> &'static str {
        match self {
            Self::CreateNode(_) => "create_node",
            Self::UpdateNode(_) => "update_node",
            Self::CreateEdge(_) => "create_edge",
        }
    }
}

fn decode_payload<T: DeserializeOwned>(spec: &MutationSpec) -> Result<T> {
    let payload = match &spec.payload {
        Value::Null => Value::Object(Map::new()),
        other => other.clone(),
    };
    serde_json::from_value(payload).map_err(|e| {
        BrainError::Validation(format!("invalid {} payload: {}", spec.op_type, e))
    })
}
