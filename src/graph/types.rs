//! Node and edge records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form JSON object attached to nodes and edges
pub type Properties = Map<String, Value>;

/// A typed node in the knowledge graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    /// Open vocabulary ("GroceryItem", "Recipe", ...); never changes after creation
    #[serde(rename = "type")]
    pub node_type: String,
    pub label: Option<String>,
    pub properties: Properties,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A typed, directed edge
///
/// `from_id` and `to_id` are not checked against the node table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    #[serde(rename = "type")]
    pub edge_type: String,
    pub from_id: String,
    pub to_id: String,
    pub properties: Properties,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
