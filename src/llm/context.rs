//! Gather graph context for reasoning prompts
//!
//! The reasoning backend sees a bounded slice of the graph: the most recently
//! updated nodes of the configured types. That is enough for it to reuse
//! existing item names and categories instead of inventing duplicates.

use crate::core::config::ContextConfig;
use crate::core::error::Result;
use crate::graph::store::GraphStore;
use crate::graph::types::Node;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Graph context attached to an envelope at call time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphContext {
    /// Recent nodes keyed by node type
    pub nodes_by_type: BTreeMap<String, Vec<Node>>,
}

impl GraphContext {
    /// Build a context from the store
    pub fn from_store(store: &GraphStore, config: &ContextConfig) -> Result<Self> {
        let nodes = store.find_nodes_by_type(&config.node_type, config.limit)?;
        let mut nodes_by_type = BTreeMap::new();
        nodes_by_type.insert(config.node_type.clone(), nodes);
        Ok(Self { nodes_by_type })
    }

    /// Create an empty context
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes_by_type.values().map(Vec::len).sum()
    }

    /// Labels of the context nodes of one type, most recent first
    pub fn labels(&self, node_type: &str) -> Vec<&str> {
        self.nodes_by_type
            .get(node_type)
            .map(|nodes| nodes.iter().filter_map(|n| n.label.as_deref()).collect())
            .unwrap_or_default()
    }
}
