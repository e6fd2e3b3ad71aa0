//! Knowledge graph: typed nodes, typed edges, property merge semantics

pub mod mutation;
pub mod store;
pub mod types;

pub use mutation::{EdgeDraft, GraphMutation, MutationSpec, NodeDraft, NodePatch};
pub use store::GraphStore;
pub use types::{Edge, Node, Properties};
