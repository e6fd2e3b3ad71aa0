//! Action execution pipeline
//!
//! Wire actions are decoded one at a time and executed in order:
//! ActionSpec -> Action -> renderer / source adapter -> ActionReport

pub mod action;
pub mod executor;

pub use action::{Action, ActionSpec, DeleteSourceItem, UpdateArtifact};
pub use executor::{ActionExecutor, ActionFailure, ActionReport};
