//! Second Brain - capture pipeline for a personal knowledge graph
//!
//! Polls reminders and notes, asks a reasoning backend what they mean, records
//! the answer as graph facts and keeps a consolidated checklist up to date.

pub mod actions;
pub mod core;
pub mod graph;
pub mod llm;
pub mod pipeline;
pub mod render;
pub mod server;
pub mod sources;
