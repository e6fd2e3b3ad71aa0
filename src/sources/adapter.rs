//! Source adapter boundary
//!
//! The capture pipeline only sees reminders and notes through this trait.
//! Implementations bound their own calls with a timeout and report a hung or
//! failed call as `BrainError::Transport`.

use crate::core::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A task-list entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub list_name: String,
}

/// A free-text note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub folder_name: String,
    #[serde(default)]
    pub modified_at: String,
}

impl Reminder {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            body: String::new(),
            completed: false,
            list_name: String::new(),
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }
}

impl Note {
    pub fn new(id: impl Into<String>, name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            body: body.into(),
            folder_name: String::new(),
            modified_at: String::new(),
        }
    }
}

/// Capabilities consumed from the external reminder/note store
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn list_reminders(&self) -> Result<Vec<Reminder>>;

    /// `Ok(false)` when the store reports the reminder could not be deleted
    async fn delete_reminder(&self, id: &str) -> Result<bool>;

    async fn list_notes(&self) -> Result<Vec<Note>>;

    /// Create the folder if needed, then update the note titled `title`
    /// in it or create one
    async fn upsert_document(&self, folder: &str, title: &str, markup: &str) -> Result<bool>;
}
