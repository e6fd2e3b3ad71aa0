//! In-process source adapter
//!
//! Holds reminders, notes and documents in memory and records every call that
//! mutates the store. Used by the test suite and for dry runs without access
//! to the real reminder/note applications.

use crate::core::error::{BrainError, Result};
use crate::sources::adapter::{Note, Reminder, SourceAdapter};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// One recorded `upsert_document` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertCall {
    pub folder: String,
    pub title: String,
    pub markup: String,
}

#[derive(Default)]
struct MemoryState {
    reminders: Vec<Reminder>,
    notes: Vec<Note>,
    documents: BTreeMap<(String, String), String>,
    upserts: Vec<UpsertCall>,
    deletes: Vec<String>,
    offline: bool,
}

/// Source adapter backed by plain collections
#[derive(Default)]
pub struct MemorySourceAdapter {
    state: Mutex<MemoryState>,
}

impl MemorySourceAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_reminder(&self, reminder: Reminder) {
        self.state().reminders.push(reminder);
    }

    /// Insert a note, replacing any existing note with the same id
    pub fn put_note(&self, note: Note) {
        let mut state = self.state();
        match state.notes.iter_mut().find(|n| n.id == note.id) {
            Some(existing) => *existing = note,
            None => state.notes.push(note),
        }
    }

    /// Simulate the external store being unreachable
    pub fn set_offline(&self, offline: bool) {
        self.state().offline = offline;
    }

    pub fn upserts(&self) -> Vec<UpsertCall> {
        self.state().upserts.clone()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.state().deletes.clone()
    }

    pub fn document(&self, folder: &str, title: &str) -> Option<String> {
        self.state()
            .documents
            .get(&(folder.to_string(), title.to_string()))
            .cloned()
    }

    fn check_online(state: &MemoryState) -> Result<()> {
        if state.offline {
            Err(BrainError::Transport("source store unreachable".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SourceAdapter for MemorySourceAdapter {
    async fn list_reminders(&self) -> Result<Vec<Reminder>> {
        let state = self.state();
        Self::check_online(&state)?;
        Ok(state.reminders.clone())
    }

    async fn delete_reminder(&self, id: &str) -> Result<bool> {
        let mut state = self.state();
        Self::check_online(&state)?;
        state.deletes.push(id.to_string());
        let before = state.reminders.len();
        state.reminders.retain(|r| r.id != id);
        Ok(state.reminders.len() < before)
    }

    async fn list_notes(&self) -> Result<Vec<Note>> {
        let state = self.state();
        Self::check_online(&state)?;
        Ok(state.notes.clone())
    }

    async fn upsert_document(&self, folder: &str, title: &str, markup: &str) -> Result<bool> {
        let mut state = self.state();
        Self::check_online(&state)?;
        state.upserts.push(UpsertCall {
            folder: folder.to_string(),
            title: title.to_string(),
            markup: markup.to_string(),
        });
        state
            .documents
            .insert((folder.to_string(), title.to_string()), markup.to_string());
        Ok(true)
    }
}
