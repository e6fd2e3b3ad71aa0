//! Process-scoped dedup bookkeeping
//!
//! Reminder ids are remembered forever once acted on, even if the reminder is
//! later edited or reopened. Notes are keyed by a content fingerprint and are
//! reconsidered whenever it changes.
//!
//! Nothing here is persisted: a restart forgets everything, and every open
//! reminder and interesting note is processed once more.

use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct DedupState {
    reminders: HashSet<String>,
    notes: HashMap<String, String>,
    counters: Arc<DedupCounters>,
}

/// Sizes of the dedup collections, readable without the pipeline lock
#[derive(Debug, Default)]
pub struct DedupCounters {
    reminders: AtomicUsize,
    notes: AtomicUsize,
}

impl DedupCounters {
    pub fn reminders_processed(&self) -> usize {
        self.reminders.load(Ordering::Relaxed)
    }

    pub fn notes_processed(&self) -> usize {
        self.notes.load(Ordering::Relaxed)
    }
}

impl DedupState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reminder_seen(&self, id: &str) -> bool {
        self.reminders.contains(id)
    }

    pub fn mark_reminder(&mut self, id: impl Into<String>) {
        self.reminders.insert(id.into());
        self.counters
            .reminders
            .store(self.reminders.len(), Ordering::Relaxed);
    }

    /// True when the note is new or its content changed since it was marked
    pub fn note_changed(&self, id: &str, fingerprint: &str) -> bool {
        self.notes.get(id).map(String::as_str) != Some(fingerprint)
    }

    pub fn mark_note(&mut self, id: impl Into<String>, fingerprint: impl Into<String>) {
        self.notes.insert(id.into(), fingerprint.into());
        self.counters.notes.store(self.notes.len(), Ordering::Relaxed);
    }

    /// Shared handle to the live counters
    pub fn counters(&self) -> Arc<DedupCounters> {
        self.counters.clone()
    }

    pub fn reminders_processed(&self) -> usize {
        self.reminders.len()
    }

    pub fn notes_processed(&self) -> usize {
        self.notes.len()
    }
}

/// Hex SHA-256 of the note content
pub fn fingerprint(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Cheap prefilter deciding whether a note is worth a reasoning call
///
/// Looks for list markers or the word "ingredient". Not a correctness gate.
pub fn looks_interesting(content: &str) -> bool {
    content.to_lowercase().contains("ingredient")
        || content.contains(&['\u{2022}', '-', '*'][..])
}
