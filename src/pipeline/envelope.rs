//! Capture envelopes
//!
//! An envelope describes one captured piece of text and where it came from.
//! It lives for a single pipeline pass and is persisted only as part of the
//! interaction log record.

use crate::core::config::BrainConfig;
use crate::sources::{Note, Reminder};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Where a capture came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Channel {
    #[serde(rename = "reminder")]
    Reminder,
    #[serde(rename = "apple_note")]
    Note,
    #[serde(rename = "url_text")]
    Url,
    #[serde(rename = "chat")]
    Chat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeHint {
    Capture,
    Query,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub user_id: String,
    /// RFC 3339, UTC
    pub timestamp: String,
    pub timezone: String,
    pub channel: Channel,
    pub mode_hint: ModeHint,
    pub user_text: String,
    pub source_id: String,
}

/// Per-process values stamped on every envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeDefaults {
    pub user_id: String,
    pub timezone: String,
}

impl Default for EnvelopeDefaults {
    fn default() -> Self {
        let config = BrainConfig::default();
        Self::from_config(&config)
    }
}

impl EnvelopeDefaults {
    pub fn from_config(config: &BrainConfig) -> Self {
        Self {
            user_id: config.user_id.clone(),
            timezone: config.timezone.clone(),
        }
    }
}

impl Envelope {
    /// Capture-mode envelope stamped with the current time
    pub fn capture(
        defaults: &EnvelopeDefaults,
        channel: Channel,
        user_text: impl Into<String>,
        source_id: impl Into<String>,
    ) -> Self {
        Self {
            user_id: defaults.user_id.clone(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            timezone: defaults.timezone.clone(),
            channel,
            mode_hint: ModeHint::Capture,
            user_text: user_text.into(),
            source_id: source_id.into(),
        }
    }

    pub fn for_reminder(defaults: &EnvelopeDefaults, reminder: &Reminder) -> Self {
        Self::capture(
            defaults,
            Channel::Reminder,
            reminder_text(reminder),
            reminder.id.clone(),
        )
    }

    pub fn for_note(defaults: &EnvelopeDefaults, note: &Note) -> Self {
        Self::capture(defaults, Channel::Note, note_text(note), note.id.clone())
    }
}

/// `"{name}. {body}"`, or just the name when the body is blank
pub fn reminder_text(reminder: &Reminder) -> String {
    if reminder.body.trim().is_empty() {
        reminder.name.clone()
    } else {
        format!("{}. {}", reminder.name, reminder.body)
    }
}

/// `"{name}\n{body}"`; also the input of the note fingerprint
pub fn note_text(note: &Note) -> String {
    format!("{}\n{}", note.name, note.body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reminder_envelope() {
        let reminder = Reminder::new("R1", "Buy pasta, rice");
        let envelope = Envelope::for_reminder(&EnvelopeDefaults::default(), &reminder);

        assert_eq!(envelope.channel, Channel::Reminder);
        assert_eq!(envelope.mode_hint, ModeHint::Capture);
        assert_eq!(envelope.user_text, "Buy pasta, rice");
        assert_eq!(envelope.source_id, "R1");
        assert_eq!(envelope.user_id, "local-user");
        assert_eq!(envelope.timezone, "America/Los_Angeles");
        assert!(envelope.timestamp.ends_with('Z'));
    }

    #[test]
    fn test_reminder_text_with_body() {
        let reminder = Reminder::new("R2", "Groceries").with_body("eggs and milk");
        assert_eq!(reminder_text(&reminder), "Groceries. eggs and milk");
    }

    #[test]
    fn test_note_envelope() {
        let note = Note::new("N1", "Pesto", "Ingredients:\n- basil");
        let envelope = Envelope::for_note(&EnvelopeDefaults::default(), &note);
        assert_eq!(envelope.channel, Channel::Note);
        assert_eq!(envelope.user_text, "Pesto\nIngredients:\n- basil");
    }

    #[test]
    fn test_wire_values() {
        let envelope = Envelope::capture(&EnvelopeDefaults::default(), Channel::Url, "text", "https://x");
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["channel"], "url_text");
        assert_eq!(json["mode_hint"], "capture");
        assert_eq!(serde_json::to_value(Channel::Note).unwrap(), "apple_note");
        assert_eq!(serde_json::to_value(ModeHint::Query).unwrap(), "query");
    }
}
