//! Source adapter over `osascript` (macOS Reminders and Notes)
//!
//! Scripts emit records separated by ASCII RS (0x1E) with fields separated by
//! ASCII US (0x1F), so names and bodies containing commas survive parsing.

use crate::core::error::{BrainError, Result};
use crate::sources::adapter::{Note, Reminder, SourceAdapter};
use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;

const RECORD_SEP: char = '\u{1e}';
const FIELD_SEP: char = '\u{1f}';

const LIST_REMINDERS_SCRIPT: &str = r#"
set fs to (character id 31)
set rs to (character id 30)
set out to ""
tell application "Reminders"
    repeat with lst in lists
        set lstName to name of lst
        repeat with r in reminders of lst
            set rBody to body of r
            if rBody is missing value then set rBody to ""
            set out to out & (id of r) & fs & (name of r) & fs & rBody & fs & ((completed of r) as string) & fs & lstName & rs
        end repeat
    end repeat
end tell
return out
"#;

const LIST_NOTES_SCRIPT: &str = r#"
set fs to (character id 31)
set rs to (character id 30)
set out to ""
tell application "Notes"
    repeat with fld in folders
        set fldName to name of fld
        repeat with n in notes of fld
            set out to out & (id of n) & fs & (name of n) & fs & (body of n) & fs & fldName & fs & ((modification date of n) as string) & rs
        end repeat
    end repeat
end tell
return out
"#;

/// Talks to the Reminders and Notes applications through `osascript`
pub struct AppleScriptAdapter {
    timeout: Duration,
}

impl AppleScriptAdapter {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn run(&self, script: &str) -> Result<String> {
        let output = tokio::time::timeout(
            self.timeout,
            Command::new("osascript").arg("-e").arg(script).output(),
        )
        .await
        .map_err(|_| BrainError::Transport(format!("osascript timed out after {:?}", self.timeout)))?
        .map_err(|e| BrainError::Transport(format!("failed to run osascript: {}", e)))?;

        if !output.status.success() {
            return Err(BrainError::Transport(format!(
                "osascript failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
    }
}

#[async_trait]
impl SourceAdapter for AppleScriptAdapter {
    async fn list_reminders(&self) -> Result<Vec<Reminder>> {
        let output = self.run(LIST_REMINDERS_SCRIPT).await?;
        Ok(parse_reminders(&output))
    }

    async fn delete_reminder(&self, id: &str) -> Result<bool> {
        let script = format!(
            r#"
tell application "Reminders"
    repeat with lst in lists
        repeat with r in reminders of lst
            if id of r is "{id}" then
                delete r
                return "true"
            end if
        end repeat
    end repeat
    return "false"
end tell
"#,
            id = quote(id)
        );
        let output = self.run(&script).await?;
        Ok(output.trim().eq_ignore_ascii_case("true"))
    }

    async fn list_notes(&self) -> Result<Vec<Note>> {
        let output = self.run(LIST_NOTES_SCRIPT).await?;
        Ok(parse_notes(&output))
    }

    async fn upsert_document(&self, folder: &str, title: &str, markup: &str) -> Result<bool> {
        let ensure_folder = format!(
            r#"
tell application "Notes"
    if not (exists folder "{folder}") then
        make new folder with properties {{name:"{folder}"}}
    end if
end tell
"#,
            folder = quote(folder)
        );
        self.run(&ensure_folder).await?;

        let script = format!(
            r#"
tell application "Notes"
    set targetFolder to folder "{folder}"
    set foundNote to missing value
    repeat with n in notes of targetFolder
        if name of n is "{title}" then
            set foundNote to n
            exit repeat
        end if
    end repeat
    if foundNote is not missing value then
        set body of foundNote to "{body}"
    else
        make new note at targetFolder with properties {{name:"{title}", body:"{body}"}}
    end if
    return "true"
end tell
"#,
            folder = quote(folder),
            title = quote(title),
            body = quote(markup)
        );
        let output = self.run(&script).await?;
        Ok(output.trim().eq_ignore_ascii_case("true"))
    }
}

/// Escape a value for use inside an AppleScript string literal
fn quote(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

fn records(output: &str) -> impl Iterator<Item = Vec<&str>> {
    output
        .split(RECORD_SEP)
        .filter(|record| !record.trim().is_empty())
        .map(|record| record.split(FIELD_SEP).collect::<Vec<_>>())
}

fn parse_reminders(output: &str) -> Vec<Reminder> {
    records(output)
        .filter(|fields| fields.len() == 5)
        .map(|fields| Reminder {
            id: fields[0].trim().to_string(),
            name: fields[1].trim().to_string(),
            body: fields[2].trim().to_string(),
            completed: fields[3].trim() == "true",
            list_name: fields[4].trim().to_string(),
        })
        .collect()
}

fn parse_notes(output: &str) -> Vec<Note> {
    records(output)
        .filter(|fields| fields.len() == 5)
        .map(|fields| Note {
            id: fields[0].trim().to_string(),
            name: fields[1].trim().to_string(),
            body: fields[2].to_string(),
            folder_name: fields[3].trim().to_string(),
            modified_at: fields[4].trim().to_string(),
        })
        .collect()
}
