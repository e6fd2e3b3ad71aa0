//! Append-only interaction log (JSON lines)

use crate::actions::ActionReport;
use crate::core::error::{BrainError, Result};
use crate::llm::GatewayDecision;
use crate::pipeline::envelope::Envelope;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Outcome of one graph mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MutationOutcome {
    pub fn applied(id: impl Into<String>) -> Self {
        Self {
            success: true,
            id: Some(id.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            id: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResults {
    pub graph_updates: Vec<MutationOutcome>,
    pub actions: ActionReport,
}

/// One line of the log, written once per pipeline pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub timestamp: String,
    pub envelope: Envelope,
    /// `None` when the reasoning call failed
    pub model_output: Option<GatewayDecision>,
    pub execution_results: ExecutionResults,
    pub errors: Vec<String>,
}

impl InteractionRecord {
    pub fn new(
        envelope: Envelope,
        model_output: Option<GatewayDecision>,
        execution_results: ExecutionResults,
        errors: Vec<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            envelope,
            model_output,
            execution_results,
            errors,
        }
    }
}

pub struct InteractionLog {
    path: PathBuf,
}

impl InteractionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record; existing lines are never touched
    pub fn append(&self, record: &InteractionRecord) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    /// Read every record back (audit tooling and tests)
    pub fn read_all(&self) -> Result<Vec<InteractionRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(BrainError::from))
            .collect()
    }
}
