//! Runtime configuration with documented defaults
//!
//! Values come from an optional TOML file and are then overridden by a small
//! set of environment variables. Every field has a default, so an empty file
//! (or no file at all) yields a working local setup.

use crate::core::error::{BrainError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Folder the consolidated checklist lives in
pub const DEFAULT_ARTIFACT_FOLDER: &str = "To Buy";
/// Title of the consolidated checklist note
pub const DEFAULT_ARTIFACT_TITLE: &str = "Groceries";

/// Top-level configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrainConfig {
    /// SQLite file backing the graph store
    pub db_path: PathBuf,

    /// Append-only JSONL interaction log
    pub log_path: PathBuf,

    /// Seconds between polling ticks
    ///
    /// Each tick runs to completion before the next one starts, so a slow
    /// reasoning backend stretches the effective interval.
    pub poll_interval_secs: u64,

    /// Address the ad-hoc capture endpoint binds to
    pub listen_addr: String,

    /// User identifier stamped on every envelope
    pub user_id: String,

    /// IANA timezone name stamped on every envelope
    pub timezone: String,

    /// Upper bound for a single source-adapter call
    pub adapter_timeout_secs: u64,

    pub artifact: ArtifactConfig,
    pub context: ContextConfig,
    pub llm: LlmConfig,
}

/// Where the consolidated checklist is written
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    pub folder: String,
    /// Also used to recognize (and skip) the artifact note while polling
    pub title: String,
}

/// Graph context handed to the reasoning backend
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    pub node_type: String,
    /// Most recently updated nodes to include
    pub limit: usize,
}

/// Reasoning backend connection
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_url: String,
    pub model: String,
    /// Not needed for a local Ollama instance
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for BrainConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("knowledge_graph.db"),
            log_path: PathBuf::from("interactions.jsonl"),
            poll_interval_secs: 20,
            listen_addr: "127.0.0.1:8898".into(),
            user_id: "local-user".into(),
            timezone: "America/Los_Angeles".into(),
            adapter_timeout_secs: 30,
            artifact: ArtifactConfig::default(),
            context: ContextConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            folder: DEFAULT_ARTIFACT_FOLDER.into(),
            title: DEFAULT_ARTIFACT_TITLE.into(),
        }
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            node_type: "GroceryItem".into(),
            limit: 50,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:11434/api/chat".into(),
            model: "qwen2.5:7b-instruct".into(),
            api_key: None,
            timeout_secs: 120,
        }
    }
}

impl BrainConfig {
    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| BrainError::Config(e.to_string()))
    }

    /// Load from an optional file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let content = fs::read_to_string(path).map_err(|e| {
                    BrainError::Config(format!("Failed to read {}: {}", path.display(), e))
                })?;
                Self::from_toml_str(&content)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate().map_err(BrainError::Config)?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in production)
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("BRAIN_DB_PATH") {
            self.db_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("BRAIN_LOG_PATH") {
            self.log_path = PathBuf::from(v);
        }
        if let Some(secs) = lookup("BRAIN_POLL_INTERVAL_SECS").and_then(|v| v.parse().ok()) {
            self.poll_interval_secs = secs;
        }
        if let Some(v) = lookup("BRAIN_LISTEN_ADDR") {
            self.listen_addr = v;
        }
        if let Some(v) = lookup("LLM_API_URL") {
            self.llm.api_url = v;
        }
        if let Some(v) = lookup("LLM_MODEL") {
            self.llm.model = v;
        }
        if let Some(v) = lookup("LLM_API_KEY") {
            self.llm.api_key = Some(v);
        }
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.poll_interval_secs == 0 {
            return Err("poll_interval_secs must be positive".into());
        }
        if self.adapter_timeout_secs == 0 || self.llm.timeout_secs == 0 {
            return Err("timeouts must be positive".into());
        }
        if self.context.limit == 0 {
            return Err("context.limit must be positive".into());
        }
        if self.artifact.title.trim().is_empty() {
            return Err("artifact.title must not be empty".into());
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn adapter_timeout(&self) -> Duration {
        Duration::from_secs(self.adapter_timeout_secs)
    }
}
