//! Action execution - turns decoded actions into renderer and adapter calls

use crate::actions::action::{Action, ActionSpec, DeleteSourceItem, UpdateArtifact};
use crate::core::config::ArtifactConfig;
use crate::core::error::{BrainError, Result};
use crate::render::render;
use crate::sources::SourceAdapter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Executes actions against the source adapter
pub struct ActionExecutor {
    adapter: Arc<dyn SourceAdapter>,
    artifact: ArtifactConfig,
}

/// Aggregated outcome of one batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionReport {
    pub success_count: usize,
    pub failure_count: usize,
    pub errors: Vec<ActionFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionFailure {
    pub action_type: String,
    pub message: String,
}

impl ActionExecutor {
    pub fn new(adapter: Arc<dyn SourceAdapter>, artifact: ArtifactConfig) -> Self {
        Self { adapter, artifact }
    }

    /// Execute a batch in order
    ///
    /// Every action runs regardless of earlier failures, and nothing is rolled
    /// back.
    pub async fn execute_actions(&self, actions: &[ActionSpec]) -> ActionReport {
        let mut report = ActionReport::default();

        for spec in actions {
            match self.execute_action(spec).await {
                Ok(()) => report.success_count += 1,
                Err(e) => {
                    tracing::warn!(action_type = %spec.action_type, error = %e, "action failed");
                    report.failure_count += 1;
                    report.errors.push(ActionFailure {
                        action_type: spec.action_type.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        report
    }

    async fn execute_action(&self, spec: &ActionSpec) -> Result<()> {
        match Action::from_spec(spec)? {
            Action::UpdateArtifact(update) => self.update_artifact(update).await,
            Action::DeleteSourceItem(delete) => self.delete_source_item(delete).await,
        }
    }

    async fn update_artifact(&self, update: UpdateArtifact) -> Result<()> {
        let folder = update
            .target_folder
            .unwrap_or_else(|| self.artifact.folder.clone());
        let title = update
            .target_title
            .unwrap_or_else(|| self.artifact.title.clone());
        let markup = render(&title, &update.layout);

        if self.adapter.upsert_document(&folder, &title, &markup).await? {
            tracing::info!(%folder, %title, items = update.layout.item_count(), "updated checklist");
            Ok(())
        } else {
            Err(BrainError::Transport(format!(
                "source store did not update {}/{}",
                folder, title
            )))
        }
    }

    async fn delete_source_item(&self, delete: DeleteSourceItem) -> Result<()> {
        let source_id = delete
            .source_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| BrainError::Validation("delete requires a source_id".into()))?;

        if self.adapter.delete_reminder(&source_id).await? {
            tracing::info!(%source_id, "deleted reminder");
            Ok(())
        } else {
            Err(BrainError::Transport(format!(
                "source store did not delete {}",
                source_id
            )))
        }
    }
}
