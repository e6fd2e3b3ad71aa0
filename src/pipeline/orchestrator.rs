//! Capture pipeline
//!
//! One pass takes an envelope through context lookup, the reasoning gateway,
//! graph mutations and actions, then appends an interaction record. A tick
//! enumerates the source store and runs one pass per due reminder and note.
//!
//! Nothing that goes wrong inside a pass leaves it: every failure becomes a
//! string in the record's `errors`, and the item is still marked processed.

use crate::actions::ActionExecutor;
use crate::core::config::{BrainConfig, ContextConfig};
use crate::graph::GraphStore;
use crate::llm::{GraphContext, ReasoningGateway};
use crate::pipeline::dedup::{fingerprint, looks_interesting, DedupState};
use crate::pipeline::envelope::{note_text, Channel, Envelope, EnvelopeDefaults};
use crate::pipeline::log::{ExecutionResults, InteractionLog, InteractionRecord, MutationOutcome};
use crate::sources::SourceAdapter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Counts reported at the end of a polling tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TickSummary {
    pub reminders_processed: usize,
    pub notes_processed: usize,
    /// Reminder or note listings that failed this tick
    pub enumeration_failures: usize,
}

/// Reply to an ad-hoc capture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureOutcome {
    pub success: bool,
    pub message: String,
}

pub struct CapturePipeline {
    store: GraphStore,
    adapter: Arc<dyn SourceAdapter>,
    gateway: Arc<dyn ReasoningGateway>,
    executor: ActionExecutor,
    log: InteractionLog,
    dedup: DedupState,
    defaults: EnvelopeDefaults,
    artifact_title: String,
    context: ContextConfig,
}

impl CapturePipeline {
    pub fn new(
        config: &BrainConfig,
        store: GraphStore,
        adapter: Arc<dyn SourceAdapter>,
        gateway: Arc<dyn ReasoningGateway>,
    ) -> Self {
        Self {
            store,
            executor: ActionExecutor::new(adapter.clone(), config.artifact.clone()),
            adapter,
            gateway,
            log: InteractionLog::new(config.log_path.clone()),
            dedup: DedupState::new(),
            defaults: EnvelopeDefaults::from_config(config),
            artifact_title: config.artifact.title.clone(),
            context: config.context.clone(),
        }
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn dedup(&self) -> &DedupState {
        &self.dedup
    }

    pub fn log(&self) -> &InteractionLog {
        &self.log
    }

    /// Run one polling tick: all due reminders, then all due notes
    pub async fn run_tick(&mut self) -> TickSummary {
        let mut summary = TickSummary::default();
        tracing::debug!("tick started");

        match self.adapter.list_reminders().await {
            Ok(reminders) => {
                for reminder in reminders {
                    if reminder.completed || self.dedup.reminder_seen(&reminder.id) {
                        continue;
                    }
                    let envelope = Envelope::for_reminder(&self.defaults, &reminder);
                    self.process_envelope(envelope).await;
                    self.dedup.mark_reminder(reminder.id);
                    summary.reminders_processed += 1;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to list reminders");
                summary.enumeration_failures += 1;
            }
        }

        match self.adapter.list_notes().await {
            Ok(notes) => {
                for note in notes {
                    // Our own checklist would otherwise feed back into itself
                    if note.name == self.artifact_title {
                        continue;
                    }
                    let content = note_text(&note);
                    let digest = fingerprint(&content);
                    if !self.dedup.note_changed(&note.id, &digest) {
                        continue;
                    }
                    if !looks_interesting(&content) {
                        tracing::debug!(note_id = %note.id, "note skipped by heuristic");
                        continue;
                    }
                    let envelope = Envelope::for_note(&self.defaults, &note);
                    self.process_envelope(envelope).await;
                    self.dedup.mark_note(note.id, digest);
                    summary.notes_processed += 1;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to list notes");
                summary.enumeration_failures += 1;
            }
        }

        tracing::info!(
            reminders = summary.reminders_processed,
            notes = summary.notes_processed,
            enumeration_failures = summary.enumeration_failures,
            "tick finished"
        );
        summary
    }

    /// Run the per-envelope steps for text submitted from outside the poller
    pub async fn capture_adhoc(
        &self,
        text: &str,
        source_ref: &str,
        channel: Channel,
    ) -> CaptureOutcome {
        if text.trim().is_empty() {
            return CaptureOutcome {
                success: false,
                message: "text is required".to_string(),
            };
        }

        let envelope = Envelope::capture(&self.defaults, channel, text, source_ref);
        let record = self.process_envelope(envelope).await;

        match &record.model_output {
            None => CaptureOutcome {
                success: false,
                message: record.errors.join("; "),
            },
            Some(decision) if !decision.answer.trim().is_empty() => CaptureOutcome {
                success: true,
                message: decision.answer.clone(),
            },
            Some(_) => CaptureOutcome {
                success: true,
                message: format!(
                    "processed: {} graph updates, {} actions",
                    record.execution_results.graph_updates.len(),
                    record.execution_results.actions.success_count
                ),
            },
        }
    }

    /// One full pass for one envelope; always produces (and logs) a record
    pub async fn process_envelope(&self, envelope: Envelope) -> InteractionRecord {
        tracing::info!(
            channel = ?envelope.channel,
            source_id = %envelope.source_id,
            "processing envelope"
        );
        let mut errors = Vec::new();

        let context = match GraphContext::from_store(&self.store, &self.context) {
            Ok(context) => context,
            Err(e) => {
                tracing::warn!(error = %e, "graph context unavailable");
                errors.push(format!("context: {}", e.to_log_string()));
                GraphContext::empty()
            }
        };

        let decision = match self.gateway.decide(&envelope, &context).await {
            Ok(decision) => decision,
            Err(e) => {
                tracing::warn!(source_id = %envelope.source_id, error = %e, "reasoning gateway failed");
                errors.push(format!("gateway: {}", e.to_log_string()));
                let record =
                    InteractionRecord::new(envelope, None, ExecutionResults::default(), errors);
                return self.append(record);
            }
        };

        let mut results = ExecutionResults::default();
        for spec in &decision.graph_updates {
            match self.store.apply_mutation(spec) {
                Ok(id) => results.graph_updates.push(MutationOutcome::applied(id)),
                Err(e) => {
                    tracing::warn!(op_type = %spec.op_type, error = %e, "mutation failed");
                    let message = e.to_log_string();
                    errors.push(format!("mutation {}: {}", spec.op_type, message));
                    results.graph_updates.push(MutationOutcome::failed(message));
                }
            }
        }

        results.actions = self.executor.execute_actions(&decision.actions).await;
        for failure in &results.actions.errors {
            errors.push(format!("action {}: {}", failure.action_type, failure.message));
        }

        tracing::info!(
            source_id = %envelope.source_id,
            mutations = results.graph_updates.len(),
            actions_ok = results.actions.success_count,
            actions_failed = results.actions.failure_count,
            "envelope processed"
        );

        self.append(InteractionRecord::new(envelope, Some(decision), results, errors))
    }

    fn append(&self, record: InteractionRecord) -> InteractionRecord {
        if let Err(e) = self.log.append(&record) {
            tracing::error!(path = %self.log.path().display(), error = %e, "failed to append interaction record");
        }
        record
    }
}
