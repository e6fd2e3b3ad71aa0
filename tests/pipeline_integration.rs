//! End-to-end capture pipeline tests
//!
//! Drives the public API with the in-memory source adapter, a scripted
//! reasoning gateway and an in-memory graph.

use async_trait::async_trait;
use second_brain::actions::{Action, ActionSpec};
use second_brain::core::config::BrainConfig;
use second_brain::core::error::{BrainError, Result};
use second_brain::graph::{GraphMutation, GraphStore, NodeDraft};
use second_brain::llm::{parse_decision, GatewayDecision, GraphContext, ReasoningGateway};
use second_brain::pipeline::{CapturePipeline, Channel, Envelope};
use second_brain::sources::{MemorySourceAdapter, Note, Reminder};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct ScriptedGateway {
    replies: Mutex<VecDeque<Result<GatewayDecision>>>,
    calls: Mutex<Vec<(Envelope, usize)>>,
}

impl ScriptedGateway {
    fn push(&self, reply: Result<GatewayDecision>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    /// Envelopes seen, each with the number of context nodes it was given
    fn calls(&self) -> Vec<(Envelope, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReasoningGateway for ScriptedGateway {
    async fn decide(&self, envelope: &Envelope, context: &GraphContext) -> Result<GatewayDecision> {
        self.calls
            .lock()
            .unwrap()
            .push((envelope.clone(), context.node_count()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(GatewayDecision::default()))
    }
}

struct World {
    pipeline: CapturePipeline,
    adapter: Arc<MemorySourceAdapter>,
    gateway: Arc<ScriptedGateway>,
    _dir: tempfile::TempDir,
}

fn world() -> World {
    let dir = tempfile::tempdir().unwrap();
    let config = BrainConfig {
        log_path: dir.path().join("interactions.jsonl"),
        ..Default::default()
    };
    let adapter = Arc::new(MemorySourceAdapter::new());
    let gateway = Arc::new(ScriptedGateway::default());
    let pipeline = CapturePipeline::new(
        &config,
        GraphStore::open_in_memory().unwrap(),
        adapter.clone(),
        gateway.clone(),
    );
    World {
        pipeline,
        adapter,
        gateway,
        _dir: dir,
    }
}

fn grocery(label: &str) -> GraphMutation {
    let mut properties = serde_json::Map::new();
    properties.insert("category".into(), json!("Pantry & Dry Goods"));
    GraphMutation::CreateNode(NodeDraft {
        node_type: "GroceryItem".into(),
        label: Some(label.into()),
        properties: Some(properties),
        ..Default::default()
    })
}

fn pasta_and_rice() -> GatewayDecision {
    GatewayDecision {
        interaction_intent: "store_only".into(),
        answer: String::new(),
        graph_updates: vec![grocery("Pasta").to_spec().unwrap(), grocery("Rice").to_spec().unwrap()],
        actions: vec![
            ActionSpec::new(
                "update_apple_note",
                json!({
                    "target_folder": "To Buy",
                    "target_title": "Groceries",
                    "layout": {"sections": [
                        {"name": "Pantry & Dry Goods", "items": [{"text": "Pasta"}, {"text": "Rice"}]}
                    ]}
                }),
            ),
            Action::delete("R1").to_spec().unwrap(),
        ],
    }
}

#[tokio::test]
async fn test_reminder_to_checklist() {
    let mut w = world();
    w.adapter.add_reminder(Reminder::new("R1", "Buy pasta, rice"));
    w.gateway.push(Ok(pasta_and_rice()));

    let summary = w.pipeline.run_tick().await;
    assert_eq!(summary.reminders_processed, 1);

    let calls = w.gateway.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0.channel, Channel::Reminder);
    assert_eq!(calls[0].0.user_text, "Buy pasta, rice");
    assert_eq!(calls[0].0.source_id, "R1");

    let store = w.pipeline.store();
    assert_eq!(store.node_count().unwrap(), 2);
    let labels: Vec<_> = store
        .find_nodes_by_type("GroceryItem", 10)
        .unwrap()
        .into_iter()
        .filter_map(|n| n.label)
        .collect();
    assert_eq!(labels, vec!["Rice".to_string(), "Pasta".to_string()]);

    let upserts = w.adapter.upserts();
    assert_eq!(upserts.len(), 1);
    assert_eq!(upserts[0].folder, "To Buy");
    assert_eq!(upserts[0].title, "Groceries");
    let markup = &upserts[0].markup;
    assert_eq!(markup.matches("<h2>Pantry &amp; Dry Goods</h2>").count(), 1);
    assert!(markup.contains("<li><div><en-todo/>Pasta</div></li>"));
    assert!(markup.contains("<li><div><en-todo/>Rice</div></li>"));

    assert_eq!(w.adapter.deletes(), vec!["R1".to_string()]);
    assert!(w.pipeline.dedup().reminder_seen("R1"));

    let records = w.pipeline.log().read_all().unwrap();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.execution_results.graph_updates.len(), 2);
    assert!(record.execution_results.graph_updates.iter().all(|o| o.success));
    assert_eq!(record.execution_results.actions.success_count, 2);
    assert!(record.errors.is_empty());
}

#[tokio::test]
async fn test_second_capture_sees_first_in_context() {
    let mut w = world();
    w.adapter.add_reminder(Reminder::new("R1", "Buy pasta, rice"));
    w.gateway.push(Ok(pasta_and_rice()));
    w.pipeline.run_tick().await;

    w.adapter.add_reminder(Reminder::new("R2", "Buy basil"));
    w.pipeline.run_tick().await;

    let calls = w.gateway.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].0.source_id, "R2");
    assert_eq!(calls[1].1, 2);
}

#[tokio::test]
async fn test_reminder_never_reprocessed() {
    let mut w = world();
    w.adapter.add_reminder(Reminder::new("R1", "Buy pasta"));

    for _ in 0..3 {
        w.pipeline.run_tick().await;
    }

    // The scripted reply deletes nothing, so R1 stays listed every tick
    assert_eq!(w.gateway.calls().len(), 1);
    assert_eq!(w.pipeline.dedup().reminders_processed(), 1);
}

#[tokio::test]
async fn test_note_processed_once_per_content() {
    let mut w = world();
    w.adapter
        .put_note(Note::new("N1", "Pesto", "Ingredients:\n- basil\n- pine nuts"));
    w.pipeline.run_tick().await;
    w.pipeline.run_tick().await;
    assert_eq!(w.gateway.calls().len(), 1);

    w.adapter
        .put_note(Note::new("N1", "Pesto", "Ingredients:\n- basil\n- pine nuts\n- garlic"));
    w.pipeline.run_tick().await;
    w.pipeline.run_tick().await;

    let calls = w.gateway.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[1].0.user_text.ends_with("- garlic"));
}

#[tokio::test]
async fn test_artifact_note_ignored() {
    let mut w = world();
    w.adapter.add_reminder(Reminder::new("R1", "Buy pasta, rice"));
    w.gateway.push(Ok(pasta_and_rice()));
    w.pipeline.run_tick().await;

    // The checklist we just wrote shows up as a note on the next poll
    let markup = w.adapter.document("To Buy", "Groceries").unwrap();
    w.adapter.put_note(Note::new("G1", "Groceries", markup));
    let summary = w.pipeline.run_tick().await;

    assert_eq!(summary.notes_processed, 0);
    assert_eq!(w.gateway.calls().len(), 1);
}

#[tokio::test]
async fn test_gateway_failure_is_logged_and_not_retried() {
    let mut w = world();
    w.adapter.add_reminder(Reminder::new("R1", "Buy pasta"));
    w.adapter.add_reminder(Reminder::new("R2", "Buy rice"));
    w.gateway
        .push(Err(BrainError::Transport("connection refused".into())));

    let summary = w.pipeline.run_tick().await;
    w.pipeline.run_tick().await;

    assert_eq!(summary.reminders_processed, 2);
    assert_eq!(w.gateway.calls().len(), 2);

    let records = w.pipeline.log().read_all().unwrap();
    assert_eq!(records.len(), 2);
    assert!(records[0].model_output.is_none());
    assert!(records[0].errors[0].contains("connection refused"));
    assert!(records[1].model_output.is_some());
}

#[tokio::test]
async fn test_offline_source_does_not_abort() {
    let mut w = world();
    w.adapter.add_reminder(Reminder::new("R1", "Buy pasta"));
    w.adapter.set_offline(true);

    let summary = w.pipeline.run_tick().await;
    assert_eq!(summary.enumeration_failures, 2);
    assert!(w.gateway.calls().is_empty());

    w.adapter.set_offline(false);
    let summary = w.pipeline.run_tick().await;
    assert_eq!(summary.enumeration_failures, 0);
    assert_eq!(summary.reminders_processed, 1);
}

#[tokio::test]
async fn test_partial_batch_failure_recorded() {
    let mut w = world();
    w.adapter.add_reminder(Reminder::new("R1", "Buy pasta"));
    w.gateway.push(Ok(GatewayDecision {
        graph_updates: vec![
            grocery("Pasta").to_spec().unwrap(),
            second_brain::graph::MutationSpec {
                op_type: "create_edge".into(),
                payload: json!({"type": "INGREDIENT_OF", "from_id": "", "to_id": "x"}),
            },
        ],
        actions: vec![
            ActionSpec::new("delete_reminder", json!({"source_id": ""})),
            Action::delete("R1").to_spec().unwrap(),
        ],
        ..Default::default()
    }));

    w.pipeline.run_tick().await;

    let record = &w.pipeline.log().read_all().unwrap()[0];
    let outcomes = &record.execution_results.graph_updates;
    assert!(outcomes[0].success);
    assert!(outcomes[1].error.as_deref().unwrap().starts_with("validation"));
    assert_eq!(record.execution_results.actions.success_count, 1);
    assert_eq!(record.execution_results.actions.failure_count, 1);
    assert_eq!(record.errors.len(), 2);
    assert_eq!(w.adapter.deletes(), vec!["R1".to_string()]);
}

/// Replies with fixed model text, parsed the same way as the HTTP gateway
struct RawReplyGateway(&'static str);

#[async_trait]
impl ReasoningGateway for RawReplyGateway {
    async fn decide(&self, _: &Envelope, _: &GraphContext) -> Result<GatewayDecision> {
        parse_decision(self.0)
    }
}

#[tokio::test]
async fn test_malformed_reply_entries_fail_alone() {
    let dir = tempfile::tempdir().unwrap();
    let config = BrainConfig {
        log_path: dir.path().join("interactions.jsonl"),
        ..Default::default()
    };
    let adapter = Arc::new(MemorySourceAdapter::new());
    adapter.add_reminder(Reminder::new("R1", "Buy pasta"));
    let gateway = Arc::new(RawReplyGateway(
        r#"Sure:
        {
            "interaction_intent": "store_only",
            "graph_updates": [
                {"op_type": 42, "payload": {"type": "GroceryItem"}},
                {"op_type": "create_node", "payload": {"type": "GroceryItem", "label": "Pasta"}}
            ],
            "actions": [
                {"action_type": null},
                "update the note",
                {"action_type": "delete_reminder", "arguments": {"source_id": "R1"}}
            ]
        }"#,
    ));
    let mut pipeline = CapturePipeline::new(
        &config,
        GraphStore::open_in_memory().unwrap(),
        adapter.clone(),
        gateway,
    );

    pipeline.run_tick().await;

    assert_eq!(pipeline.store().node_count().unwrap(), 1);
    assert_eq!(adapter.deletes(), vec!["R1".to_string()]);

    let records = pipeline.log().read_all().unwrap();
    let record = &records[0];
    assert!(record.model_output.is_some());
    let outcomes = &record.execution_results.graph_updates;
    assert!(!outcomes[0].success);
    assert!(outcomes[0]
        .error
        .as_deref()
        .unwrap()
        .starts_with("unknown_operation"));
    assert!(outcomes[1].success);
    assert_eq!(record.execution_results.actions.success_count, 1);
    assert_eq!(record.execution_results.actions.failure_count, 2);
    assert_eq!(record.errors.len(), 3);
}

#[test]
fn test_store_writes_through_wire_mutations() {
    let store = GraphStore::open_in_memory().unwrap();
    let apply = |value: serde_json::Value| store.apply_mutation(&serde_json::from_value(value).unwrap());

    let id = apply(json!({
        "op_type": "create_node",
        "payload": {"id": "pasta", "type": "GroceryItem", "properties": {"category": "Pantry", "qty": 2}}
    }))
    .unwrap();
    assert_eq!(id, "pasta");

    apply(json!({
        "op_type": "update_node",
        "payload": {"id": "pasta", "properties": {"brand": "Barilla"}, "merge": null}
    }))
    .unwrap();

    let node = store.get_node("pasta").unwrap().unwrap();
    assert_eq!(json!(node.properties), json!({"brand": "Barilla"}));
}
