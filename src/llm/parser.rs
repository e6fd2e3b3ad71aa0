//! Parse reasoning-backend replies into structured decisions
//!
//! The backend answers with one JSON object carrying four fields. Any of them
//! may be missing or null; they default to empty rather than failing the
//! reply. Individual mutations and actions stay untyped here and are decoded
//! one by one where they are applied.

use crate::actions::action::ActionSpec;
use crate::core::error::{BrainError, Result};
use crate::graph::mutation::MutationSpec;
use serde::{Deserialize, Deserializer, Serialize};

/// Structured decision returned for one envelope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatewayDecision {
    /// `store_only`, `answer_only` or `store_and_answer`; empty when absent
    #[serde(default, deserialize_with = "null_as_default")]
    pub interaction_intent: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub answer: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub graph_updates: Vec<MutationSpec>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub actions: Vec<ActionSpec>,
}

/// What the backend wants done with an envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionIntent {
    StoreOnly,
    AnswerOnly,
    StoreAndAnswer,
}

impl GatewayDecision {
    pub fn intent(&self) -> Option<InteractionIntent> {
        match self.interaction_intent.as_str() {
            "store_only" => Some(InteractionIntent::StoreOnly),
            "answer_only" => Some(InteractionIntent::AnswerOnly),
            "store_and_answer" => Some(InteractionIntent::StoreAndAnswer),
            _ => None,
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parse a raw model reply into a decision
pub fn parse_decision(response: &str) -> Result<GatewayDecision> {
    let json_str = extract_json(response)?;
    serde_json::from_str(json_str).map_err(|e| {
        BrainError::Transport(format!(
            "Failed to parse decision: {} - Response: {}",
            e, response
        ))
    })
}

/// Extract JSON object from LLM response (handles surrounding text)
fn extract_json(response: &str) -> Result<&str> {
    let start = response
        .find('{')
        .ok_or_else(|| BrainError::Transport("No JSON found in response".into()))?;
    let end = response
        .rfind('}')
        .filter(|&end| end > start)
        .ok_or_else(|| BrainError::Transport("No closing brace found in response".into()))?;
    Ok(&response[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_simple() {
        let response = r#"{"answer": ""}"#;
        let json = extract_json(response).unwrap();
        assert_eq!(json, response);
    }

    #[test]
    fn test_extract_json_with_surrounding_text() {
        let response = r#"Here you go:
{"interaction_intent": "store_only", "answer": "", "graph_updates": [], "actions": []}
Anything else?"#;
        let json = extract_json(response).unwrap();
        assert!(json.starts_with('{'));
        assert!(json.ends_with('}'));
        assert!(json.contains("store_only"));
    }

    #[test]
    fn test_extract_json_no_json() {
        assert!(extract_json("I could not process that").is_err());
        assert!(extract_json("} backwards {").is_err());
    }

    #[test]
    fn test_full_decision() {
        let decision = parse_decision(
            r#"{
                "interaction_intent": "store_only",
                "answer": "",
                "graph_updates": [
                    {"op_type": "create_node", "payload": {"type": "GroceryItem", "label": "Pasta"}}
                ],
                "actions": [
                    {"action_type": "delete_reminder", "arguments": {"source_id": "R1"}}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(decision.intent(), Some(InteractionIntent::StoreOnly));
        assert_eq!(decision.graph_updates.len(), 1);
        assert_eq!(decision.graph_updates[0].op_type, "create_node");
        assert_eq!(decision.actions[0].action_type, "delete_reminder");
    }

    #[test]
    fn test_missing_fields_default() {
        let decision = parse_decision(r#"{"answer": "noted"}"#).unwrap();
        assert_eq!(decision.interaction_intent, "");
        assert_eq!(decision.intent(), None);
        assert_eq!(decision.answer, "noted");
        assert!(decision.graph_updates.is_empty());
        assert!(decision.actions.is_empty());
    }

    #[test]
    fn test_null_fields_default() {
        let decision =
            parse_decision(r#"{"answer": null, "graph_updates": null, "actions": null}"#).unwrap();
        assert_eq!(decision, GatewayDecision::default());
    }

    #[test]
    fn test_invalid_shape_is_error() {
        let result = parse_decision(r#"{"graph_updates": "lots"}"#);
        assert!(matches!(result, Err(BrainError::Transport(_))));
    }

    #[test]
    fn test_malformed_entries_keep_their_siblings() {
        let decision = parse_decision(
            r#"{
                "graph_updates": [
                    {"op_type": 42, "payload": {}},
                    {"op_type": "create_node", "payload": {"type": "GroceryItem", "label": "Pasta"}}
                ],
                "actions": [
                    {"action_type": null},
                    "update the note",
                    {"action_type": "delete_reminder", "arguments": {"source_id": "R1"}}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(decision.graph_updates.len(), 2);
        assert_eq!(decision.graph_updates[0].op_type, "42");
        assert_eq!(decision.graph_updates[1].op_type, "create_node");
        assert_eq!(decision.actions.len(), 3);
        assert_eq!(decision.actions[0].action_type, "");
        assert_eq!(decision.actions[1].action_type, "");
        assert_eq!(decision.actions[2].action_type, "delete_reminder");
    }
}
