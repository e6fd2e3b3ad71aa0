//! Reasoning gateway boundary
//!
//! Turns one envelope plus graph context into a [`GatewayDecision`]. The
//! pipeline depends only on the trait; [`LlmGateway`] is the HTTP-backed
//! implementation.

use crate::core::error::Result;
use crate::llm::client::LlmClient;
use crate::llm::context::GraphContext;
use crate::llm::parser::{parse_decision, GatewayDecision};
use crate::pipeline::envelope::Envelope;
use async_trait::async_trait;
use serde::Serialize;

#[async_trait]
pub trait ReasoningGateway: Send + Sync {
    async fn decide(&self, envelope: &Envelope, context: &GraphContext) -> Result<GatewayDecision>;
}

/// Request body sent as the user message
#[derive(Serialize)]
pub struct GatewayRequest<'a> {
    pub envelope: &'a Envelope,
    pub kg_context: &'a GraphContext,
}

/// Reasoning gateway backed by an LLM endpoint
pub struct LlmGateway {
    client: LlmClient,
    system_prompt: String,
}

impl LlmGateway {
    pub fn new(client: LlmClient) -> Self {
        Self {
            client,
            system_prompt: SYSTEM_PROMPT.to_string(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }
}

/// Pretty JSON of `{"envelope": ..., "kg_context": ...}`
pub fn build_user_message(envelope: &Envelope, context: &GraphContext) -> Result<String> {
    let request = GatewayRequest {
        envelope,
        kg_context: context,
    };
    Ok(serde_json::to_string_pretty(&request)?)
}

#[async_trait]
impl ReasoningGateway for LlmGateway {
    async fn decide(&self, envelope: &Envelope, context: &GraphContext) -> Result<GatewayDecision> {
        let user_message = build_user_message(envelope, context)?;
        let reply = self.client.complete(&self.system_prompt, &user_message).await?;
        tracing::debug!(chars = reply.len(), "reasoning backend replied");
        parse_decision(&reply)
    }
}

/// System prompt for capture processing
const SYSTEM_PROMPT: &str = r#"You maintain a personal knowledge graph of groceries and recipes.
You receive JSON: {"envelope": {...}, "kg_context": {...}}.
envelope.channel is one of reminder, apple_note, url_text, chat.
kg_context.nodes_by_type lists the most recently updated nodes per type.

Reply with ONE JSON object and nothing else:
{
  "interaction_intent": "store_only" | "answer_only" | "store_and_answer",
  "answer": "short text, usually empty when capturing",
  "graph_updates": [
    {"op_type": "create_node", "payload": {"id": "optional", "type": "GroceryItem", "label": "Pasta", "properties": {"category": "Pantry & Dry Goods"}}},
    {"op_type": "update_node", "payload": {"id": "existing id", "label": "optional", "properties": {}, "merge": true}},
    {"op_type": "create_edge", "payload": {"type": "INGREDIENT_OF", "from_id": "...", "to_id": "..."}}
  ],
  "actions": [
    {"action_type": "update_apple_note", "arguments": {"target_folder": "To Buy", "target_title": "Groceries",
      "layout": {"sections": [{"name": "Produce", "items": [{"text": "Basil"}]}]}}},
    {"action_type": "delete_reminder", "arguments": {"source_id": "<envelope.source_id>"}}
  ]
}

Rules:
- Reminders: extract grocery items, create or update GroceryItem nodes, emit one update_apple_note with the
  complete consolidated list (existing items from kg_context plus new ones), then delete_reminder with the source_id.
- Notes: only act on recipes. Create a Recipe node, GroceryItem nodes for its ingredients, INGREDIENT_OF edges,
  and an update_apple_note action. Ignore notes that are not recipes.
- Web text: act only if it is a recipe or shopping list.
- Canonical item names: singular, no quantities ("2 boxes of pasta" -> "Pasta").
- Reuse ids of nodes already present in kg_context instead of creating duplicates.
- List each item once. Use these sections, in this order: Produce, Bakery, Meat / Seafood, Dairy & Eggs, Frozen,
  Pantry & Dry Goods, Canned & Jarred, Condiments & Sauces, Snacks & Sweets, Beverages, Household & Cleaning,
  Personal Care & Pharmacy, Uncategorized / Other.
"#;
