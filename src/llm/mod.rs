//! Reasoning backend: HTTP client, graph context, reply parsing

pub mod client;
pub mod context;
pub mod gateway;
pub mod parser;

pub use client::LlmClient;
pub use context::GraphContext;
pub use gateway::{LlmGateway, ReasoningGateway};
pub use parser::{parse_decision, GatewayDecision, InteractionIntent};
