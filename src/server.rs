//! HTTP entry point for ad-hoc captures
//!
//! `POST /capture` runs one envelope through the pipeline under the same lock
//! as the scheduled tick. `GET /health` reads the dedup counters without that
//! lock, so it answers while a tick is running.

use crate::core::error::Result;
use crate::pipeline::dedup::DedupCounters;
use crate::pipeline::envelope::Channel;
use crate::pipeline::orchestrator::{CaptureOutcome, CapturePipeline};
use crate::pipeline::scheduler::{shared, SharedPipeline};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: SharedPipeline,
    pub counters: Arc<DedupCounters>,
}

impl AppState {
    /// Share the pipeline, keeping a handle on its dedup counters
    pub fn new(pipeline: CapturePipeline) -> Self {
        let counters = pipeline.dedup().counters();
        Self {
            pipeline: shared(pipeline),
            counters,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaptureRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub source_ref: String,
    #[serde(default)]
    pub channel: Option<Channel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub reminders_processed: usize,
    pub notes_processed: usize,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/capture", post(capture))
        .route("/health", get(health))
        .with_state(state)
}

/// Bind `addr` and serve until the task is dropped
pub async fn serve(state: AppState, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "capture endpoint listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

pub async fn capture(
    State(state): State<AppState>,
    Json(request): Json<CaptureRequest>,
) -> (StatusCode, Json<CaptureOutcome>) {
    if request.text.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(CaptureOutcome {
                success: false,
                message: "text is required".to_string(),
            }),
        );
    }

    let channel = request.channel.unwrap_or(Channel::Url);
    let outcome = state
        .pipeline
        .lock()
        .await
        .capture_adhoc(&request.text, &request.source_ref, channel)
        .await;
    (StatusCode::OK, Json(outcome))
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "running".to_string(),
        reminders_processed: state.counters.reminders_processed(),
        notes_processed: state.counters.notes_processed(),
    })
}
