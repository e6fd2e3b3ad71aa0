//! Fixed-interval polling loop
//!
//! The pipeline sits behind one async mutex shared with the HTTP entry point,
//! so a scheduled tick and an ad-hoc capture never run at the same time.

use crate::pipeline::orchestrator::CapturePipeline;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub type SharedPipeline = Arc<Mutex<CapturePipeline>>;

pub fn shared(pipeline: CapturePipeline) -> SharedPipeline {
    Arc::new(Mutex::new(pipeline))
}

/// Run ticks every `period`, stopping after `limit` ticks when given
///
/// The first tick starts immediately. A tick that overruns the period delays
/// the next one instead of bursting to catch up.
pub async fn run_ticks(pipeline: SharedPipeline, period: Duration, limit: Option<u64>) -> u64 {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut ticks = 0;

    while limit.map_or(true, |limit| ticks < limit) {
        ticker.tick().await;
        let summary = pipeline.lock().await.run_tick().await;
        ticks += 1;
        if summary.enumeration_failures > 0 {
            tracing::warn!(tick = ticks, failures = summary.enumeration_failures, "tick had enumeration failures");
        }
    }

    ticks
}

/// Background polling loop for `serve`
pub fn spawn_scheduler(pipeline: SharedPipeline, period: Duration) -> JoinHandle<()> {
    tracing::info!(period_secs = period.as_secs(), "scheduler started");
    tokio::spawn(async move {
        run_ticks(pipeline, period, None).await;
    })
}
