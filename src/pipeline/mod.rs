//! Capture pipeline: envelopes, dedup, reasoning, mutations, actions, log

pub mod dedup;
pub mod envelope;
pub mod log;
pub mod orchestrator;
pub mod scheduler;

pub use dedup::{fingerprint, looks_interesting, DedupCounters, DedupState};
pub use envelope::{Channel, Envelope, EnvelopeDefaults, ModeHint};
pub use log::{ExecutionResults, InteractionLog, InteractionRecord, MutationOutcome};
pub use orchestrator::{CaptureOutcome, CapturePipeline, TickSummary};
pub use scheduler::{run_ticks, shared, spawn_scheduler, SharedPipeline};
