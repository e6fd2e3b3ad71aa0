//! Second Brain - Entry Point
//!
//! Loads configuration, opens the knowledge graph and runs the capture
//! pipeline either as a long-lived service or for a single tick.

use clap::{Parser, Subcommand};
use second_brain::core::config::BrainConfig;
use second_brain::core::error::Result;
use second_brain::graph::GraphStore;
use second_brain::llm::{LlmClient, LlmGateway};
use second_brain::pipeline::{spawn_scheduler, CapturePipeline};
use second_brain::server::{self, AppState};
use second_brain::sources::AppleScriptAdapter;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

/// Capture reminders and notes into a knowledge graph
#[derive(Parser, Debug)]
#[command(name = "second-brain")]
#[command(about = "Turn reminders and notes into graph facts and a consolidated grocery checklist")]
struct Args {
    /// TOML configuration file; defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll on a fixed interval and accept ad-hoc captures over HTTP
    Serve {
        /// Run the polling loop only
        #[arg(long)]
        no_http: bool,
    },
    /// Run exactly one polling tick and exit
    Tick,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("second_brain=info")),
        )
        .init();

    let args = Args::parse();
    let config = BrainConfig::load(args.config.as_deref())?;

    let rt = Runtime::new()?;
    rt.block_on(run(config, args.command.unwrap_or(Command::Serve { no_http: false })))
}

async fn run(config: BrainConfig, command: Command) -> Result<()> {
    let store = match GraphStore::open(&config.db_path) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(path = %config.db_path.display(), error = %e, "cannot open knowledge graph");
            return Err(e);
        }
    };

    let adapter = Arc::new(AppleScriptAdapter::new(config.adapter_timeout()));
    let gateway = Arc::new(LlmGateway::new(LlmClient::from_config(&config.llm)?));
    tracing::info!(
        db = %config.db_path.display(),
        log = %config.log_path.display(),
        model = %config.llm.model,
        "Second Brain starting"
    );

    let mut pipeline = CapturePipeline::new(&config, store, adapter, gateway);

    match command {
        Command::Tick => {
            let summary = pipeline.run_tick().await;
            println!("{}", serde_json::to_string(&summary)?);
            Ok(())
        }
        Command::Serve { no_http } => {
            let state = AppState::new(pipeline);
            let scheduler = spawn_scheduler(state.pipeline.clone(), config.poll_interval());

            let result = if no_http {
                tokio::signal::ctrl_c().await?;
                Ok(())
            } else {
                tokio::select! {
                    served = server::serve(state, &config.listen_addr) => served,
                    signal = tokio::signal::ctrl_c() => signal.map_err(Into::into),
                }
            };

            scheduler.abort();
            tracing::info!("Second Brain stopped");
            result
        }
    }
}
