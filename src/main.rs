//! aac-companion: live conversation engine for an AAC assistant
//!
//! This daemon runs next to a UI shell and provides:
//! - Live transcript of the conversation partner's speech
//! - Recording state machine driving continuous recognition
//! - Context-aware reply suggestions from the suggestion service
//! - Spoken replies recorded as assistant turns
//! - IPC server for the UI shell
//!
//! The shell owns the microphone and the speaker; it forwards recognizer
//! callbacks over IPC and plays the speech it is told to.

mod config;
mod engine;
mod error;
mod events;
mod ipc;
mod lifecycle;
mod phrases;
mod platform;
mod recognition;
mod session;
mod speech;
mod state;
mod status;
mod suggest;
mod transcript;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::engine::{Engine, EngineEvent, Timings};
use crate::events::SessionEvent;
use crate::ipc::Server;
use crate::lifecycle::ShutdownSignal;
use crate::platform::{Platform, ShellLink};
use crate::suggest::{HttpSuggestionClient, SuggestionService};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "aac-companion starting");

    // Load configuration
    let config = Config::load()?;
    config.ensure_dirs()?;
    info!(?config.socket_path, "configuration loaded");

    let mut shutdown = ShutdownSignal::new()?;

    // Everything that mutates the session goes through this channel
    let (engine_tx, engine_rx) = mpsc::channel::<EngineEvent>(64);
    // Engine -> subscribed IPC clients
    let (event_tx, _) = broadcast::channel::<SessionEvent>(64);
    // Recognizer/synthesizer commands -> subscribed shells
    let shell = ShellLink::new();

    let client = HttpSuggestionClient::new(&config.api_base, config.request_timeout)?;
    info!(base_url = %client.base_url(), "suggestion client ready");
    let service: Arc<dyn SuggestionService> = Arc::new(client);

    let platform = Platform::from_config(&config, &shell);
    let mut engine = Engine::new(
        Timings::from(&config),
        platform,
        Arc::clone(&service),
        engine_tx.clone(),
        event_tx.clone(),
    );

    let server = Server::new(&config.socket_path, engine_tx.clone(), event_tx, shell)?;

    // Probe the suggestion service once; the outcome becomes a status message
    tokio::spawn(async move {
        let result = service.health().await;
        let _ = engine_tx.send(EngineEvent::HealthChecked(result)).await;
    });

    info!(session_id = %engine.session().id(), "daemon initialized, entering main loop");

    tokio::select! {
        _ = engine.run(engine_rx) => {
            info!("session engine exited");
        }

        result = server.run() => {
            if let Err(e) = result {
                error!(?e, "IPC server error");
            }
        }

        _ = shutdown.wait() => {
            info!("shutdown signal received");
        }
    }

    info!("shutting down...");

    server.shutdown().await;

    info!("aac-companion stopped");

    Ok(())
}
