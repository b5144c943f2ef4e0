//! Daemon module for Breath Coach.
//!
//! This module contains the core daemon functionality:
//! - `clock`: Time sources, real and manual
//! - `timer`: Phase state machine with pause-aware timing
//! - `focus`: Focus countdown
//! - `controller`: Session lifecycle, completion and feedback cues
//! - `scheduler`: Periodic tick driver
//! - `ipc`: Unix socket server and request handling

pub mod clock;
pub mod controller;
pub mod focus;
pub mod ipc;
pub mod scheduler;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{ControllerError, SessionController, SessionEvent, StoppedSession};
pub use focus::{FocusSnapshot, FocusTimer};
pub use ipc::{IpcError, IpcServer, RequestHandler};
pub use scheduler::{TickHandle, TickScheduler};
pub use timer::{PhaseTransition, SessionSnapshot, SessionTimer};

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::{mpsc, Mutex};

use crate::config::Settings;
use crate::feedback::TracingFeedback;
use crate::history::JsonHistoryStore;

/// Runs the daemon in the foreground until SIGINT or SIGTERM.
///
/// A session still running at shutdown is stopped so that it is recorded.
///
/// # Errors
///
/// Returns an error if the settings are invalid or the socket cannot be bound.
pub async fn run(settings: Settings) -> Result<()> {
    settings.validate().context("Invalid settings")?;

    let socket_path = settings.socket_path()?;
    let history_path = settings.history_path()?;
    let defaults = settings.session_config();

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let controller = SessionController::new(
        defaults.clone(),
        Arc::new(TracingFeedback),
        Arc::new(JsonHistoryStore::new(history_path)),
        event_tx,
    )?;
    let controller = Arc::new(Mutex::new(controller));

    let server = IpcServer::new(&socket_path)?;
    let handler = RequestHandler::new(controller.clone(), defaults)
        .with_focus_minutes(settings.default_focus_minutes);
    tracing::info!("listening on {:?}", server.socket_path());

    let events = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            log_event(&event);
        }
    });

    let tick_controller = controller.clone();
    let ticker = TickScheduler::spawn(settings.tick_interval(), move || {
        let controller = tick_controller.clone();
        async move {
            controller.lock().await.tick();
        }
    });

    let mut terminate = signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;

    tokio::select! {
        _ = server.serve(&handler) => {}
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for SIGINT")?;
            tracing::info!("received SIGINT, shutting down");
        }
        _ = terminate.recv() => {
            tracing::info!("received SIGTERM, shutting down");
        }
    }

    ticker.shutdown().await;

    {
        let mut controller = controller.lock().await;
        if controller.is_running() {
            if let Err(e) = controller.stop() {
                tracing::warn!("failed to stop session on shutdown: {}", e);
            }
        }
    }

    // The handler and the controller hold the last event senders.
    drop(handler);
    drop(controller);
    if let Err(e) = events.await {
        tracing::debug!("event logger ended abnormally: {}", e);
    }

    Ok(())
}

fn log_event(event: &SessionEvent) {
    match event {
        SessionEvent::Started {
            pattern_id,
            target_rounds,
        } => tracing::info!(pattern = %pattern_id, target_rounds, "session started"),
        SessionEvent::PhaseChanged(transition) => tracing::debug!(
            from = %transition.from,
            to = %transition.to,
            cycle_count = transition.cycle_count,
            "phase changed"
        ),
        SessionEvent::Paused => tracing::info!("session paused"),
        SessionEvent::Resumed => tracing::info!("session resumed"),
        SessionEvent::Stopped { cycle_count } => {
            tracing::info!(cycle_count, "session stopped")
        }
        SessionEvent::Completed {
            cycle_count,
            total_seconds,
        } => tracing::info!(cycle_count, total_seconds, "session completed"),
        SessionEvent::FocusStarted { duration_seconds } => {
            tracing::info!(duration_seconds, "focus started")
        }
        SessionEvent::FocusStopped { elapsed_seconds } => {
            tracing::info!(elapsed_seconds, "focus stopped")
        }
        SessionEvent::FocusCompleted { duration_seconds } => {
            tracing::info!(duration_seconds, "focus completed")
        }
    }
}
