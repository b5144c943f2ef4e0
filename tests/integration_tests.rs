//! Integration tests for daemon-CLI IPC communication.
//!
//! A real [`IpcServer`] serves a [`SessionController`] driven by a
//! [`ManualClock`]; the CLI's [`IpcClient`] talks to it over a temporary
//! Unix socket.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use breath_coach::cli::client::IpcClient;
use breath_coach::cli::commands::{FocusArgs, StartArgs};
use breath_coach::daemon::ipc::{IpcServer, RequestHandler};
use breath_coach::daemon::{ManualClock, SessionController, SessionEvent};
use breath_coach::feedback::MockFeedbackDispatcher;
use breath_coach::history::{MockSessionRecorder, SessionEnd, SessionKind};
use breath_coach::types::{FeedbackIntensity, IpcResponse, SessionConfig};

// ============================================================================
// Test Helpers
// ============================================================================

struct Daemon {
    client: IpcClient,
    controller: Arc<Mutex<SessionController<ManualClock>>>,
    clock: ManualClock,
    feedback: Arc<MockFeedbackDispatcher>,
    recorder: Arc<MockSessionRecorder>,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    socket_path: PathBuf,
    server: JoinHandle<()>,
    _dir: tempfile::TempDir,
}

impl Daemon {
    /// Binds a server on a fresh socket and serves it in the background.
    fn spawn(defaults: SessionConfig) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = dir.path().join("integration_test.sock");

        let (tx, events) = mpsc::unbounded_channel();
        let clock = ManualClock::new();
        let feedback = Arc::new(MockFeedbackDispatcher::new());
        let recorder = Arc::new(MockSessionRecorder::new());
        let controller = SessionController::with_clock(
            defaults.clone(),
            clock.clone(),
            feedback.clone(),
            recorder.clone(),
            tx,
        )
        .unwrap();
        let controller = Arc::new(Mutex::new(controller));

        let server = IpcServer::new(&socket_path).unwrap();
        let handler = RequestHandler::new(controller.clone(), defaults);
        let server = tokio::spawn(async move { server.serve(&handler).await });

        Self {
            client: IpcClient::with_socket_path(socket_path.clone()),
            controller,
            clock,
            feedback,
            recorder,
            events,
            socket_path,
            server,
            _dir: dir,
        }
    }

    /// Advances the clock by `secs`, ticking every 100 ms like the daemon.
    async fn breathe(&self, secs: f64) {
        let steps = (secs * 10.0).round() as u32;
        for _ in 0..steps {
            self.clock.advance_secs(0.1);
            self.controller.lock().await.tick();
        }
    }

    fn drain_events(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}

impl Drop for Daemon {
    fn drop(&mut self) {
        self.server.abort();
    }
}

// ============================================================================
// Start
// ============================================================================

#[tokio::test]
async fn test_start_via_ipc_uses_daemon_defaults() {
    let daemon = Daemon::spawn(SessionConfig::default());

    let response = daemon.client.start(&StartArgs::default()).await.unwrap();

    assert!(response.is_success());
    assert_eq!(response.message, "Started 4-7-8 Relaxation");
    let data = response.data.unwrap();
    assert_eq!(data.phase, Some("inhale".to_string()));
    assert_eq!(data.pattern_id, Some("4-7-8".to_string()));
    assert_eq!(data.target_rounds, Some(4));
    assert_eq!(data.cycle_count, Some(0));
    assert_eq!(data.remaining_seconds, Some(4));

    assert!(daemon.controller.lock().await.is_running());
    assert_eq!(daemon.feedback.calls(), vec![FeedbackIntensity::Heavy]);
}

#[tokio::test]
async fn test_start_via_ipc_with_options() {
    let daemon = Daemon::spawn(SessionConfig::default());

    let args = StartArgs {
        pattern: Some("box".to_string()),
        rounds: Some(6),
        no_haptics: true,
    };
    let response = daemon.client.start(&args).await.unwrap();

    assert_eq!(response.message, "Started Box Breathing");
    let data = response.data.unwrap();
    assert_eq!(data.pattern_id, Some("box".to_string()));
    assert_eq!(data.target_rounds, Some(6));

    // Haptics were switched off for this session only.
    assert!(!daemon.controller.lock().await.config().haptics);
    assert_eq!(daemon.feedback.call_count(), 0);
}

#[tokio::test]
async fn test_start_options_do_not_leak_into_next_session() {
    let daemon = Daemon::spawn(SessionConfig::default().with_pattern("5-5"));

    let args = StartArgs {
        pattern: Some("box".to_string()),
        rounds: Some(2),
        no_haptics: false,
    };
    daemon.client.start(&args).await.unwrap();
    daemon.client.stop().await.unwrap();

    let response = daemon.client.start(&StartArgs::default()).await.unwrap();
    let data = response.data.unwrap();
    assert_eq!(data.pattern_id, Some("5-5".to_string()));
    assert_eq!(data.target_rounds, Some(4));
}

#[tokio::test]
async fn test_start_twice_is_rejected() {
    let daemon = Daemon::spawn(SessionConfig::default());

    daemon.client.start(&StartArgs::default()).await.unwrap();
    let err = daemon.client.start(&StartArgs::default()).await.unwrap_err();

    assert_eq!(err.to_string(), "a session is already running");
    assert!(daemon.controller.lock().await.is_running());
}

// ============================================================================
// Pause / Resume / Stop
// ============================================================================

#[tokio::test]
async fn test_pause_when_idle_is_rejected() {
    let daemon = Daemon::spawn(SessionConfig::default());

    let err = daemon.client.pause().await.unwrap_err();
    assert_eq!(err.to_string(), "no session is running");
}

#[tokio::test]
async fn test_resume_when_not_paused_is_rejected() {
    let daemon = Daemon::spawn(SessionConfig::default());
    daemon.client.start(&StartArgs::default()).await.unwrap();

    let err = daemon.client.resume().await.unwrap_err();
    assert_eq!(err.to_string(), "the session is not paused");
}

#[tokio::test]
async fn test_pause_holds_the_phase_clock() {
    let daemon = Daemon::spawn(SessionConfig::default());
    daemon.client.start(&StartArgs::default()).await.unwrap();
    daemon.breathe(1.0).await;

    let response = daemon.client.pause().await.unwrap();
    assert_eq!(response.message, "Session paused");
    assert_eq!(response.data.unwrap().paused, Some(true));

    // Ten seconds of real time pass while paused.
    daemon.breathe(10.0).await;

    let status = daemon.client.status().await.unwrap().data.unwrap();
    assert_eq!(status.phase, Some("inhale".to_string()));
    assert_eq!(status.remaining_seconds, Some(3));

    let response = daemon.client.resume().await.unwrap();
    assert_eq!(response.message, "Session resumed");
    assert_eq!(response.data.unwrap().paused, Some(false));

    daemon.breathe(3.0).await;
    let status = daemon.client.status().await.unwrap().data.unwrap();
    assert_eq!(status.phase, Some("hold_in".to_string()));
}

#[tokio::test]
async fn test_stop_reports_last_state_and_records_session() {
    let daemon = Daemon::spawn(SessionConfig::default().with_pattern("4-6"));
    daemon.client.start(&StartArgs::default()).await.unwrap();

    // Two full rounds, then part of the third.
    daemon.breathe(22.0).await;

    let response = daemon.client.stop().await.unwrap();
    assert_eq!(response.message, "Session stopped after 2 rounds");
    let data = response.data.unwrap();
    assert_eq!(data.cycle_count, Some(2));
    assert_eq!(data.pattern_id, Some("4-6".to_string()));

    let records = daemon.recorder.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].ended_by, SessionEnd::Stopped);
    assert_eq!(records[0].rounds, 2);

    let status = daemon.client.status().await.unwrap().data.unwrap();
    assert_eq!(status.phase, Some("idle".to_string()));
}

#[tokio::test]
async fn test_stop_before_first_round_is_not_recorded() {
    let daemon = Daemon::spawn(SessionConfig::default());
    daemon.client.start(&StartArgs::default()).await.unwrap();
    daemon.breathe(2.0).await;

    let response = daemon.client.stop().await.unwrap();
    assert_eq!(response.message, "Session stopped after 0 rounds");
    assert_eq!(daemon.recorder.record_count(), 0);
}

// ============================================================================
// Status / Completion
// ============================================================================

#[tokio::test]
async fn test_status_when_idle() {
    let daemon = Daemon::spawn(SessionConfig::default());

    let response = daemon.client.status().await.unwrap();
    let data = response.data.unwrap();
    assert_eq!(data.phase, Some("idle".to_string()));
    assert_eq!(data.paused, Some(false));
    assert_eq!(data.cycle_count, Some(0));
    assert_eq!(data.remaining_seconds, Some(0));
}

#[tokio::test]
async fn test_session_completes_at_target_rounds() {
    let mut daemon = Daemon::spawn(SessionConfig::default().with_pattern("2-4"));
    let args = StartArgs {
        rounds: Some(2),
        ..StartArgs::default()
    };
    daemon.client.start(&args).await.unwrap();

    daemon.breathe(12.5).await;

    let status = daemon.client.status().await.unwrap().data.unwrap();
    assert_eq!(status.phase, Some("idle".to_string()));
    assert!(!daemon.controller.lock().await.is_running());

    let records = daemon.recorder.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].ended_by, SessionEnd::Completed);
    assert_eq!(records[0].rounds, 2);
    assert_eq!(records[0].pattern_id, "2-4");

    let completed = daemon
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, SessionEvent::Completed { .. }))
        .count();
    assert_eq!(completed, 1);

    let err = daemon.client.stop().await.unwrap_err();
    assert_eq!(err.to_string(), "no session is running");
}

// ============================================================================
// Focus
// ============================================================================

#[tokio::test]
async fn test_focus_countdown_via_ipc() {
    let mut daemon = Daemon::spawn(SessionConfig::default());

    let response = daemon
        .client
        .focus(&FocusArgs { minutes: Some(5) })
        .await
        .unwrap();
    assert_eq!(response.message, "Focus started for 5 min");
    assert_eq!(response.data.unwrap().duration_seconds, Some(300));

    daemon.breathe(120.0).await;
    let status = daemon.client.status().await.unwrap().data.unwrap();
    assert_eq!(status.kind, Some("focus".to_string()));
    assert_eq!(status.phase, Some("focus".to_string()));
    assert_eq!(status.remaining_seconds, Some(180));

    daemon.breathe(180.0).await;
    let status = daemon.client.status().await.unwrap().data.unwrap();
    assert_eq!(status.phase, Some("idle".to_string()));

    let records = daemon.recorder.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, SessionKind::Focus);
    assert_eq!(records[0].ended_by, SessionEnd::Completed);
    assert_eq!(records[0].duration_seconds, 300);

    let completed = daemon
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, SessionEvent::FocusCompleted { .. }))
        .count();
    assert_eq!(completed, 1);
}

#[tokio::test]
async fn test_focus_pause_and_stop_via_ipc() {
    let daemon = Daemon::spawn(SessionConfig::default());
    daemon.client.focus(&FocusArgs::default()).await.unwrap();
    daemon.breathe(30.0).await;

    daemon.client.pause().await.unwrap();
    daemon.breathe(60.0).await;
    let status = daemon.client.status().await.unwrap().data.unwrap();
    assert_eq!(status.paused, Some(true));
    assert_eq!(status.remaining_seconds, Some(1770));

    daemon.client.resume().await.unwrap();
    let response = daemon.client.stop().await.unwrap();
    assert_eq!(response.message, "Focus stopped after 0:30");
    assert_eq!(daemon.recorder.record_count(), 0);
}

#[tokio::test]
async fn test_breathing_and_focus_exclude_each_other() {
    let daemon = Daemon::spawn(SessionConfig::default());
    daemon.client.focus(&FocusArgs::default()).await.unwrap();

    let err = daemon.client.start(&StartArgs::default()).await.unwrap_err();
    assert_eq!(err.to_string(), "a session is already running");

    daemon.client.stop().await.unwrap();
    daemon.client.start(&StartArgs::default()).await.unwrap();
    let err = daemon.client.focus(&FocusArgs::default()).await.unwrap_err();
    assert_eq!(err.to_string(), "a session is already running");
}

// ============================================================================
// Transport Errors
// ============================================================================

#[tokio::test]
async fn test_connection_error_without_daemon() {
    let dir = tempfile::tempdir().unwrap();
    let client = IpcClient::with_socket_path(dir.path().join("missing.sock"));

    let err = client.status().await.unwrap_err();
    assert!(err.to_string().contains("Cannot connect to the daemon"));
}

#[tokio::test]
async fn test_invalid_request_gets_error_response() {
    let daemon = Daemon::spawn(SessionConfig::default());

    let mut stream = UnixStream::connect(&daemon.socket_path).await.unwrap();
    stream.write_all(br#"{"command":"inhale"}"#).await.unwrap();
    stream.shutdown().await.unwrap();

    let mut buffer = vec![0u8; 4096];
    let n = stream.read(&mut buffer).await.unwrap();
    let response: IpcResponse = serde_json::from_slice(&buffer[..n]).unwrap();

    assert!(!response.is_success());
    assert!(response.message.starts_with("Invalid request"));

    // The server keeps serving after a bad request.
    assert!(daemon.client.status().await.is_ok());
}

#[tokio::test]
async fn test_unknown_pattern_in_raw_request_is_rejected() {
    let daemon = Daemon::spawn(SessionConfig::default());

    let mut stream = UnixStream::connect(&daemon.socket_path).await.unwrap();
    stream
        .write_all(br#"{"command":"start","patternId":"7-11"}"#)
        .await
        .unwrap();
    stream.shutdown().await.unwrap();

    let mut buffer = vec![0u8; 4096];
    let n = stream.read(&mut buffer).await.unwrap();
    let response: IpcResponse = serde_json::from_slice(&buffer[..n]).unwrap();

    assert!(!response.is_success());
    assert!(response.message.contains("unknown breathing pattern '7-11'"));
    assert!(!daemon.controller.lock().await.is_running());
}
