//! IPC server for the breathing daemon.
//!
//! This module provides Unix Domain Socket IPC functionality:
//! - Server that listens on a Unix socket
//! - Request/response handling for breathing and focus commands
//! - Integration with [`SessionController`] for command execution

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Mutex;
use tokio::time::{timeout, Duration};

use crate::history::SessionKind;
use crate::types::{
    IpcRequest, IpcResponse, ResponseData, SessionConfig, StartParams, DEFAULT_FOCUS_MINUTES,
};

use super::clock::{Clock, SystemClock};
use super::controller::{SessionController, StoppedSession};

// ============================================================================
// Constants
// ============================================================================

/// Maximum request size in bytes (4KB)
pub const MAX_REQUEST_SIZE: usize = 4096;

/// Read timeout in seconds
const READ_TIMEOUT_SECS: u64 = 5;

// ============================================================================
// IpcError
// ============================================================================

/// IPC-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    /// Read error
    #[error("Failed to read request: {0}")]
    ReadError(String),

    /// The client hung up before sending anything
    #[error("Connection closed by client")]
    ConnectionClosed,

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Request too large
    #[error("Request too large (max {MAX_REQUEST_SIZE} bytes)")]
    RequestTooLarge,
}

// ============================================================================
// IpcServer
// ============================================================================

/// Unix Domain Socket IPC server.
pub struct IpcServer {
    /// Unix socket listener
    listener: UnixListener,
    /// Socket path (for cleanup)
    socket_path: PathBuf,
}

impl IpcServer {
    /// Creates a new IPC server bound to the specified socket path.
    ///
    /// If the socket file already exists, it will be removed before binding.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be bound.
    pub fn new(socket_path: &Path) -> Result<Self> {
        // Remove existing socket file if present
        if socket_path.exists() {
            std::fs::remove_file(socket_path)
                .with_context(|| format!("Failed to remove existing socket: {:?}", socket_path))?;
        }

        // Ensure parent directory exists
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create socket directory: {:?}", parent))?;
        }

        // Bind the socket
        let listener = UnixListener::bind(socket_path)
            .with_context(|| format!("Failed to bind Unix socket: {:?}", socket_path))?;

        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
        })
    }

    /// Accepts an incoming client connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be accepted.
    pub async fn accept(&self) -> Result<UnixStream> {
        let (stream, _addr) = self
            .listener
            .accept()
            .await
            .context("Failed to accept connection")?;
        Ok(stream)
    }

    /// Receives and deserializes an IPC request from the stream.
    ///
    /// Applies a read timeout to prevent blocking indefinitely.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or deserialization fails.
    pub async fn receive_request(stream: &mut UnixStream) -> Result<IpcRequest> {
        // One extra byte detects oversized requests
        let mut buffer = vec![0u8; MAX_REQUEST_SIZE + 1];

        // Read with timeout
        let read_result = timeout(
            Duration::from_secs(READ_TIMEOUT_SECS),
            stream.read(&mut buffer),
        )
        .await;

        let n = match read_result {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(IpcError::ReadError(e.to_string()).into()),
            Err(_) => return Err(IpcError::Timeout.into()),
        };

        if n == 0 {
            return Err(IpcError::ConnectionClosed.into());
        }
        if n > MAX_REQUEST_SIZE {
            return Err(IpcError::RequestTooLarge.into());
        }

        // Deserialize request
        let request: IpcRequest = serde_json::from_slice(&buffer[..n])
            .with_context(|| "Failed to deserialize IPC request")?;

        Ok(request)
    }

    /// Serializes and sends an IPC response to the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub async fn send_response(stream: &mut UnixStream, response: &IpcResponse) -> Result<()> {
        // Serialize response
        let json = serde_json::to_vec(response).context("Failed to serialize IPC response")?;

        // Write and flush
        stream
            .write_all(&json)
            .await
            .context("Failed to write response")?;
        stream.flush().await.context("Failed to flush response")?;

        Ok(())
    }

    /// Serves clients one at a time until the task is cancelled.
    ///
    /// A malformed request gets an error response; a broken connection is
    /// logged and skipped.
    pub async fn serve<C: Clock>(&self, handler: &RequestHandler<C>) {
        loop {
            let mut stream = match self.accept().await {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::warn!("{:#}", e);
                    continue;
                }
            };

            let response = match Self::receive_request(&mut stream).await {
                Ok(request) => {
                    tracing::debug!(?request, "ipc request");
                    handler.handle(request).await
                }
                Err(e) => {
                    tracing::warn!("bad ipc request: {:#}", e);
                    IpcResponse::error(format!("Invalid request: {}", e))
                }
            };

            if let Err(e) = Self::send_response(&mut stream, &response).await {
                tracing::warn!("{:#}", e);
            }
        }
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        // Clean up socket file on drop
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

// ============================================================================
// RequestHandler
// ============================================================================

/// Handles IPC requests by dispatching to the session controller.
pub struct RequestHandler<C: Clock = SystemClock> {
    controller: Arc<Mutex<SessionController<C>>>,
    /// Base configuration that start parameters are overlaid on
    defaults: SessionConfig,
    /// Focus length used when a focus request names none
    focus_minutes: u32,
}

/// Status of whichever session is active, breathing when idle.
fn status_data<C: Clock>(controller: &SessionController<C>) -> ResponseData {
    match controller.active_kind() {
        Some(SessionKind::Focus) => ResponseData::from_focus(&controller.focus_snapshot()),
        _ => ResponseData::from_snapshot(&controller.snapshot()),
    }
}

impl<C: Clock> RequestHandler<C> {
    /// Creates a new request handler for the given controller.
    pub fn new(controller: Arc<Mutex<SessionController<C>>>, defaults: SessionConfig) -> Self {
        Self {
            controller,
            defaults,
            focus_minutes: DEFAULT_FOCUS_MINUTES,
        }
    }

    /// Sets the focus length used when a focus request names none.
    pub fn with_focus_minutes(mut self, minutes: u32) -> Self {
        self.focus_minutes = minutes;
        self
    }

    /// Handles an IPC request and returns the appropriate response.
    pub async fn handle(&self, request: IpcRequest) -> IpcResponse {
        match request {
            IpcRequest::Start { params } => self.handle_start(params).await,
            IpcRequest::Focus { minutes } => self.handle_focus(minutes).await,
            IpcRequest::Pause => self.handle_pause().await,
            IpcRequest::Resume => self.handle_resume().await,
            IpcRequest::Stop => self.handle_stop().await,
            IpcRequest::Status => self.handle_status().await,
        }
    }

    async fn handle_start(&self, params: StartParams) -> IpcResponse {
        let mut controller = self.controller.lock().await;
        let config = params.apply_to(&self.defaults);

        let result = controller
            .configure(config)
            .and_then(|()| controller.start());

        match result {
            Ok(()) => {
                let pattern = controller.pattern();
                IpcResponse::success(
                    format!("Started {}", pattern.name),
                    Some(ResponseData::from_snapshot(&controller.snapshot())),
                )
            }
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }

    /// Starts a focus countdown with the daemon's default session settings.
    async fn handle_focus(&self, minutes: Option<u32>) -> IpcResponse {
        let mut controller = self.controller.lock().await;
        let minutes = minutes.unwrap_or(self.focus_minutes);

        // Restore default haptics left over from the last breathing start
        let result = controller
            .configure(self.defaults.clone())
            .and_then(|()| controller.start_focus(minutes));

        match result {
            Ok(()) => IpcResponse::success(
                format!("Focus started for {} min", minutes),
                Some(ResponseData::from_focus(&controller.focus_snapshot())),
            ),
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }

    async fn handle_pause(&self) -> IpcResponse {
        let mut controller = self.controller.lock().await;

        match controller.pause() {
            Ok(()) => IpcResponse::success("Session paused", Some(status_data(&*controller))),
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }

    async fn handle_resume(&self) -> IpcResponse {
        let mut controller = self.controller.lock().await;

        match controller.resume() {
            Ok(()) => IpcResponse::success("Session resumed", Some(status_data(&*controller))),
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }

    /// Responds with the state the session had when it was stopped.
    async fn handle_stop(&self) -> IpcResponse {
        let mut controller = self.controller.lock().await;

        match controller.stop() {
            Ok(StoppedSession::Breathing(last)) => IpcResponse::success(
                format!("Session stopped after {} rounds", last.cycle_count),
                Some(ResponseData::from_snapshot(&last)),
            ),
            Ok(StoppedSession::Focus(last)) => {
                let secs = last.elapsed.round() as u64;
                IpcResponse::success(
                    format!("Focus stopped after {}:{:02}", secs / 60, secs % 60),
                    Some(ResponseData::from_focus(&last)),
                )
            }
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }

    async fn handle_status(&self) -> IpcResponse {
        let controller = self.controller.lock().await;

        IpcResponse::success("", Some(status_data(&*controller)))
    }
}

// ============================================================================
// Tests
// ============================================================================
