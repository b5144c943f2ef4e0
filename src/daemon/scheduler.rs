//! Periodic tick source for the session timer.
//!
//! The timer has no notion of its own driver. This module registers a
//! periodic async callback on a tokio interval and hands back a handle
//! that cancels it.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Default tick period. Short relative to the 2 s minimum phase length.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(50);

// ============================================================================
// TickScheduler
// ============================================================================

/// Spawns periodic tick callbacks.
pub struct TickScheduler;

impl TickScheduler {
    /// Calls `callback` every `period` until the returned handle is
    /// cancelled or dropped.
    ///
    /// Missed ticks are skipped rather than replayed in a burst. The first
    /// tick fires immediately. Must be called inside a tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if `period` is zero.
    pub fn spawn<F, Fut>(period: Duration, mut callback: F) -> TickHandle
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (cancel_tx, mut cancel_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    changed = cancel_rx.changed() => {
                        if changed.is_err() || *cancel_rx.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => callback().await,
                }
            }

            tracing::debug!("tick scheduler stopped");
        });

        TickHandle {
            cancel_tx,
            task: Some(task),
        }
    }
}

// ============================================================================
// TickHandle
// ============================================================================

/// Handle to a running tick scheduler. Dropping it cancels the schedule.
pub struct TickHandle {
    cancel_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl TickHandle {
    /// Stops further ticks. A callback already in flight runs to completion.
    pub fn cancel(&self) {
        self.cancel_tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel_tx.borrow()
    }

    /// Cancels and waits for the tick task to exit.
    pub async fn shutdown(mut self) {
        self.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("tick task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
