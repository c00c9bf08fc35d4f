//! # Debounce Scheduler
//!
//! Turns a stream of "state changed" pokes into one sync cycle after a quiet
//! period.
//!
//! ```text
//!  poke      poke            poke
//!   │         │               │
//!   ▼         ▼               ▼
//!   ├──15s──x ├──15s──────x   ├──────15s──────┤
//!                                             ▼
//!                                          callback()   (spawned)
//! ```
//!
//! Every poke restarts the timer. The callback runs on its own task, so a
//! slow cycle never delays the timer and a new cycle may start while an
//! earlier one is still in flight.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::error::{SyncError, SyncResult};

/// Work started when the timer expires.
pub type SyncCallback = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Pending pokes beyond this are dropped; one queued poke is as good as many.
const POKE_CHANNEL_CAPACITY: usize = 64;

pub struct DebounceScheduler {
    delay: Duration,
    callback: SyncCallback,
    poke_rx: mpsc::Receiver<()>,
    shutdown_rx: mpsc::Receiver<()>,
}

/// Handle for poking or stopping a running scheduler.
#[derive(Clone)]
pub struct DebounceHandle {
    poke_tx: mpsc::Sender<()>,
    shutdown_tx: mpsc::Sender<()>,
}

impl DebounceHandle {
    /// Restarts the timer.
    pub fn poke(&self) -> SyncResult<()> {
        match self.poke_tx.try_send(()) {
            Ok(()) | Err(mpsc::error::TrySendError::Full(())) => Ok(()),
            Err(mpsc::error::TrySendError::Closed(())) => {
                Err(SyncError::ChannelError("Debounce scheduler stopped".into()))
            }
        }
    }

    /// Stops the scheduler. A pending timer is discarded.
    pub async fn shutdown(&self) -> SyncResult<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| SyncError::ChannelError("Shutdown channel closed".into()))
    }
}

impl DebounceScheduler {
    pub fn new(delay: Duration, callback: SyncCallback) -> (Self, DebounceHandle) {
        let (poke_tx, poke_rx) = mpsc::channel(POKE_CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let scheduler = DebounceScheduler {
            delay,
            callback,
            poke_rx,
            shutdown_rx,
        };
        let handle = DebounceHandle {
            poke_tx,
            shutdown_tx,
        };
        (scheduler, handle)
    }

    /// Creates a scheduler and runs it on a new task.
    pub fn spawn(delay: Duration, callback: SyncCallback) -> DebounceHandle {
        let (scheduler, handle) = Self::new(delay, callback);
        tokio::spawn(scheduler.run());
        handle
    }

    pub async fn run(mut self) {
        info!(delay_secs = self.delay.as_secs(), "Debounce scheduler started");
        let mut deadline: Option<Instant> = None;

        loop {
            let sleep_until = deadline.unwrap_or_else(Instant::now);

            tokio::select! {
                Some(()) = self.poke_rx.recv() => {
                    deadline = Some(Instant::now() + self.delay);
                }

                _ = tokio::time::sleep_until(sleep_until), if deadline.is_some() => {
                    deadline = None;
                    debug!("Debounce timer expired");
                    tokio::spawn((self.callback)());
                }

                _ = self.shutdown_rx.recv() => {
                    break;
                }
            }
        }

        info!("Debounce scheduler stopped");
    }
}
