//! ``src/controller/monitor.rs``
//!
//! # Staleness monitor
//!
//! A background ticker wakes the event loop at a fixed interval; the event
//! loop then asks the session manager to compare each session's directory
//! mtime against the one recorded at its last scan. The ticker itself never
//! touches session state.

use std::path::Path;
use std::time::{Duration, SystemTime};

use tokio::sync::mpsc::{self, Receiver, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);

/// `observed` is `None` when the directory could not be stat'ed.
#[must_use]
pub fn is_stale(observed: Option<SystemTime>, last_known: SystemTime) -> bool {
    observed.is_none_or(|modified| modified > last_known)
}

/// Current mtime of `path`, or `None` if it cannot be read.
pub async fn observe_mtime(path: &Path) -> Option<SystemTime> {
    tokio::fs::metadata(path).await.ok()?.modified().ok()
}

#[derive(Debug, Clone, Copy)]
pub struct StalenessMonitor {
    interval: Duration,
}

impl Default for StalenessMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl StalenessMonitor {
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Start ticking. Ticks that arrive while the previous one is still
    /// pending are dropped.
    pub fn spawn(&self, cancel: CancellationToken) -> (Receiver<()>, JoinHandle<()>) {
        let (tick_tx, tick_rx) = mpsc::channel::<()>(1);
        let period: Duration = self.interval;

        let handle: JoinHandle<()> = tokio::spawn(async move {
            let mut ticker: Interval = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,

                    _ = ticker.tick() => match tick_tx.try_send(()) {
                        Ok(()) | Err(TrySendError::Full(())) => {}
                        Err(TrySendError::Closed(())) => break,
                    },
                }
            }

            debug!("Staleness monitor stopped");
        });

        (tick_rx, handle)
    }
}
