//! Background retry of the outbound queue.

use crate::service::SyncService;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Interval between flush attempts.
///
/// Fixed, with no backoff: a single failed delivery costs one cheap PUT
/// per tick, and a constant interval keeps recovery latency bounded once
/// connectivity returns.
pub const FLUSH_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Periodically retries delivery of queued events until stopped.
///
/// Spawns one tokio task that sleeps for the interval and then flushes the
/// queue on a blocking thread. The task runs for the life of the flusher;
/// dropping it (or calling [`stop`](Self::stop)) cancels the loop.
#[derive(Default)]
pub struct QueueFlusher {
    handle: Mutex<Option<JoinHandle<()>>>,
    cancelled: Arc<AtomicBool>,
}

impl QueueFlusher {
    /// Creates a flusher that is not yet running.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the retry loop at the standard interval.
    ///
    /// Must be called from within a tokio runtime. Calling `start` again
    /// replaces the previous loop.
    pub fn start(&self, service: Arc<SyncService>) {
        self.start_with_delay(service, FLUSH_RETRY_DELAY);
    }

    /// Starts the retry loop with a custom interval.
    pub fn start_with_delay(&self, service: Arc<SyncService>, delay: Duration) {
        self.stop();
        self.cancelled.store(false, Ordering::SeqCst);

        let cancelled = Arc::clone(&self.cancelled);
        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(delay).await;
                if cancelled.load(Ordering::SeqCst) {
                    return;
                }

                let service = Arc::clone(&service);
                let attempt =
                    tokio::task::spawn_blocking(move || service.flush_queue()).await;
                match attempt {
                    Ok(Ok(report)) if report.remaining > 0 => {
                        debug!(remaining = report.remaining, "queue not yet drained");
                    }
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => warn!(error = %e, "queue flush failed"),
                    Err(e) => warn!(error = %e, "queue flush task panicked"),
                }
            }
        });
        *self.handle.lock() = Some(handle);
    }

    /// Stops the retry loop. Idempotent; safe to call when never started.
    pub fn stop(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.lock().take() {
            handle.abort();
        }
    }

    /// Returns true while the loop is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

impl Drop for QueueFlusher {
    fn drop(&mut self) {
        self.stop();
    }
}
