//! The durable outbound queue.

use daybook_model::SyncEvent;
use daybook_store::{Document, DocumentStore, StoreResult};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Outcome of one flush attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushReport {
    /// Events delivered and removed from the queue.
    pub delivered: usize,
    /// Events still pending after the attempt.
    pub remaining: usize,
}

/// A durable, ordered list of sync events awaiting delivery.
///
/// Persisted as its own document, separate from the snapshot, so pending
/// deliveries survive reloads. The queue is kept in non-decreasing
/// `updated` order (an unstamped event sorts first) and is flushed
/// strictly in stored order: the first failure stops the attempt, and only
/// the contiguous delivered prefix is removed. A persistently failing head
/// therefore blocks everything behind it until it succeeds.
///
/// The stored document is updated read-modify-write; a lock serializes
/// those updates so an event enqueued while a flush is out delivering is
/// never overwritten by the flush's save.
pub struct OutboundQueue {
    docs: Arc<dyn DocumentStore>,
    write: Mutex<()>,
}

impl OutboundQueue {
    /// Creates a queue over the given document backend.
    pub fn new(docs: Arc<dyn DocumentStore>) -> Self {
        Self {
            docs,
            write: Mutex::new(()),
        }
    }

    /// Loads the pending events.
    pub fn load(&self) -> StoreResult<Vec<SyncEvent>> {
        match self.docs.load(Document::Queue)? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(Vec::new()),
        }
    }

    /// Number of pending events.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.load()?.len())
    }

    /// Returns true if nothing is pending.
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Appends an event and persists the queue.
    ///
    /// The stored list is re-sorted by `updated` ascending (stable) before
    /// the append, so delivery order stays non-decreasing even when events
    /// were enqueued out of stamp order.
    pub fn enqueue(&self, event: SyncEvent) -> StoreResult<()> {
        let _guard = self.write.lock();
        let mut events = self.load()?;
        events.sort_by_key(|e| e.updated);
        events.push(event);
        self.save(&events)?;
        debug!(pending = events.len(), "event queued for later delivery");
        Ok(())
    }

    /// Delivers pending events in stored order via `deliver`, stopping at
    /// the first failure.
    ///
    /// Removes only the contiguous successfully-delivered prefix;
    /// surviving events are never reordered. The removal re-loads the
    /// stored list under the queue lock and drops the delivered events by
    /// id, so an event enqueued while delivery was in flight is kept. The
    /// lock is not held during delivery itself.
    pub fn flush<F, E>(&self, mut deliver: F) -> StoreResult<FlushReport>
    where
        F: FnMut(&SyncEvent) -> Result<(), E>,
        E: std::fmt::Display,
    {
        let events = self.load()?;
        let mut delivered = 0;

        for event in &events {
            match deliver(event) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    debug!(error = %e, event = %event.id, "flush stopped at first failure");
                    break;
                }
            }
        }

        if delivered == 0 {
            return Ok(FlushReport {
                delivered: 0,
                remaining: events.len(),
            });
        }

        let done: HashSet<&str> = events[..delivered].iter().map(|e| e.id.as_str()).collect();
        let _guard = self.write.lock();
        let pending: Vec<SyncEvent> = self
            .load()?
            .into_iter()
            .filter(|e| !done.contains(e.id.as_str()))
            .collect();
        self.save(&pending)?;
        Ok(FlushReport {
            delivered,
            remaining: pending.len(),
        })
    }

    fn save(&self, events: &[SyncEvent]) -> StoreResult<()> {
        let bytes = serde_json::to_vec(events)?;
        self.docs.save(Document::Queue, &bytes)
    }
}
