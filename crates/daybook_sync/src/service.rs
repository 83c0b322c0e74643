//! The sync service: point delivery, queue wiring, and the full cycle.

use crate::client::CloudClient;
use crate::error::{SyncError, SyncResult};
use crate::notify::Notifier;
use crate::queue::{FlushReport, OutboundQueue};
use daybook_model::{EventPayload, EventTarget, EventValue, JournalEntry, SyncEvent};
use daybook_store::{DeliverySink, LocalStore};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, warn};

const MSG_NOT_SET_UP: &str = "Sync not set up!";
const MSG_RETRY: &str = "Sync failed, will retry automatically";
const MSG_AUTH: &str = "Sync sign-in failed, check your storage credentials";

/// Where a full sync cycle currently stands.
///
/// A failure at `Pulling` or `Pushing` aborts the remaining transitions,
/// but local state is already persisted and consistent from the prior
/// step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// No cycle in progress.
    Idle,
    /// Fetching and merging the remote snapshot.
    Pulling,
    /// Merged result adopted locally; about to push.
    Merged,
    /// Writing the merged snapshot back.
    Pushing,
}

/// Wires the local store, cloud client, and outbound queue together.
///
/// Mutations reach this service through [`DeliverySink`]: the store hands
/// over each changed record after persisting it, and the service attempts
/// one immediate point delivery, falling back to the durable queue on any
/// failure.
pub struct SyncService {
    store: Arc<LocalStore>,
    client: CloudClient,
    queue: OutboundQueue,
    notifier: Arc<dyn Notifier>,
    phase: RwLock<SyncPhase>,
}

impl SyncService {
    /// Creates the service. Attach it to the store with
    /// [`LocalStore::set_delivery_sink`] to activate point delivery.
    pub fn new(
        store: Arc<LocalStore>,
        client: CloudClient,
        queue: OutboundQueue,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            client,
            queue,
            notifier,
            phase: RwLock::new(SyncPhase::Idle),
        }
    }

    /// Returns the current cycle phase.
    #[must_use]
    pub fn phase(&self) -> SyncPhase {
        *self.phase.read()
    }

    /// Returns the outbound queue.
    #[must_use]
    pub fn queue(&self) -> &OutboundQueue {
        &self.queue
    }

    /// Attempts one immediate point delivery of an event; on any failure
    /// (including sync being unconfigured) notifies the user and enqueues
    /// the event for later retry.
    pub fn sync_item(&self, event: SyncEvent) {
        if let Err(e) = self.deliver(&event) {
            match e {
                SyncError::NotConfigured => self.notifier.notify(MSG_NOT_SET_UP),
                SyncError::Auth(_) => self.notifier.notify(MSG_AUTH),
                _ => self.notifier.notify(MSG_RETRY),
            }
            if let Err(queue_err) = self.queue.enqueue(event) {
                // Queue persistence failing means the event is lost unless
                // a later full sync pushes the snapshot; log loudly.
                warn!(error = %queue_err, "failed to persist queued event");
            }
        }
    }

    /// Delivers the queue's pending events in order, stopping at the
    /// first failure.
    pub fn flush_queue(&self) -> SyncResult<FlushReport> {
        let report = self.queue.flush(|event| self.deliver(event))?;
        if report.delivered > 0 {
            debug!(
                delivered = report.delivered,
                remaining = report.remaining,
                "flushed outbound queue"
            );
        }
        Ok(report)
    }

    /// Runs a full sync cycle: `Idle -> Pulling -> Merged -> Pushing ->
    /// Idle`.
    ///
    /// Pulls the remote snapshot, adopts the merged result locally, then
    /// pushes it back and records the bookkeeping (`eTag`, `lastSynced`).
    /// Every adopted snapshot is persisted before the next step, so an
    /// abort leaves a consistent local state.
    pub fn sync_all(&self) -> SyncResult<()> {
        let result = self.run_cycle();
        *self.phase.write() = SyncPhase::Idle;
        result
    }

    fn run_cycle(&self) -> SyncResult<()> {
        *self.phase.write() = SyncPhase::Pulling;
        let merged = self.client.pull(&self.store.snapshot())?;

        *self.phase.write() = SyncPhase::Merged;
        self.store.replace(merged.clone())?;

        *self.phase.write() = SyncPhase::Pushing;
        let pushed = self.client.push(&merged)?;
        self.store.replace(pushed)?;
        Ok(())
    }

    fn deliver(&self, event: &SyncEvent) -> SyncResult<()> {
        let snapshot = self.store.snapshot();

        let value = match &event.payload {
            EventPayload::Value(value) => Some(value.clone()),
            EventPayload::Reference => match &event.target {
                EventTarget::Collection { collection, id } => snapshot
                    .contents
                    .get(*collection)
                    .get(id)
                    .cloned()
                    .map(EventValue::Record),
                EventTarget::Today => Some(EventValue::Today(snapshot.settings.today.clone())),
            },
        };

        let Some(value) = value else {
            // The referent was purged before delivery; nothing to journal.
            debug!(event = %event.id, "dropping event for vanished record");
            return Ok(());
        };

        let entry = JournalEntry::new(event, value);
        self.client
            .push_event(&snapshot.settings.storage, &entry)
    }
}

impl DeliverySink for SyncService {
    fn submit(&self, event: SyncEvent) {
        self.sync_item(event);
    }
}

/// A delivery sink that hands events to the sync service on a background
/// task, so mutations never wait on the network.
///
/// Requires a tokio runtime; capture the handle where the runtime exists
/// and construct the sink there.
pub struct BackgroundSink {
    service: Arc<SyncService>,
    handle: tokio::runtime::Handle,
}

impl BackgroundSink {
    /// Creates a sink over the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn new(service: Arc<SyncService>) -> Self {
        Self {
            service,
            handle: tokio::runtime::Handle::current(),
        }
    }
}

impl DeliverySink for BackgroundSink {
    fn submit(&self, event: SyncEvent) {
        let service = Arc::clone(&self.service);
        self.handle.spawn_blocking(move || service.sync_item(event));
    }
}
