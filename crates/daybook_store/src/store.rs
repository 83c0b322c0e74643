//! The authoritative local store.

use crate::error::StoreResult;
use crate::persist::{Document, DocumentStore};
use daybook_merge::{dedup_topics, merge_by_updated, merge_records, merge_state, merge_storage};
use daybook_model::{
    AppState, Clock, Collection, Record, RecordMap, StorageSettings, SyncEvent, TodaySettings,
};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, warn};

/// Receives changed records for opportunistic point delivery after a local
/// mutation has been persisted.
///
/// Implementations must not block the caller on network work; the sync
/// service hands the event off to a background task. The mutation that
/// produced the event has already completed and been persisted locally by
/// the time `submit` runs, so delivery failures cost nothing locally.
pub trait DeliverySink: Send + Sync {
    /// Accepts one event for delivery.
    fn submit(&self, event: SyncEvent);
}

/// A sink that drops every event. Used until a sync service is attached,
/// and by tools that operate purely locally.
#[derive(Debug, Default)]
pub struct NullSink;

impl DeliverySink for NullSink {
    fn submit(&self, _event: SyncEvent) {}
}

/// A settings mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsPatch {
    /// Remote credentials and sync bookkeeping. Merged by field overwrite;
    /// never delivered as a sync event - credentials stay on the device.
    Storage(StorageSettings),
    /// Agenda-view preferences. Merged by last-writer-wins; delivered.
    Today(TodaySettings),
}

/// Owns the single authoritative in-memory snapshot.
///
/// Every mutation follows the same pattern: take the write lock, compute a
/// whole new snapshot by merging the change into the current one, persist
/// the new snapshot synchronously, swap it in, release the lock, then hand
/// the changed record to the delivery sink. A failed persist leaves the
/// previous snapshot fully intact, in memory and on disk.
pub struct LocalStore {
    docs: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    state: RwLock<AppState>,
    sink: RwLock<Arc<dyn DeliverySink>>,
}

impl LocalStore {
    /// Creates a store over the given document backend and clock, starting
    /// from the default snapshot. Call [`LocalStore::load_from_disk`] to
    /// pick up persisted state.
    pub fn new(docs: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            docs,
            clock,
            state: RwLock::new(AppState::default()),
            sink: RwLock::new(Arc::new(NullSink)),
        }
    }

    /// Attaches the delivery sink. Mutations made before this point are
    /// still durable locally; only their point delivery is skipped.
    pub fn set_delivery_sink(&self, sink: Arc<dyn DeliverySink>) {
        *self.sink.write() = sink;
    }

    /// Returns a copy of the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> AppState {
        self.state.read().clone()
    }

    /// Loads any persisted snapshot and merges it into a freshly built
    /// default state; with nothing persisted the defaults are used as-is.
    ///
    /// A document that fails to parse surfaces as an error and leaves the
    /// in-memory state untouched.
    pub fn load_from_disk(&self) -> StoreResult<()> {
        let next = match self.docs.load(Document::Snapshot)? {
            Some(bytes) => {
                let persisted: AppState = serde_json::from_slice(&bytes).inspect_err(|e| {
                    warn!(error = %e, "persisted snapshot failed to parse");
                })?;
                merge_state(&AppState::default(), &persisted)
            }
            None => {
                debug!("no persisted snapshot, starting from defaults");
                AppState::default()
            }
        };
        *self.state.write() = next;
        Ok(())
    }

    /// Applies a settings mutation.
    pub fn put_settings(&self, patch: SettingsPatch) -> StoreResult<()> {
        let mut guard = self.state.write();
        let mut next = guard.clone();

        let event = match patch {
            SettingsPatch::Storage(storage) => {
                next.settings.storage = merge_storage(&next.settings.storage, &storage);
                None
            }
            SettingsPatch::Today(mut today) => {
                today.updated = Some(self.clock.now());
                next.settings.today =
                    merge_by_updated(Some(next.settings.today.clone()), Some(today))
                        .unwrap_or_default();
                Some(SyncEvent::today_value(next.settings.today.clone()))
            }
        };

        self.persist(&next)?;
        *guard = next;
        drop(guard);

        if let Some(event) = event {
            self.sink.read().submit(event);
        }
        Ok(())
    }

    /// Merges a single record into the named collection and triggers point
    /// delivery of it.
    ///
    /// Stamps `updated` with the current time, and `created` once on the
    /// first save of the id. Returns the record as stored.
    pub fn put_record(
        &self,
        collection: Collection,
        id: impl Into<String>,
        item: Record,
    ) -> StoreResult<Record> {
        let id = id.into();
        let mut guard = self.state.write();
        let now = self.clock.now();

        let existing = guard.contents.get(collection).get(&id).cloned();
        let mut item = item;
        item.updated = Some(now);
        item.created = existing.as_ref().and_then(|e| e.created).or(Some(now));

        let mut next = guard.clone();
        let stored = merge_by_updated(existing, Some(item)).unwrap_or_default();
        next.contents
            .get_mut(collection)
            .insert(id.clone(), stored.clone());
        if collection == Collection::Topics {
            next.contents.topics = dedup_topics(&next.contents.topics);
        }

        self.persist(&next)?;
        *guard = next;
        drop(guard);

        self.sink
            .read()
            .submit(SyncEvent::record_reference(collection, &id, stored.updated));
        Ok(stored)
    }

    /// Tombstones the records the selector names and triggers point
    /// delivery of each tombstone.
    ///
    /// The id list is resolved by calling `select_ids` under the write
    /// lock, so the selection always sees the latest snapshot rather than
    /// whatever a caller captured earlier. Ids with no record are skipped.
    /// Returns the number of records tombstoned.
    pub fn delete_records(
        &self,
        collection: Collection,
        select_ids: impl FnOnce() -> Vec<String>,
    ) -> StoreResult<usize> {
        let mut guard = self.state.write();
        let now = self.clock.now();
        let ids = select_ids();

        let mut batch = RecordMap::new();
        for id in ids {
            if let Some(existing) = guard.contents.get(collection).get(&id) {
                batch.insert(id, existing.tombstone(now));
            }
        }
        if batch.is_empty() {
            return Ok(0);
        }

        let mut next = guard.clone();
        let merged = merge_records(next.contents.get(collection), &batch);
        *next.contents.get_mut(collection) = if collection == Collection::Topics {
            dedup_topics(&merged)
        } else {
            merged
        };

        self.persist(&next)?;
        *guard = next;
        drop(guard);

        let sink = self.sink.read().clone();
        for (id, dead) in &batch {
            sink.submit(SyncEvent::record_value(collection, id, dead.clone()));
        }
        Ok(batch.len())
    }

    /// Merges an externally supplied snapshot (an imported file) into the
    /// current one, persists, and returns the merged state.
    pub fn load_from_external(&self, snapshot: AppState) -> StoreResult<AppState> {
        let mut guard = self.state.write();
        let merged = merge_state(&guard, &snapshot);
        self.persist(&merged)?;
        *guard = merged.clone();
        Ok(merged)
    }

    /// Persists and adopts an already-merged snapshot wholesale.
    ///
    /// Used by the sync service after a pull or push, where the snapshot
    /// has already been through the merge engine and the retention purge -
    /// re-merging would resurrect purged tombstones.
    pub fn replace(&self, snapshot: AppState) -> StoreResult<()> {
        let mut guard = self.state.write();
        self.persist(&snapshot)?;
        *guard = snapshot;
        Ok(())
    }

    /// Serializes the exportable form of the snapshot (storage settings
    /// stripped) for file export.
    pub fn export_json(&self) -> StoreResult<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(&self.snapshot().export())?)
    }

    /// Parses an exported file and merges it into the current snapshot.
    ///
    /// A parse failure surfaces without touching the live snapshot.
    pub fn import_json(&self, bytes: &[u8]) -> StoreResult<AppState> {
        let snapshot: AppState = serde_json::from_slice(bytes)?;
        self.load_from_external(snapshot)
    }

    fn persist(&self, state: &AppState) -> StoreResult<()> {
        let bytes = serde_json::to_vec(state)?;
        self.docs.save(Document::Snapshot, &bytes)?;
        debug!(bytes = bytes.len(), "persisted snapshot");
        Ok(())
    }
}
