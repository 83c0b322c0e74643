//! Tombstone retention purge.

use daybook_model::{AppState, Collection, Timestamp};

/// Default retention window for tombstones: 30 days.
pub const DEFAULT_RETENTION_MS: i64 = 30 * 24 * 60 * 60 * 1000;

/// Drops tombstones older than the retention window.
///
/// A tombstone must outlive the window so every device has a chance to pull
/// the deletion; after that it is physically removed. Live records are
/// never touched. Runs on the merged result of every pull.
#[must_use]
pub fn purge_deleted(state: &AppState, now: Timestamp, retention: i64) -> AppState {
    let mut out = state.clone();
    for collection in Collection::ALL {
        out.contents
            .get_mut(collection)
            .retain(|_, record| match record.deleted {
                Some(deleted_at) => now.saturating_sub(deleted_at) <= retention,
                None => true,
            });
    }
    out
}
