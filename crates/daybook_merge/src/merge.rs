//! Last-writer-wins merging of records, maps, and snapshots.

use crate::dedup::dedup_topics;
use daybook_model::{AppState, Contents, RecordMap, Settings, Stamped, StorageSettings};

/// Resolves two versions of one value by `updated` stamp.
///
/// `new` wins if `old` is absent, if `old` carries no stamp, or if both are
/// stamped and `new` is strictly later. In every other case `old` survives,
/// including the case where only `new` is unstamped.
pub fn merge_by_updated<T: Stamped>(old: Option<T>, new: Option<T>) -> Option<T> {
    match (old, new) {
        (None, new) => new,
        (old, None) => old,
        (Some(old), Some(new)) => match (old.updated(), new.updated()) {
            (None, _) => Some(new),
            (Some(a), Some(b)) if b > a => Some(new),
            _ => Some(old),
        },
    }
}

/// Merges two record maps: union of ids, per-id resolution via
/// [`merge_by_updated`].
///
/// The result starts as a copy of `a`, so ids only in `a` keep their
/// position and ids only in `b` are appended in `b`'s order.
#[must_use]
pub fn merge_records(a: &RecordMap, b: &RecordMap) -> RecordMap {
    let mut out = a.clone();
    for (id, incoming) in b {
        if let Some(merged) = merge_by_updated(out.get(id).cloned(), Some(incoming.clone())) {
            out.insert(id.clone(), merged);
        }
    }
    out
}

/// Merges storage settings by shallow field overwrite.
///
/// Wherever `b` carries a field it replaces `a`'s; timestamps play no part.
/// This covers credentials and the sync bookkeeping (`eTag`, `lastSynced`)
/// alike.
#[must_use]
pub fn merge_storage(a: &StorageSettings, b: &StorageSettings) -> StorageSettings {
    StorageSettings {
        endpoint: b.endpoint.clone().or_else(|| a.endpoint.clone()),
        bucket: b.bucket.clone().or_else(|| a.bucket.clone()),
        access_key: b.access_key.clone().or_else(|| a.access_key.clone()),
        secret_key: b.secret_key.clone().or_else(|| a.secret_key.clone()),
        e_tag: b.e_tag.clone().or_else(|| a.e_tag.clone()),
        last_synced: b.last_synced.or(a.last_synced),
    }
}

/// Reconciles two full snapshots into one.
///
/// Storage settings merge by field overwrite, today settings by
/// last-writer-wins, each content collection by [`merge_records`]; the
/// topics collection additionally passes through [`dedup_topics`] so the
/// content-identity invariant holds on the merged result.
#[must_use]
pub fn merge_state(local: &AppState, remote: &AppState) -> AppState {
    let today = merge_by_updated(
        Some(local.settings.today.clone()),
        Some(remote.settings.today.clone()),
    )
    .unwrap_or_default();

    AppState {
        settings: Settings {
            storage: merge_storage(&local.settings.storage, &remote.settings.storage),
            today,
        },
        contents: Contents {
            tasks: merge_records(&local.contents.tasks, &remote.contents.tasks),
            topics: dedup_topics(&merge_records(
                &local.contents.topics,
                &remote.contents.topics,
            )),
            notes: merge_records(&local.contents.notes, &remote.contents.notes),
            works: merge_records(&local.contents.works, &remote.contents.works),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daybook_model::Record;

    fn stamped(data: &str, updated: i64) -> Record {
        Record::new(data).with_updated(updated)
    }

    #[test]
    fn absent_side_yields_the_other() {
        let a = stamped("a", 1);
        assert_eq!(merge_by_updated(Some(a.clone()), None), Some(a.clone()));
        assert_eq!(merge_by_updated(None, Some(a.clone())), Some(a));
        assert_eq!(merge_by_updated::<Record>(None, None), None);
    }

    #[test]
    fn unstamped_old_always_loses() {
        let old = Record::new("never saved");
        let new = Record::new("saved once"); // also unstamped
        assert_eq!(
            merge_by_updated(Some(old.clone()), Some(new.clone())),
            Some(new)
        );

        let new = stamped("saved", 1);
        assert_eq!(merge_by_updated(Some(old), Some(new.clone())), Some(new));
    }

    #[test]
    fn unstamped_new_loses_to_stamped_old() {
        let old = stamped("kept", 1);
        let new = Record::new("never saved");
        assert_eq!(merge_by_updated(Some(old.clone()), Some(new)), Some(old));
    }

    #[test]
    fn later_stamp_wins_ties_keep_old() {
        let old = stamped("old", 10);
        let newer = stamped("new", 11);
        assert_eq!(
            merge_by_updated(Some(old.clone()), Some(newer.clone())),
            Some(newer)
        );

        let tied = stamped("tied", 10);
        assert_eq!(merge_by_updated(Some(old.clone()), Some(tied)), Some(old));
    }

    #[test]
    fn record_union_keeps_both_sides() {
        let mut a = RecordMap::new();
        a.insert("only-a".into(), stamped("a", 1));
        a.insert("shared".into(), stamped("local", 5));

        let mut b = RecordMap::new();
        b.insert("shared".into(), stamped("remote", 6));
        b.insert("only-b".into(), stamped("b", 2));

        let merged = merge_records(&a, &b);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged["only-a"].data, "a");
        assert_eq!(merged["only-b"].data, "b");
        assert_eq!(merged["shared"].data, "remote");
    }

    #[test]
    fn remote_task_with_later_stamp_wins() {
        // Local task updated 2024-01-01, remote 2024-01-02 (as epoch millis).
        let mut local = AppState::default();
        local
            .contents
            .tasks
            .insert("T".into(), stamped("a", 1_704_067_200_000));

        let mut remote = AppState::default();
        remote
            .contents
            .tasks
            .insert("T".into(), stamped("b", 1_704_153_600_000));

        let merged = merge_state(&local, &remote);
        assert_eq!(merged.contents.tasks["T"].data, "b");
        assert_eq!(merged.contents.tasks["T"].updated, Some(1_704_153_600_000));
    }

    #[test]
    fn storage_merges_by_field_overwrite_not_timestamp() {
        let local = StorageSettings {
            endpoint: Some("https://old.example.com".into()),
            bucket: Some("daybook".into()),
            e_tag: Some("v1".into()),
            ..StorageSettings::default()
        };
        let remote = StorageSettings {
            endpoint: Some("https://new.example.com".into()),
            last_synced: Some(9),
            ..StorageSettings::default()
        };

        let merged = merge_storage(&local, &remote);
        assert_eq!(merged.endpoint.as_deref(), Some("https://new.example.com"));
        assert_eq!(merged.bucket.as_deref(), Some("daybook"));
        assert_eq!(merged.e_tag.as_deref(), Some("v1"));
        assert_eq!(merged.last_synced, Some(9));
    }

    #[test]
    fn today_settings_merge_by_updated() {
        let mut local = AppState::default();
        local.settings.today.rollover_hour = Some(4);
        local.settings.today.updated = Some(10);

        let mut remote = AppState::default();
        remote.settings.today.rollover_hour = Some(6);
        remote.settings.today.updated = Some(20);

        let merged = merge_state(&local, &remote);
        assert_eq!(merged.settings.today.rollover_hour, Some(6));

        // Older remote loses.
        remote.settings.today.updated = Some(5);
        let merged = merge_state(&local, &remote);
        assert_eq!(merged.settings.today.rollover_hour, Some(4));
    }

    #[test]
    fn tombstones_propagate_through_merges() {
        let mut local = AppState::default();
        local.contents.notes.insert("n".into(), stamped("alive", 10));

        let mut remote = AppState::default();
        remote
            .contents
            .notes
            .insert("n".into(), stamped("alive", 10).tombstone(20));

        let merged = merge_state(&local, &remote);
        assert!(merged.contents.notes["n"].is_deleted());
    }

    #[test]
    fn merge_state_is_idempotent() {
        let mut state = AppState::default();
        state.settings.today.updated = Some(3);
        state.contents.tasks.insert("t".into(), stamped("task", 1));
        state.contents.topics.insert("x".into(), stamped("#work", 2));
        state.contents.topics.insert("y".into(), stamped("#home", 4));
        state.contents.notes.insert("n".into(), Record::new("draft"));

        assert_eq!(merge_state(&state, &state), state);
    }
}
