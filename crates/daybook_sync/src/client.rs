//! Cloud sync client: conditional pull, unconditional push, journal PUTs.

use crate::error::{SyncError, SyncResult};
use crate::notify::Notifier;
use crate::remote::RemoteStore;
use daybook_merge::{merge_state, purge_deleted, DEFAULT_RETENTION_MS};
use daybook_model::{AppState, Clock, JournalEntry, StorageSettings};
use std::sync::Arc;
use tracing::{debug, warn};

/// Fixed key of the snapshot document on the remote store.
pub const SNAPSHOT_KEY: &str = "state.json";

const MSG_NOT_SET_UP: &str = "Sync not set up!";
const MSG_RETRY: &str = "Sync failed, will retry automatically";
const MSG_AUTH: &str = "Sync sign-in failed, check your storage credentials";
const MSG_REDIRECT: &str = "Sync failed, check your storage endpoint";
const MSG_SYNCED: &str = "Synced";

/// Performs the remote half of a sync cycle.
///
/// All remote failures are classified and converted to notifications at
/// this boundary; only fatal ones (unexpected redirects, unparseable
/// documents) surface as errors, and none ever corrupt the caller's
/// snapshot. Each remote call is attempted exactly once.
pub struct CloudClient {
    remote: Arc<dyn RemoteStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    retention: i64,
}

impl CloudClient {
    /// Creates a client over the given remote store.
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            remote,
            notifier,
            clock,
            retention: DEFAULT_RETENTION_MS,
        }
    }

    /// Sets the tombstone retention window applied on pull.
    #[must_use]
    pub fn with_retention(mut self, retention: i64) -> Self {
        self.retention = retention;
        self
    }

    /// Pulls the remote snapshot and merges it into `state`.
    ///
    /// The GET is conditioned on the cached ETag via `If-None-Match`. On
    /// success the merged, retention-purged state is returned with the new
    /// ETag recorded. 304 and 404 are success with no remote change. Any
    /// transient or auth failure degrades to a local no-op: the caller
    /// gets its own (purged) state back and the user is notified. Only
    /// unexpected redirects and unparseable bodies surface as errors.
    pub fn pull(&self, state: &AppState) -> SyncResult<AppState> {
        if !state.settings.storage.is_configured() {
            self.notifier.notify(MSG_NOT_SET_UP);
            return Err(SyncError::NotConfigured);
        }

        let now = self.clock.now();
        let purged = purge_deleted(state, now, self.retention);

        let response = match self
            .remote
            .get(SNAPSHOT_KEY, state.settings.storage.e_tag.as_deref())
        {
            Ok(response) => response,
            Err(message) => {
                warn!(error = %message, "pull transport failure");
                self.notifier.notify(MSG_RETRY);
                return Ok(purged);
            }
        };

        if response.is_not_modified() || response.status == 404 {
            debug!(status = response.status, "remote snapshot unchanged");
            return Ok(purged);
        }

        if let Some(err) = SyncError::classify_status(response.status) {
            return match err {
                SyncError::Auth(_) => {
                    self.notifier.notify(MSG_AUTH);
                    Ok(purged)
                }
                // A redirect is a hard failure nothing retries; the message
                // must not promise one.
                SyncError::Redirect(_) => {
                    self.notifier.notify(MSG_REDIRECT);
                    Err(err)
                }
                _ => {
                    self.notifier.notify(MSG_RETRY);
                    Ok(purged)
                }
            };
        }

        let remote_state: AppState = serde_json::from_slice(&response.body).map_err(|e| {
            warn!(error = %e, "remote snapshot failed to parse");
            self.notifier.notify(MSG_RETRY);
            SyncError::from(e)
        })?;

        let mut merged = purge_deleted(&merge_state(state, &remote_state), now, self.retention);
        if response.etag.is_some() {
            merged.settings.storage.e_tag = response.etag;
        }
        debug!("pulled and merged remote snapshot");
        Ok(merged)
    }

    /// Pushes the exportable form of `state` (credentials stripped) to the
    /// snapshot document.
    ///
    /// The PUT is unconditional: no `If-Match` guards it, so two devices
    /// pushing concurrently can clobber each other at the storage layer;
    /// the merge engine reconciles their contents on the next pull either
    /// way. `last_synced` is stamped and the user notified regardless of
    /// outcome - a push failure never blocks local progress.
    pub fn push(&self, state: &AppState) -> SyncResult<AppState> {
        if !state.settings.storage.is_configured() {
            self.notifier.notify(MSG_NOT_SET_UP);
            return Err(SyncError::NotConfigured);
        }

        let body = serde_json::to_vec(&state.export())?;
        let mut out = state.clone();

        match self.remote.put(SNAPSHOT_KEY, &body) {
            Ok(response) if response.is_success() => {
                if response.etag.is_some() {
                    out.settings.storage.e_tag = response.etag;
                }
                debug!("pushed snapshot");
                self.notifier.notify(MSG_SYNCED);
            }
            Ok(response) => match SyncError::classify_status(response.status) {
                Some(SyncError::Auth(_)) => self.notifier.notify(MSG_AUTH),
                _ => self.notifier.notify(MSG_RETRY),
            },
            Err(message) => {
                warn!(error = %message, "push transport failure");
                self.notifier.notify(MSG_RETRY);
            }
        }

        out.settings.storage.last_synced = Some(self.clock.now());
        Ok(out)
    }

    /// Writes one journal document under the event's own key.
    ///
    /// Failures are classified and returned; the outbound queue owns all
    /// retrying, so nothing is notified or swallowed here.
    pub fn push_event(&self, storage: &StorageSettings, entry: &JournalEntry) -> SyncResult<()> {
        if !storage.is_configured() {
            return Err(SyncError::NotConfigured);
        }

        let key = format!("journal/{}", entry.id);
        let body = serde_json::to_vec(entry)?;
        let response = self
            .remote
            .put(&key, &body)
            .map_err(SyncError::Transport)?;

        if let Some(err) = SyncError::classify_status(response.status) {
            return Err(err);
        }
        debug!(key = %key, "journal entry delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::MemoryNotifier;
    use crate::remote::{MemoryRemote, RemoteCall, ScriptedRemote};
    use daybook_model::{
        Collection, EventValue, FixedClock, Record, SyncEvent,
    };

    fn configured_state() -> AppState {
        let mut state = AppState::default();
        state.settings.storage.endpoint = Some("https://objects.example.com".into());
        state.settings.storage.bucket = Some("daybook".into());
        state.settings.storage.access_key = Some("AK".into());
        state.settings.storage.secret_key = Some("SK".into());
        state
    }

    fn client_over(
        remote: Arc<dyn RemoteStore>,
    ) -> (CloudClient, Arc<MemoryNotifier>, Arc<FixedClock>) {
        let notifier = Arc::new(MemoryNotifier::new());
        let clock = Arc::new(FixedClock::new(5_000));
        let client = CloudClient::new(remote, notifier.clone(), clock.clone());
        (client, notifier, clock)
    }

    #[test]
    fn unconfigured_pull_makes_no_network_call() {
        let remote = Arc::new(ScriptedRemote::new());
        let (client, notifier, _clock) = client_over(remote.clone());

        let err = client.pull(&AppState::default()).unwrap_err();
        assert!(matches!(err, SyncError::NotConfigured));
        assert!(remote.calls().is_empty());
        assert!(notifier.saw("Sync not set up!"));
    }

    #[test]
    fn pull_merges_remote_and_records_etag() {
        let remote = Arc::new(MemoryRemote::new());
        let mut on_remote = AppState::default();
        on_remote
            .contents
            .tasks
            .insert("T".into(), Record::new("b").with_updated(20));
        remote
            .put(SNAPSHOT_KEY, &serde_json::to_vec(&on_remote.export()).unwrap())
            .unwrap();

        let (client, _notifier, _clock) = client_over(remote);
        let mut local = configured_state();
        local
            .contents
            .tasks
            .insert("T".into(), Record::new("a").with_updated(10));

        let merged = client.pull(&local).unwrap();
        assert_eq!(merged.contents.tasks["T"].data, "b");
        assert!(merged.settings.storage.e_tag.is_some());
        // Credentials are untouched by the merge.
        assert_eq!(merged.settings.storage.access_key.as_deref(), Some("AK"));
    }

    #[test]
    fn pull_sends_the_cached_etag_and_honors_not_modified() {
        let remote = Arc::new(MemoryRemote::new());
        remote
            .put(
                SNAPSHOT_KEY,
                &serde_json::to_vec(&AppState::default()).unwrap(),
            )
            .unwrap();

        let (client, _notifier, _clock) = client_over(remote.clone());
        let local = configured_state();

        // First pull records the ETag; second pull gets a 304 and returns
        // the local state unchanged.
        let after_first = client.pull(&local).unwrap();
        let etag = after_first.settings.storage.e_tag.clone().unwrap();
        let after_second = client.pull(&after_first).unwrap();
        assert_eq!(after_second.settings.storage.e_tag.as_deref(), Some(etag.as_str()));
        assert_eq!(after_second.contents, after_first.contents);
    }

    #[test]
    fn pull_degrades_to_local_noop_on_server_error() {
        let remote = Arc::new(ScriptedRemote::new());
        remote.respond_status(500);
        let (client, notifier, _clock) = client_over(remote);

        let mut local = configured_state();
        local
            .contents
            .notes
            .insert("n".into(), Record::new("kept").with_updated(1));

        let out = client.pull(&local).unwrap();
        assert_eq!(out.contents, local.contents);
        assert!(notifier.saw("retry automatically"));
    }

    #[test]
    fn pull_purges_expired_tombstones_even_without_remote_change() {
        let remote = Arc::new(ScriptedRemote::new());
        remote.respond_status(404);
        let (client, _notifier, clock) = client_over(remote);

        let mut local = configured_state();
        local
            .contents
            .tasks
            .insert("dead".into(), Record::new("x").tombstone(0));
        clock.set(DEFAULT_RETENTION_MS + 10);

        let out = client.pull(&local).unwrap();
        assert!(!out.contents.tasks.contains_key("dead"));
    }

    #[test]
    fn pull_surfaces_redirects_and_parse_failures() {
        let remote = Arc::new(ScriptedRemote::new());
        remote.respond_status(302);
        let (client, notifier, _clock) = client_over(remote);
        assert!(matches!(
            client.pull(&configured_state()),
            Err(SyncError::Redirect(302))
        ));
        // Nothing retries a redirect, so the message must not claim so.
        assert!(notifier.saw("check your storage endpoint"));
        assert!(!notifier.saw("retry automatically"));

        let remote = Arc::new(ScriptedRemote::new());
        remote.respond(crate::remote::RemoteResponse {
            status: 200,
            etag: Some("\"v1\"".into()),
            body: b"{ not json".to_vec(),
        });
        let (client, _notifier, _clock) = client_over(remote);
        assert!(matches!(
            client.pull(&configured_state()),
            Err(SyncError::Parse(_))
        ));
    }

    #[test]
    fn push_strips_credentials_and_stamps_last_synced() {
        let remote = Arc::new(MemoryRemote::new());
        let (client, notifier, _clock) = client_over(remote.clone());

        let mut state = configured_state();
        state
            .contents
            .tasks
            .insert("t".into(), Record::new("task").with_updated(1));

        let out = client.push(&state).unwrap();
        assert_eq!(out.settings.storage.last_synced, Some(5_000));
        assert!(out.settings.storage.e_tag.is_some());
        assert!(notifier.saw("Synced"));

        let stored: AppState =
            serde_json::from_slice(&remote.object(SNAPSHOT_KEY).unwrap()).unwrap();
        assert_eq!(stored.settings.storage, StorageSettings::default());
        assert_eq!(stored.contents.tasks["t"].data, "task");
    }

    #[test]
    fn push_failure_still_stamps_last_synced() {
        let remote = Arc::new(ScriptedRemote::new());
        remote.respond_status(500);
        let (client, notifier, _clock) = client_over(remote);

        let out = client.push(&configured_state()).unwrap();
        assert_eq!(out.settings.storage.last_synced, Some(5_000));
        assert_eq!(out.settings.storage.e_tag, None);
        assert!(notifier.saw("retry automatically"));
    }

    #[test]
    fn push_event_writes_under_the_journal_key() {
        let remote = Arc::new(MemoryRemote::new());
        let (client, _notifier, _clock) = client_over(remote.clone());

        let record = Record::new("task").with_updated(9);
        let event = SyncEvent::record_value(Collection::Tasks, "t1", record.clone());
        let entry = JournalEntry::new(&event, EventValue::Record(record));

        client
            .push_event(&configured_state().settings.storage, &entry)
            .unwrap();

        let keys = remote.keys_with_prefix("journal/");
        assert_eq!(keys, vec![format!("journal/{}", entry.id)]);
        let stored: JournalEntry =
            serde_json::from_slice(&remote.object(&keys[0]).unwrap()).unwrap();
        assert_eq!(stored, entry);
    }

    #[test]
    fn push_event_classifies_failures_for_the_queue() {
        let remote = Arc::new(ScriptedRemote::new());
        remote.respond_status(503);
        remote.respond_status(403);
        remote.fail_transport("connection refused");
        let (client, _notifier, _clock) = client_over(remote);

        let event = SyncEvent::record_value(Collection::Notes, "n", Record::new("x"));
        let entry = JournalEntry::new(&event, EventValue::Record(Record::new("x")));
        let storage = configured_state().settings.storage;

        assert!(matches!(
            client.push_event(&storage, &entry),
            Err(SyncError::Server(503))
        ));
        assert!(matches!(
            client.push_event(&storage, &entry),
            Err(SyncError::Auth(403))
        ));
        assert!(matches!(
            client.push_event(&storage, &entry),
            Err(SyncError::Transport(_))
        ));
        assert!(matches!(
            client.push_event(&StorageSettings::default(), &entry),
            Err(SyncError::NotConfigured)
        ));
    }

    #[test]
    fn pull_uses_if_none_match_header() {
        let remote = Arc::new(ScriptedRemote::new());
        remote.respond_status(304);
        let (client, _notifier, _clock) = client_over(remote.clone());

        let mut state = configured_state();
        state.settings.storage.e_tag = Some("\"v7\"".into());
        client.pull(&state).unwrap();

        assert_eq!(
            remote.calls(),
            vec![RemoteCall::Get {
                key: SNAPSHOT_KEY.into(),
                if_none_match: Some("\"v7\"".into())
            }]
        );
    }
}
