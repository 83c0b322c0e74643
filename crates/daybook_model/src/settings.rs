//! Storage credentials and agenda-view settings.

use crate::record::Stamped;
use crate::time::Timestamp;
use serde::{Deserialize, Serialize};

/// Remote object-storage credentials plus sync bookkeeping.
///
/// The four credential fields address the remote store; `e_tag` and
/// `last_synced` track the conditional-pull state. Storage settings merge
/// by blunt per-field overwrite, never by timestamp, and never leave the
/// device as a sync event.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageSettings {
    /// Remote endpoint URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Bucket (or container) holding the snapshot and journal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    /// Access key id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,
    /// Secret access key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
    /// ETag of the last snapshot read from the remote store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e_tag: Option<String>,
    /// Time of the last completed push.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_synced: Option<Timestamp>,
}

impl StorageSettings {
    /// Returns true if all four credential fields are present and
    /// non-empty. No network call is attempted otherwise.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        [
            &self.endpoint,
            &self.bucket,
            &self.access_key,
            &self.secret_key,
        ]
        .iter()
        .all(|field| field.as_deref().is_some_and(|v| !v.is_empty()))
    }
}

/// Preferences for the day-bounded agenda view.
///
/// Carries its own `updated` stamp and merges whole via last-writer-wins,
/// like a record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TodaySettings {
    /// Whether archived records stay visible on the agenda.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_archived: Option<bool>,
    /// Hour of day (local) at which the agenda rolls over.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollover_hour: Option<u8>,
    /// Time of the last explicit save.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<Timestamp>,
}

impl Stamped for TodaySettings {
    fn updated(&self) -> Option<Timestamp> {
        self.updated
    }
}

/// All settings: remote storage plus agenda preferences.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Remote credentials and sync bookkeeping. Local-only.
    pub storage: StorageSettings,
    /// Agenda-view preferences. Synced.
    pub today: TodaySettings,
}
