//! The full application snapshot.

use crate::record::Record;
use crate::settings::{Settings, StorageSettings};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An id-keyed record collection preserving insertion order.
///
/// Insertion order matters: topic deduplication scans entries in stable
/// order so the surviving id for a duplicated content value is
/// deterministic.
pub type RecordMap = IndexMap<String, Record>;

/// The four content collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    /// Actionable items.
    Tasks,
    /// Tags/areas with a content-identity invariant.
    Topics,
    /// Free-form notes.
    Notes,
    /// Library items (books, articles, media).
    Works,
}

impl Collection {
    /// All collections, in snapshot order.
    pub const ALL: [Collection; 4] = [
        Collection::Tasks,
        Collection::Topics,
        Collection::Notes,
        Collection::Works,
    ];

    /// Stable string name, as used in event targets and journal documents.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Tasks => "tasks",
            Collection::Topics => "topics",
            Collection::Notes => "notes",
            Collection::Works => "works",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The record collections of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Contents {
    /// Task records.
    pub tasks: RecordMap,
    /// Topic records.
    pub topics: RecordMap,
    /// Note records.
    pub notes: RecordMap,
    /// Work records.
    pub works: RecordMap,
}

impl Contents {
    /// Returns the named collection.
    #[must_use]
    pub fn get(&self, collection: Collection) -> &RecordMap {
        match collection {
            Collection::Tasks => &self.tasks,
            Collection::Topics => &self.topics,
            Collection::Notes => &self.notes,
            Collection::Works => &self.works,
        }
    }

    /// Returns the named collection mutably.
    pub fn get_mut(&mut self, collection: Collection) -> &mut RecordMap {
        match collection {
            Collection::Tasks => &mut self.tasks,
            Collection::Topics => &mut self.topics,
            Collection::Notes => &mut self.notes,
            Collection::Works => &mut self.works,
        }
    }

    /// Total number of entries across all collections, tombstones included.
    #[must_use]
    pub fn len(&self) -> usize {
        Collection::ALL.iter().map(|c| self.get(*c).len()).sum()
    }

    /// Returns true if every collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The full application state at a point in time.
///
/// This is the unit of persistence and of merging: mutations never update a
/// snapshot in place, they build a new one and swap it in whole.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppState {
    /// Storage and agenda settings.
    pub settings: Settings,
    /// The four record collections.
    pub contents: Contents,
}

impl AppState {
    /// Returns the exportable form of this snapshot: everything except the
    /// storage settings block. Credentials and sync bookkeeping never leave
    /// the device in a snapshot document or export file.
    #[must_use]
    pub fn export(&self) -> AppState {
        let mut out = self.clone();
        out.settings.storage = StorageSettings::default();
        out
    }
}
