//! The base record shape shared by tasks, topics, notes, and works.

use crate::time::Timestamp;
use serde::{Deserialize, Serialize};

/// A value that carries an optional `updated` stamp and participates in
/// last-writer-wins merges.
///
/// A missing stamp means "never explicitly saved" and is treated as older
/// than any present stamp.
pub trait Stamped {
    /// Returns the time of the last explicit save, if any.
    fn updated(&self) -> Option<Timestamp>;
}

/// A single user-editable record.
///
/// All four content collections (tasks, topics, notes, works) share this
/// shape. Records are never mutated in place; every change produces a new
/// value that is folded into the snapshot by the merge engine.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Record {
    /// Primary content payload.
    #[serde(default)]
    pub data: String,

    /// Set once, on first successful save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<Timestamp>,

    /// Set on every save. Absent means the record never won a merge yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<Timestamp>,

    /// Tombstone marker. Present means logically deleted; the entry is
    /// retained until the retention purge removes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<Timestamp>,

    /// Scheduling marker placing the record on the day-bounded agenda view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub today: Option<Timestamp>,

    /// Done/completed flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive: Option<bool>,
}

impl Record {
    /// Creates a fresh, unstamped record with the given content.
    #[must_use]
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            ..Self::default()
        }
    }

    /// Sets the `updated` stamp (builder style).
    #[must_use]
    pub fn with_updated(mut self, updated: Timestamp) -> Self {
        self.updated = Some(updated);
        self
    }

    /// Returns true if this record is a tombstone.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted.is_some()
    }

    /// Builds the tombstone for this record.
    ///
    /// Existing fields are preserved; `updated` and `deleted` are both set
    /// to `now` so the deletion wins last-writer-wins merges against any
    /// older copy of the record.
    #[must_use]
    pub fn tombstone(&self, now: Timestamp) -> Self {
        let mut dead = self.clone();
        dead.updated = Some(now);
        dead.deleted = Some(now);
        dead
    }

    /// Content used for topic identity: the payload with surrounding
    /// whitespace stripped.
    #[must_use]
    pub fn normalized_data(&self) -> &str {
        self.data.trim()
    }
}

impl Stamped for Record {
    fn updated(&self) -> Option<Timestamp> {
        self.updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_is_unstamped() {
        let record = Record::new("buy milk");
        assert_eq!(record.data, "buy milk");
        assert_eq!(record.created, None);
        assert_eq!(record.updated, None);
        assert!(!record.is_deleted());
    }

    #[test]
    fn tombstone_preserves_fields_and_stamps_both() {
        let record = Record {
            data: "old note".into(),
            created: Some(10),
            updated: Some(20),
            today: Some(30),
            archive: Some(true),
            ..Record::default()
        };

        let dead = record.tombstone(99);
        assert_eq!(dead.data, "old note");
        assert_eq!(dead.created, Some(10));
        assert_eq!(dead.today, Some(30));
        assert_eq!(dead.archive, Some(true));
        assert_eq!(dead.updated, Some(99));
        assert_eq!(dead.deleted, Some(99));
        assert!(dead.is_deleted());
    }

    #[test]
    fn normalized_data_trims_whitespace() {
        let record = Record::new("  #work \n");
        assert_eq!(record.normalized_data(), "#work");
    }

    #[test]
    fn absent_stamps_stay_off_the_wire() {
        let record = Record::new("a");
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"data":"a"}"#);

        let back: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn unknown_absent_fields_default_on_parse() {
        let record: Record = serde_json::from_str(r#"{"data":"x","updated":5}"#).unwrap();
        assert_eq!(record.updated, Some(5));
        assert_eq!(record.deleted, None);
        assert_eq!(record.archive, None);
    }
}
