//! Sync events: journaled copies of record mutations.
//!
//! Every mutation that must reach the remote store is described by a
//! [`SyncEvent`]. Events live in the durable outbound queue until delivered
//! and are written to the remote journal one document per event.

use crate::ids::new_id;
use crate::record::{Record, Stamped};
use crate::settings::TodaySettings;
use crate::state::Collection;
use crate::time::Timestamp;
use serde::{Deserialize, Serialize};

/// Where an event's change belongs in the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EventTarget {
    /// A record in one of the content collections.
    #[serde(rename_all = "camelCase")]
    Collection {
        /// The collection the record belongs to.
        collection: Collection,
        /// The record id.
        id: String,
    },
    /// The agenda-view settings.
    Today,
}

/// The value carried by an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum EventValue {
    /// A record mutation.
    Record(Record),
    /// An agenda-settings mutation.
    Today(TodaySettings),
}

/// How an event's value is obtained at delivery time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum EventPayload {
    /// Resolve the record from the live snapshot when the event is
    /// delivered. Used for ordinary saves so rapid successive edits
    /// collapse into one journal write of the latest state.
    Reference,
    /// A copy captured at mutation time. Used for tombstones (the referent
    /// may be purged before delivery) and for settings.
    Value(EventValue),
}

/// One entry in the durable outbound queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncEvent {
    /// Event id; also names the journal document.
    pub id: String,
    /// Where the change belongs.
    pub target: EventTarget,
    /// The `updated` stamp of the mutation, used to keep the queue in
    /// non-decreasing delivery order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<Timestamp>,
    /// How to obtain the value at delivery time.
    pub payload: EventPayload,
}

impl SyncEvent {
    /// Event for an ordinary record save, resolved at delivery time.
    #[must_use]
    pub fn record_reference(
        collection: Collection,
        id: impl Into<String>,
        updated: Option<Timestamp>,
    ) -> Self {
        Self {
            id: new_id(),
            target: EventTarget::Collection {
                collection,
                id: id.into(),
            },
            updated,
            payload: EventPayload::Reference,
        }
    }

    /// Event carrying a captured record copy (tombstones).
    #[must_use]
    pub fn record_value(collection: Collection, id: impl Into<String>, record: Record) -> Self {
        Self {
            id: new_id(),
            target: EventTarget::Collection {
                collection,
                id: id.into(),
            },
            updated: record.updated,
            payload: EventPayload::Value(EventValue::Record(record)),
        }
    }

    /// Event carrying an agenda-settings change.
    #[must_use]
    pub fn today_value(today: TodaySettings) -> Self {
        Self {
            id: new_id(),
            target: EventTarget::Today,
            updated: today.updated,
            payload: EventPayload::Value(EventValue::Today(today)),
        }
    }

    /// Key of this event's journal document on the remote store.
    #[must_use]
    pub fn journal_key(&self) -> String {
        format!("journal/{}", self.id)
    }
}

impl Stamped for SyncEvent {
    fn updated(&self) -> Option<Timestamp> {
        self.updated
    }
}

/// The document written to the remote journal for one delivered event.
///
/// This is the event with its payload resolved to a concrete value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    /// The originating event id.
    pub id: String,
    /// Where the change belongs.
    pub target: EventTarget,
    /// The `updated` stamp of the mutation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<Timestamp>,
    /// The resolved value.
    pub value: EventValue,
}

impl JournalEntry {
    /// Builds the journal document for an event and its resolved value.
    #[must_use]
    pub fn new(event: &SyncEvent, value: EventValue) -> Self {
        Self {
            id: event.id.clone(),
            target: event.target.clone(),
            updated: event.updated,
            value,
        }
    }
}
