//! # Daybook Model
//!
//! Entity model for Daybook, a local-first personal data manager.
//!
//! This crate defines the value shapes every other component relies on:
//! - [`Record`] - the base shape shared by tasks, topics, notes, and works
//! - [`AppState`] - the full application snapshot
//! - [`StorageSettings`] / [`TodaySettings`] - remote credentials and
//!   agenda-view preferences
//! - [`SyncEvent`] - a journaled copy of a record mutation, used by the
//!   durable outbound queue and the remote journal
//!
//! ## Conventions
//!
//! - Timestamps are milliseconds since the Unix epoch ([`Timestamp`])
//! - A record with no `updated` stamp was never explicitly saved and loses
//!   every last-writer-wins comparison against a stamped record
//! - Deletion is a tombstone (`deleted` stamp), not removal; merges need
//!   the tombstone to propagate the deletion to other devices
//! - Ids are opaque strings, assigned once at creation ([`new_id`])

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod event;
mod ids;
mod record;
mod settings;
mod state;
mod time;

pub use event::{EventPayload, EventTarget, EventValue, JournalEntry, SyncEvent};
pub use ids::new_id;
pub use record::{Record, Stamped};
pub use settings::{Settings, StorageSettings, TodaySettings};
pub use state::{AppState, Collection, Contents, RecordMap};
pub use time::{Clock, FixedClock, SystemClock, Timestamp};
