//! # Daybook Merge
//!
//! Pure functions that reconcile two snapshots of application state.
//!
//! The resolution rule everywhere is last-writer-wins on the `updated`
//! stamp, with a missing stamp treated as infinitely old: a record that was
//! never explicitly saved always loses to one that was. Merging is
//! idempotent, so two devices that exchange snapshots in any order converge
//! on the same state.
//!
//! On top of the per-record rule this crate implements:
//! - record-map union ([`merge_records`])
//! - whole-snapshot reconciliation ([`merge_state`])
//! - topic content deduplication ([`dedup_topics`])
//! - tombstone retention purge ([`purge_deleted`])
//!
//! No I/O happens here; the local store and sync client own persistence and
//! the network.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod dedup;
mod merge;
mod purge;

pub use dedup::dedup_topics;
pub use merge::{merge_by_updated, merge_records, merge_state, merge_storage};
pub use purge::{purge_deleted, DEFAULT_RETENTION_MS};
