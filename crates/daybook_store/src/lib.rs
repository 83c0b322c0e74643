//! # Daybook Store
//!
//! Durable local persistence and the authoritative in-memory snapshot.
//!
//! Exactly two documents are persisted locally, both JSON: the full state
//! snapshot and the pending sync-event queue. Persistence is synchronous
//! and whole-document - a document is always replaced in one atomic step,
//! never partially updated.
//!
//! [`LocalStore`] owns the snapshot. Every mutation computes an entirely
//! new snapshot through the merge engine, persists it, then swaps it in;
//! readers never observe a partial state. After the local write completes,
//! the changed record is handed to a [`DeliverySink`] for opportunistic
//! point delivery to the remote store - local durability never waits on
//! the network.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod persist;
mod store;

pub use error::{StoreError, StoreResult};
pub use persist::{Document, DocumentStore, FileDocumentStore, MemoryDocumentStore};
pub use store::{DeliverySink, LocalStore, NullSink, SettingsPatch};
