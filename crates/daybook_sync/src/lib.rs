//! # Daybook Sync
//!
//! Opportunistic synchronization of the Daybook snapshot against a single
//! remote blob store, plus at-least-once delivery of per-record journal
//! events.
//!
//! ## Architecture
//!
//! - [`RemoteStore`] abstracts the object-storage backend (one fixed key
//!   for the snapshot document, a key per event under `journal/`). Each
//!   call is attempted exactly once; all retrying layers on top.
//! - [`CloudClient`] performs the conditional pull (ETag / If-None-Match),
//!   the unconditional push, and single journal PUTs, classifying every
//!   failure into the [`SyncError`] taxonomy.
//! - [`OutboundQueue`] is the durable, ordered queue of events not yet
//!   confirmed delivered; flushing stops at the first failure and removes
//!   only the contiguous delivered prefix.
//! - [`QueueFlusher`] retries the flush on a fixed 60-second interval
//!   until explicitly stopped.
//! - [`SyncService`] wires the local store, client, and queue together and
//!   drives the full cycle `Idle -> Pulling -> Merged -> Pushing -> Idle`.
//!
//! ## Key invariants
//!
//! - The local mutation has been persisted before any network attempt
//!   starts; no remote failure can corrupt the local snapshot
//! - Journal events reach the remote in non-decreasing `updated` order; a
//!   failing head blocks the events behind it
//! - No credentials configured means no network call, ever

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod error;
mod flusher;
mod notify;
mod queue;
mod remote;
mod service;

pub use client::{CloudClient, SNAPSHOT_KEY};
pub use error::{SyncError, SyncResult};
pub use flusher::{QueueFlusher, FLUSH_RETRY_DELAY};
pub use notify::{LogNotifier, MemoryNotifier, Notifier};
pub use queue::{FlushReport, OutboundQueue};
pub use remote::{MemoryRemote, RemoteCall, RemoteResponse, RemoteStore, ScriptedRemote};
pub use service::{BackgroundSink, SyncPhase, SyncService};
