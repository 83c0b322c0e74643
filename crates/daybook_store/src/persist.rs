//! Whole-document persistence backends.

use crate::error::StoreResult;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// The two durable local documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Document {
    /// The full application snapshot.
    Snapshot,
    /// The pending sync-event queue.
    Queue,
}

impl Document {
    /// File name of this document under the data directory.
    #[must_use]
    pub fn file_name(&self) -> &'static str {
        match self {
            Document::Snapshot => "snapshot.json",
            Document::Queue => "queue.json",
        }
    }
}

/// A durable store of whole documents.
///
/// Backends hold opaque bytes; the store owns all JSON interpretation.
///
/// # Invariants
///
/// - `save` replaces the document atomically - a reader (including a
///   crashed-and-restarted process) sees either the old bytes or the new
///   bytes, never a mix
/// - `load` returns exactly the bytes of the last successful `save`, or
///   `None` if the document was never saved
pub trait DocumentStore: Send + Sync {
    /// Loads a document, or `None` if it was never saved.
    fn load(&self, doc: Document) -> StoreResult<Option<Vec<u8>>>;

    /// Atomically replaces a document.
    fn save(&self, doc: Document, bytes: &[u8]) -> StoreResult<()>;
}

/// A file-backed document store: one file per document under a data
/// directory.
///
/// `save` writes a temporary file, syncs it, then renames it over the
/// target, so a crash mid-write leaves the previous document intact.
#[derive(Debug)]
pub struct FileDocumentStore {
    dir: PathBuf,
}

impl FileDocumentStore {
    /// Opens a document store rooted at `dir`, creating the directory if
    /// needed.
    pub fn open(dir: &Path) -> StoreResult<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Returns the data directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, doc: Document) -> PathBuf {
        self.dir.join(doc.file_name())
    }
}

impl DocumentStore for FileDocumentStore {
    fn load(&self, doc: Document) -> StoreResult<Option<Vec<u8>>> {
        match fs::read(self.path_for(doc)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, doc: Document, bytes: &[u8]) -> StoreResult<()> {
        let target = self.path_for(doc);
        let tmp = target.with_extension("json.tmp");

        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&tmp)?;
            file.write_all(bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &target)?;

        // Make the rename itself durable.
        if let Ok(dir) = File::open(&self.dir) {
            let _ = dir.sync_all();
        }

        Ok(())
    }
}

/// An in-memory document store for tests and ephemeral use.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    docs: RwLock<HashMap<Document, Vec<u8>>>,
}

impl MemoryDocumentStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn load(&self, doc: Document) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.docs.read().get(&doc).cloned())
    }

    fn save(&self, doc: Document, bytes: &[u8]) -> StoreResult<()> {
        self.docs.write().insert(doc, bytes.to_vec());
        Ok(())
    }
}
