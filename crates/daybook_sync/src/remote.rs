//! Remote object-storage abstraction.
//!
//! The real backend is any HTTP object store; the client only needs
//! conditional GET and unconditional PUT of whole documents. The trait is
//! kept transport-agnostic so different HTTP libraries (reqwest, ureq,
//! platform fetch) can plug in without a dependency here.

use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, VecDeque};

/// A response from the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteResponse {
    /// HTTP status code.
    pub status: u16,
    /// Version token of the stored document, when the backend returns one.
    pub etag: Option<String>,
    /// Response body.
    pub body: Vec<u8>,
}

impl RemoteResponse {
    /// Returns true for 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns true for 304 Not Modified.
    #[must_use]
    pub fn is_not_modified(&self) -> bool {
        self.status == 304
    }
}

/// The remote object-storage backend.
///
/// # Transport policy
///
/// Each call is attempted exactly once. Implementations must not retry;
/// retry behavior belongs to the outbound queue. A transport-level failure
/// (no status produced) is reported as the `Err` string.
pub trait RemoteStore: Send + Sync {
    /// Conditional GET of a document. When `if_none_match` equals the
    /// stored version token the backend answers 304 with an empty body.
    fn get(&self, key: &str, if_none_match: Option<&str>) -> Result<RemoteResponse, String>;

    /// Unconditional PUT of a document. Returns the new version token.
    fn put(&self, key: &str, body: &[u8]) -> Result<RemoteResponse, String>;
}

/// An in-memory remote store with real ETag / If-None-Match semantics.
///
/// Used by tests and as a loopback backend for local development. Version
/// tokens are a per-store counter.
#[derive(Debug, Default)]
pub struct MemoryRemote {
    objects: RwLock<HashMap<String, (String, Vec<u8>)>>,
    versions: Mutex<u64>,
}

impl MemoryRemote {
    /// Creates an empty remote store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a stored document's bytes.
    #[must_use]
    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.read().get(key).map(|(_, body)| body.clone())
    }

    /// Returns the keys stored under a prefix, sorted.
    #[must_use]
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .read()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    fn next_etag(&self) -> String {
        let mut version = self.versions.lock();
        *version += 1;
        format!("\"v{}\"", *version)
    }
}

impl RemoteStore for MemoryRemote {
    fn get(&self, key: &str, if_none_match: Option<&str>) -> Result<RemoteResponse, String> {
        match self.objects.read().get(key) {
            Some((etag, body)) => {
                if if_none_match == Some(etag.as_str()) {
                    Ok(RemoteResponse {
                        status: 304,
                        etag: Some(etag.clone()),
                        body: Vec::new(),
                    })
                } else {
                    Ok(RemoteResponse {
                        status: 200,
                        etag: Some(etag.clone()),
                        body: body.clone(),
                    })
                }
            }
            None => Ok(RemoteResponse {
                status: 404,
                etag: None,
                body: Vec::new(),
            }),
        }
    }

    fn put(&self, key: &str, body: &[u8]) -> Result<RemoteResponse, String> {
        let etag = self.next_etag();
        self.objects
            .write()
            .insert(key.to_string(), (etag.clone(), body.to_vec()));
        Ok(RemoteResponse {
            status: 200,
            etag: Some(etag),
            body: Vec::new(),
        })
    }
}

/// One call observed by a [`ScriptedRemote`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    /// A GET with its key and precondition.
    Get {
        /// Requested key.
        key: String,
        /// The `If-None-Match` token, if any.
        if_none_match: Option<String>,
    },
    /// A PUT with its key and body.
    Put {
        /// Requested key.
        key: String,
        /// Document bytes.
        body: Vec<u8>,
    },
}

/// A remote store answering from a script, for failure testing.
///
/// Responses are consumed in order regardless of method; an exhausted
/// script fails the call at the transport level.
#[derive(Debug, Default)]
pub struct ScriptedRemote {
    script: Mutex<VecDeque<Result<RemoteResponse, String>>>,
    calls: Mutex<Vec<RemoteCall>>,
}

impl ScriptedRemote {
    /// Creates a remote with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a plain status response to the script.
    pub fn respond_status(&self, status: u16) {
        self.script.lock().push_back(Ok(RemoteResponse {
            status,
            etag: None,
            body: Vec::new(),
        }));
    }

    /// Appends a full response to the script.
    pub fn respond(&self, response: RemoteResponse) {
        self.script.lock().push_back(Ok(response));
    }

    /// Appends a transport-level failure to the script.
    pub fn fail_transport(&self, message: &str) {
        self.script.lock().push_back(Err(message.to_string()));
    }

    /// Returns the calls made so far.
    #[must_use]
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().clone()
    }

    fn answer(&self) -> Result<RemoteResponse, String> {
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err("no scripted response set".into()))
    }
}

impl RemoteStore for ScriptedRemote {
    fn get(&self, key: &str, if_none_match: Option<&str>) -> Result<RemoteResponse, String> {
        self.calls.lock().push(RemoteCall::Get {
            key: key.to_string(),
            if_none_match: if_none_match.map(str::to_string),
        });
        self.answer()
    }

    fn put(&self, key: &str, body: &[u8]) -> Result<RemoteResponse, String> {
        self.calls.lock().push(RemoteCall::Put {
            key: key.to_string(),
            body: body.to_vec(),
        });
        self.answer()
    }
}
