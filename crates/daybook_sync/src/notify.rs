//! Notification sink: how sync status reaches the user.

use parking_lot::Mutex;
use tracing::info;

/// Surfaces sync status and errors to the user.
///
/// The UI layer supplies the real implementation; the core only pushes
/// short human-readable messages through it.
pub trait Notifier: Send + Sync {
    /// Shows one message to the user.
    fn notify(&self, message: &str);
}

/// A notifier that writes to the log. Default for headless use.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        info!("{message}");
    }
}

/// A notifier that captures messages, for tests.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    messages: Mutex<Vec<String>>,
}

impl MemoryNotifier {
    /// Creates an empty notifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all messages seen so far.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    /// Returns true if any message contains the given fragment.
    #[must_use]
    pub fn saw(&self, fragment: &str) -> bool {
        self.messages.lock().iter().any(|m| m.contains(fragment))
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}
