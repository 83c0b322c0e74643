//! Id generation.

use uuid::Uuid;

/// Generates a globally unique, opaque id for records and sync events.
///
/// Ids are assigned once at creation and stay stable across merges.
#[must_use]
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}
