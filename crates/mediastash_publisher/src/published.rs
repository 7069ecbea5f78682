//! Result of a successful publish.

use chrono::{DateTime, Utc};
use derive_getters::Getters;
use mediastash_core::{MediaCategory, MediaUri};

/// A committed, visible media entry.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct PublishedMedia {
    /// Handle of the committed entry
    uri: MediaUri,
    /// Category published under
    category: MediaCategory,
    /// Final display name (the index may have numbered it on collision)
    display_name: String,
    /// Directory below the volume root
    relative_path: String,
    /// MIME type recorded for the entry
    mime_type: String,
    /// Bytes written into the entry
    size_bytes: u64,
    /// Hex SHA-256 of the bytes written
    content_hash: String,
    /// Timestamp recorded in the entry's date column
    captured_at: DateTime<Utc>,
}

impl PublishedMedia {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        uri: MediaUri,
        category: MediaCategory,
        display_name: String,
        relative_path: String,
        mime_type: String,
        size_bytes: u64,
        content_hash: String,
        captured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            uri,
            category,
            display_name,
            relative_path,
            mime_type,
            size_bytes,
            content_hash,
            captured_at,
        }
    }
}
