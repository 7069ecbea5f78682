//! Index entry snapshots.

use derive_getters::Getters;
use mediastash_core::{MediaUri, PublishRecord, columns};
use std::path::PathBuf;

/// Snapshot of one entry as the index currently holds it.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct IndexEntry {
    /// Handle of the entry
    uri: MediaUri,
    /// Current metadata
    record: PublishRecord,
    /// Whether the entry is still reserved and hidden from queries
    pending: bool,
    /// Location of the entry's bytes
    path: PathBuf,
    /// Size of the entry's bytes
    size_bytes: u64,
}

impl IndexEntry {
    pub(crate) fn new(uri: MediaUri, record: PublishRecord, path: PathBuf, size_bytes: u64) -> Self {
        let pending = record.is_pending().unwrap_or(false);
        Self {
            uri,
            record,
            pending,
            path,
            size_bytes,
        }
    }

    /// Display name column, if set.
    pub fn display_name(&self) -> Option<&str> {
        self.record.text(columns::DISPLAY_NAME)
    }

    /// Relative path column, if set.
    pub fn relative_path(&self) -> Option<&str> {
        self.record.text(columns::RELATIVE_PATH)
    }

    /// MIME type column, if set.
    pub fn mime_type(&self) -> Option<&str> {
        self.record.text(columns::MIME_TYPE)
    }
}
