//! Reservation ownership: every handle ends committed or rolled back.

use mediastash_core::MediaUri;
use mediastash_error::{PublishError, PublishErrorKind};
use mediastash_index::ContentIndex;
use tracing::{error, info, warn};

/// Exclusive owner of a pending entry.
///
/// Dropping an unresolved reservation (panic, early return) deletes it.
pub(crate) struct Reservation<'a, I: ContentIndex + ?Sized> {
    index: &'a I,
    uri: MediaUri,
    resolved: bool,
}

impl<'a, I: ContentIndex + ?Sized> Reservation<'a, I> {
    pub fn new(index: &'a I, uri: MediaUri) -> Self {
        Self {
            index,
            uri,
            resolved: false,
        }
    }

    pub fn uri(&self) -> &MediaUri {
        &self.uri
    }

    /// Mark the entry committed; it will no longer be deleted on drop.
    pub fn commit(mut self) -> MediaUri {
        self.resolved = true;
        self.uri.clone()
    }

    /// Delete the entry and build the error describing why.
    #[track_caller]
    pub fn roll_back(mut self, kind: PublishErrorKind) -> PublishError {
        let err = PublishError::new(kind);
        self.resolved = true;
        let rolled_back = Self::delete(self.index, &self.uri);
        err.with_rollback(rolled_back)
    }

    fn delete(index: &I, uri: &MediaUri) -> bool {
        match index.delete(uri) {
            Ok(rows) => {
                info!(uri = %uri, rows, "Rolled back reservation");
                true
            }
            Err(e) => {
                error!(uri = %uri, error = %e, "Rollback failed, pending entry left behind");
                false
            }
        }
    }
}

impl<I: ContentIndex + ?Sized> Drop for Reservation<'_, I> {
    fn drop(&mut self) {
        if !self.resolved {
            warn!(uri = %self.uri, "Reservation dropped unresolved");
            Self::delete(self.index, &self.uri);
        }
    }
}
