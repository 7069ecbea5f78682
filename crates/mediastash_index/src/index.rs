//! Content index trait definition.

use crate::IndexEntry;
use mediastash_core::{Collection, MediaUri, PublishRecord};
use mediastash_error::MediaStashResult;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

/// Where a read stream should come from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::From)]
pub enum ReadSource {
    /// An entry held by the index
    Entry(MediaUri),
    /// A plain file outside the index
    File(PathBuf),
}

/// The platform's shared media catalog, as seen by a publisher.
///
/// All calls block; run them on a pool suited to blocking I/O. Callers must
/// insert before streaming or updating, and only update or delete handles
/// they obtained from [`ContentIndex::insert`].
pub trait ContentIndex: Send + Sync {
    /// Reserve a new pending entry described by `record`.
    ///
    /// # Returns
    ///
    /// `None` when the index declines the reservation (e.g. the volume is not mounted).
    fn insert(
        &self,
        collection: &Collection,
        record: &PublishRecord,
    ) -> MediaStashResult<Option<MediaUri>>;

    /// Open a stream that replaces the bytes of a pending entry.
    ///
    /// # Returns
    ///
    /// `None` if the entry is unknown or no longer writable.
    fn open_write(&self, uri: &MediaUri) -> MediaStashResult<Option<Box<dyn Write + Send>>>;

    /// Open a stream over an entry's bytes or an outside file.
    ///
    /// # Returns
    ///
    /// `None` if the source does not exist.
    fn open_read(&self, source: &ReadSource) -> MediaStashResult<Option<Box<dyn Read + Send>>>;

    /// Merge `record` into an entry's metadata.
    ///
    /// Clearing `is_pending` publishes the entry.
    ///
    /// # Returns
    ///
    /// Number of entries changed (0 or 1).
    fn update(&self, uri: &MediaUri, record: &PublishRecord) -> MediaStashResult<usize>;

    /// Remove an entry and its bytes.
    ///
    /// # Returns
    ///
    /// Number of entries removed (0 or 1).
    fn delete(&self, uri: &MediaUri) -> MediaStashResult<usize>;

    /// Owner view of one entry, pending or not.
    fn entry(&self, uri: &MediaUri) -> MediaStashResult<Option<IndexEntry>>;

    /// Entries visible to other readers: pending entries are excluded.
    fn query(&self, collection: &Collection) -> MediaStashResult<Vec<IndexEntry>>;
}

impl<T: ContentIndex + ?Sized> ContentIndex for Arc<T> {
    fn insert(
        &self,
        collection: &Collection,
        record: &PublishRecord,
    ) -> MediaStashResult<Option<MediaUri>> {
        (**self).insert(collection, record)
    }

    fn open_write(&self, uri: &MediaUri) -> MediaStashResult<Option<Box<dyn Write + Send>>> {
        (**self).open_write(uri)
    }

    fn open_read(&self, source: &ReadSource) -> MediaStashResult<Option<Box<dyn Read + Send>>> {
        (**self).open_read(source)
    }

    fn update(&self, uri: &MediaUri, record: &PublishRecord) -> MediaStashResult<usize> {
        (**self).update(uri, record)
    }

    fn delete(&self, uri: &MediaUri) -> MediaStashResult<usize> {
        (**self).delete(uri)
    }

    fn entry(&self, uri: &MediaUri) -> MediaStashResult<Option<IndexEntry>> {
        (**self).entry(uri)
    }

    fn query(&self, collection: &Collection) -> MediaStashResult<Vec<IndexEntry>> {
        (**self).query(collection)
    }
}
