//! Volumes, collections and content URIs.

use crate::MediaCategory;
use mediastash_error::{StorageError, StorageErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const SCHEME_PREFIX: &str = "content://media/";

/// A named storage volume.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[display("{}", _0)]
#[serde(transparent)]
pub struct Volume(String);

impl Volume {
    /// Name of the primary shared external volume.
    pub const EXTERNAL_PRIMARY: &'static str = "external_primary";

    /// Create a volume from its name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The primary shared external volume.
    pub fn external_primary() -> Self {
        Self::new(Self::EXTERNAL_PRIMARY)
    }

    /// Volume name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::external_primary()
    }
}

/// A category-specific collection on one volume.
///
/// # Examples
///
/// ```
/// use mediastash_core::{Collection, MediaCategory, Volume};
///
/// let images = Collection::new(Volume::external_primary(), MediaCategory::Image);
/// assert_eq!(images.to_string(), "content://media/external_primary/images/media");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Collection {
    volume: Volume,
    category: MediaCategory,
}

impl Collection {
    /// Create a collection reference.
    pub fn new(volume: Volume, category: MediaCategory) -> Self {
        Self { volume, category }
    }

    /// Volume holding the collection.
    pub fn volume(&self) -> &Volume {
        &self.volume
    }

    /// Category of entries in the collection.
    pub fn category(&self) -> MediaCategory {
        self.category
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}/{}/media",
            SCHEME_PREFIX,
            self.volume,
            self.category.collection_segment()
        )
    }
}

/// Opaque handle to one entry in a collection.
///
/// Returned by the index when a record is inserted; renders as
/// `content://media/<volume>/<collection>/media/<id>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MediaUri {
    collection: Collection,
    id: Uuid,
}

impl MediaUri {
    /// Create a handle for an entry.
    pub fn new(collection: Collection, id: Uuid) -> Self {
        Self { collection, id }
    }

    /// Collection the entry belongs to.
    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    /// Entry identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl std::fmt::Display for MediaUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

impl std::str::FromStr for MediaUri {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || StorageError::new(StorageErrorKind::InvalidUri(s.to_string()));

        let rest = s.strip_prefix(SCHEME_PREFIX).ok_or_else(invalid)?;
        let parts: Vec<&str> = rest.split('/').collect();
        let [volume, segment, "media", id] = parts.as_slice() else {
            return Err(invalid());
        };
        if volume.is_empty() {
            return Err(invalid());
        }
        let category = MediaCategory::from_collection_segment(segment).ok_or_else(invalid)?;
        let id = Uuid::parse_str(id).map_err(|_| invalid())?;

        Ok(Self::new(
            Collection::new(Volume::new(*volume), category),
            id,
        ))
    }
}
