//! Top-level error wrapper types.

use crate::{ConfigError, PublishError, ResourceError, StorageError};

/// Every error a mediastash crate can surface.
///
/// # Examples
///
/// ```
/// use mediastash_error::{MediaStashError, StorageError, StorageErrorKind};
///
/// let storage_err = StorageError::new(StorageErrorKind::Poisoned("rows".to_string()));
/// let err: MediaStashError = storage_err.into();
/// assert!(format!("{}", err).contains("Storage Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum MediaStashErrorKind {
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Content index storage error
    #[from(StorageError)]
    Storage(StorageError),
    /// Publish sequence error
    #[from(PublishError)]
    Publish(PublishError),
    /// Bundled resource error
    #[from(ResourceError)]
    Resource(ResourceError),
}

/// Mediastash error with kind discrimination.
///
/// # Examples
///
/// ```
/// use mediastash_error::{MediaStashError, MediaStashResult, ConfigError};
///
/// fn might_fail() -> MediaStashResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// match might_fail() {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Mediastash Error: {}", _0)]
pub struct MediaStashError(Box<MediaStashErrorKind>);

impl MediaStashError {
    /// Create a new error from a kind.
    pub fn new(kind: MediaStashErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &MediaStashErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to MediaStashErrorKind
impl<T> From<T> for MediaStashError
where
    T: Into<MediaStashErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for mediastash operations.
pub type MediaStashResult<T> = std::result::Result<T, MediaStashError>;
