//! Publish payloads.

use crate::MediaCategory;
use image::DynamicImage;
use std::path::{Path, PathBuf};

/// What is being published.
#[derive(Debug, Clone, derive_more::From)]
pub enum MediaPayload {
    /// In-memory bitmap, encoded to JPEG on publish
    Image(DynamicImage),
    /// Existing file whose bytes are copied verbatim
    File(PathBuf),
}

impl MediaPayload {
    /// Wrap a file path.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        MediaPayload::File(path.into())
    }

    /// Short name of the payload kind, used in errors and logs.
    pub fn kind_name(&self) -> &'static str {
        match self {
            MediaPayload::Image(_) => "bitmap",
            MediaPayload::File(_) => "file",
        }
    }

    /// Whether this payload can be published under `category`.
    ///
    /// Bitmaps go to pictures; files go to movies or music.
    pub fn fits(&self, category: MediaCategory) -> bool {
        matches!(
            (self, category),
            (MediaPayload::Image(_), MediaCategory::Image)
                | (MediaPayload::File(_), MediaCategory::Video | MediaCategory::Audio)
        )
    }

    /// Source path for file payloads.
    pub fn source_path(&self) -> Option<&Path> {
        match self {
            MediaPayload::Image(_) => None,
            MediaPayload::File(path) => Some(path),
        }
    }
}
