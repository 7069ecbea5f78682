//! Per-category publishing profiles.

use crate::{MediaCategory, PublishRecord, columns};
use std::path::Path;

/// How the display name of a new entry is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayNameRule {
    /// `<epoch-millis><suffix>`
    Timestamped {
        /// Fixed tail appended after the timestamp
        suffix: &'static str,
    },
    /// The source file's own name, verbatim
    SourceFileName,
}

impl DisplayNameRule {
    /// Derive a display name.
    ///
    /// Returns `None` for [`DisplayNameRule::SourceFileName`] when the source
    /// is absent or has no file name component.
    pub fn derive(&self, captured_at_millis: i64, source: Option<&Path>) -> Option<String> {
        match self {
            DisplayNameRule::Timestamped { suffix } => {
                Some(format!("{}{}", captured_at_millis, suffix))
            }
            DisplayNameRule::SourceFileName => source
                .and_then(Path::file_name)
                .map(|name| name.to_string_lossy().into_owned()),
        }
    }
}

/// Literal values that distinguish one category's publish sequence from another.
///
/// # Examples
///
/// ```
/// use mediastash_core::{CategoryProfile, MediaCategory};
///
/// let profile = CategoryProfile::for_category(MediaCategory::Video);
/// assert_eq!(profile.relative_path(), "Movies");
/// assert_eq!(profile.mime_type(), "videos/mp4");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CategoryProfile {
    category: MediaCategory,
    relative_path: &'static str,
    mime_type: &'static str,
    timestamp_key: &'static str,
    display_name: DisplayNameRule,
}

/// Pictures: JPEG bitmaps named `<millis>_image.jpg`.
const IMAGE_PROFILE: CategoryProfile = CategoryProfile {
    category: MediaCategory::Image,
    relative_path: "Pictures",
    mime_type: "image/jpg",
    timestamp_key: columns::DATE_TAKEN,
    display_name: DisplayNameRule::Timestamped {
        suffix: "_image.jpg",
    },
};

/// Movies: copied files named `<millis>_video.mp4`.
const VIDEO_PROFILE: CategoryProfile = CategoryProfile {
    category: MediaCategory::Video,
    relative_path: "Movies",
    mime_type: "videos/mp4",
    timestamp_key: columns::DATE_ADDED,
    display_name: DisplayNameRule::Timestamped {
        suffix: "_video.mp4",
    },
};

/// Music: copied files keeping their own file name.
const AUDIO_PROFILE: CategoryProfile = CategoryProfile {
    category: MediaCategory::Audio,
    relative_path: "Music",
    mime_type: "audio/mpeg",
    timestamp_key: columns::DATE_ADDED,
    display_name: DisplayNameRule::SourceFileName,
};

impl CategoryProfile {
    /// Profile for a category.
    pub fn for_category(category: MediaCategory) -> &'static CategoryProfile {
        match category {
            MediaCategory::Image => &IMAGE_PROFILE,
            MediaCategory::Video => &VIDEO_PROFILE,
            MediaCategory::Audio => &AUDIO_PROFILE,
        }
    }

    /// Category this profile describes.
    pub fn category(&self) -> MediaCategory {
        self.category
    }

    /// Directory below the volume root.
    pub fn relative_path(&self) -> &'static str {
        self.relative_path
    }

    /// MIME type string, stored verbatim.
    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    /// Column receiving the capture timestamp.
    pub fn timestamp_key(&self) -> &'static str {
        self.timestamp_key
    }

    /// Display name rule.
    pub fn display_name(&self) -> DisplayNameRule {
        self.display_name
    }

    /// Build the pending record submitted on insert.
    pub fn pending_record(&self, display_name: &str, captured_at_millis: i64) -> PublishRecord {
        PublishRecord::new()
            .with(columns::RELATIVE_PATH, self.relative_path)
            .with(columns::DISPLAY_NAME, display_name)
            .with(columns::MIME_TYPE, self.mime_type)
            .with(self.timestamp_key, captured_at_millis)
            .with(columns::IS_PENDING, true)
    }
}
