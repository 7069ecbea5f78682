//! Media category enumeration.

use serde::{Deserialize, Serialize};

/// Logical category of a media entry.
///
/// The category selects the target collection, the default relative
/// directory, the MIME type, and the display-name rule.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumIter,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum MediaCategory {
    /// Still pictures, published as JPEG
    #[display("image")]
    Image,
    /// Movies, copied from an existing file
    #[display("video")]
    Video,
    /// Music, copied from an existing file
    #[display("audio")]
    Audio,
}

impl MediaCategory {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaCategory::Image => "image",
            MediaCategory::Video => "video",
            MediaCategory::Audio => "audio",
        }
    }

    /// Path segment naming this category's collection in a content URI.
    pub fn collection_segment(&self) -> &'static str {
        match self {
            MediaCategory::Image => "images",
            MediaCategory::Video => "video",
            MediaCategory::Audio => "audio",
        }
    }

    /// Inverse of [`MediaCategory::collection_segment`].
    pub fn from_collection_segment(segment: &str) -> Option<Self> {
        match segment {
            "images" => Some(MediaCategory::Image),
            "video" => Some(MediaCategory::Video),
            "audio" => Some(MediaCategory::Audio),
            _ => None,
        }
    }
}

impl std::str::FromStr for MediaCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(MediaCategory::Image),
            "video" => Ok(MediaCategory::Video),
            "audio" => Ok(MediaCategory::Audio),
            _ => Err(format!("Unknown media category: {}", s)),
        }
    }
}
