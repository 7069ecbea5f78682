//! Core data types for mediastash.
//!
//! This crate holds the data model shared by the content index and the publisher:
//!
//! - [`MediaCategory`] - Image, video or audio
//! - [`Volume`], [`Collection`], [`MediaUri`] - Where entries live and how they are addressed
//! - [`PublishRecord`] - Metadata field map submitted to the index
//! - [`CategoryProfile`] - Per-category literal values (directory, MIME type, naming rule)
//! - [`MediaPayload`] - What is being published

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod category;
pub mod columns;
mod location;
mod payload;
mod profile;
mod record;

pub use category::MediaCategory;
pub use location::{Collection, MediaUri, Volume};
pub use payload::MediaPayload;
pub use profile::{CategoryProfile, DisplayNameRule};
pub use record::{FieldValue, PublishRecord};
