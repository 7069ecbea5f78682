//! Media publishing for mediastash.
//!
//! [`MediaPublisher`] turns a payload and a category into exactly one visible
//! entry in a [`ContentIndex`](mediastash_index::ContentIndex), or leaves no
//! trace at all:
//!
//! 1. Build a pending [`PublishRecord`](mediastash_core::PublishRecord) from the category profile
//! 2. Reserve an entry with `insert`
//! 3. Stream the payload into the reservation (JPEG encode or file copy)
//! 4. Commit by clearing the pending flag
//! 5. On any failure, delete the reservation and report a typed error
//!
//! [`ResourceMaterializer`] copies bundled raw resources into a cache directory.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cancel;
mod materializer;
mod published;
mod publisher;
mod reservation;
mod writer;

pub use cancel::CancellationFlag;
pub use materializer::{EmbeddedResources, ResourceBundle, ResourceMaterializer};
pub use published::PublishedMedia;
pub use publisher::{DEFAULT_JPEG_QUALITY, MediaPublisher};
