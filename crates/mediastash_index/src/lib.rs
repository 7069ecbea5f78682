//! Content index for mediastash.
//!
//! This crate defines the contract the publisher relies on ([`ContentIndex`]) and a
//! filesystem-backed implementation ([`FileSystemIndex`]).
//!
//! # Features
//!
//! - **Reservations**: Inserted entries stay pending (invisible to queries) until committed
//! - **Atomic publish**: Committing renames the pending file into its collection directory
//! - **Expiry**: Abandoned pending entries carry an expiry and can be purged
//!
//! # Example
//!
//! ```rust
//! use mediastash_core::{columns, Collection, MediaCategory, PublishRecord, Volume};
//! use mediastash_index::{ContentIndex, FileSystemIndex};
//! use std::io::Write;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let index = FileSystemIndex::open("/tmp/mediastash")?;
//! let music = Collection::new(Volume::external_primary(), MediaCategory::Audio);
//! let record = PublishRecord::new()
//!     .with(columns::RELATIVE_PATH, "Music")
//!     .with(columns::DISPLAY_NAME, "song.mp3")
//!     .with(columns::IS_PENDING, true);
//!
//! if let Some(uri) = index.insert(&music, &record)? {
//!     if let Some(mut out) = index.open_write(&uri)? {
//!         out.write_all(b"ID3")?;
//!         out.flush()?;
//!     }
//!     index.update(&uri, &PublishRecord::commit())?;
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod catalog;
mod entry;
mod filesystem;
mod index;

pub use entry::IndexEntry;
pub use filesystem::FileSystemIndex;
pub use index::{ContentIndex, ReadSource};
