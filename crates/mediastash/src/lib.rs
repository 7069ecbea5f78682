//! mediastash: publish images, audio and video into a shared media index.
//!
//! Every publish either produces exactly one visible entry or leaves no trace:
//! the payload is written into a pending reservation, which is then committed
//! by clearing its pending flag, or deleted if anything goes wrong.
//!
//! # Example
//!
//! ```no_run
//! use mediastash::{MediaStash, MediaStashConfig, init_tracing};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MediaStashConfig::load()?;
//! init_tracing(config.logging())?;
//!
//! let stash = MediaStash::open(&config)?;
//! let chime = stash.materializer().materialize("chime.mp3")?;
//! let published = stash.publisher().save_audio(chime).await?;
//! println!("published {}", published.uri());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod observability;
mod stash;

pub use config::{IndexConfig, LoggingConfig, MediaStashConfig, PublisherConfig, ResourcesConfig};
pub use observability::init_tracing;
pub use stash::MediaStash;

// Re-export workspace crates
pub use mediastash_core::*;
pub use mediastash_error::*;
pub use mediastash_index::*;
pub use mediastash_publisher::*;
