//! Error types for the mediastash library.
//!
//! This crate provides the foundation error types used throughout the mediastash workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern for clean error handling:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use mediastash_error::{MediaStashResult, ConfigError};
//!
//! fn load_settings() -> MediaStashResult<String> {
//!     Err(ConfigError::new("Missing [index] section"))?
//! }
//!
//! match load_settings() {
//!     Ok(settings) => println!("Got: {}", settings),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod publish;
mod resource;
mod storage;
mod error;

pub use config::ConfigError;
pub use publish::{PublishError, PublishErrorKind, PublishResult};
pub use resource::{ResourceError, ResourceErrorKind};
pub use storage::{StorageError, StorageErrorKind};
pub use error::{MediaStashError, MediaStashErrorKind, MediaStashResult};
