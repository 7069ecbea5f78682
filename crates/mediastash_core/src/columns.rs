//! Field keys understood by the content index.
//!
//! These are the platform column names. Category-specific aliases (the
//! picture, movie and music column sets) resolve to the same strings, so a
//! record built with any of them addresses the same columns.

/// Directory below the volume root, e.g. `Pictures`.
pub const RELATIVE_PATH: &str = "relative_path";

/// File name shown to users and used on disk.
pub const DISPLAY_NAME: &str = "_display_name";

/// MIME type string, stored verbatim.
pub const MIME_TYPE: &str = "mime_type";

/// Capture time in epoch milliseconds (pictures).
pub const DATE_TAKEN: &str = "datetaken";

/// Time the entry was added, in epoch milliseconds (movies and music).
pub const DATE_ADDED: &str = "date_added";

/// Non-zero while the entry is reserved but not yet published.
pub const IS_PENDING: &str = "is_pending";

/// Epoch seconds after which an abandoned pending entry may be purged.
pub const DATE_EXPIRES: &str = "date_expires";
