//! Bundled resource error types.

/// Kinds of resource materialization errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ResourceErrorKind {
    /// No bundled resource carries this identifier
    #[display("Unknown resource: {}", _0)]
    Unknown(String),
    /// Underlying I/O failure while copying the resource out
    #[display("I/O failure ({:?}): {}", kind, message)]
    Io {
        /// The raw I/O error kind
        kind: std::io::ErrorKind,
        /// Error message including the affected path
        message: String,
    },
}

/// Resource error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Resource Error: {} at line {} in {}", kind, line, file)]
pub struct ResourceError {
    /// The kind of error that occurred
    pub kind: ResourceErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ResourceError {
    /// Create a new resource error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ResourceErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Wrap a raw I/O error, keeping its kind.
    #[track_caller]
    pub fn io(context: impl std::fmt::Display, err: &std::io::Error) -> Self {
        Self::new(ResourceErrorKind::Io {
            kind: err.kind(),
            message: format!("{}: {}", context, err),
        })
    }
}
