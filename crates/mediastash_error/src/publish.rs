//! Publish sequence error types.

/// Kinds of publish failures.
///
/// Every kind is contained to a single publish attempt; none is fatal to the process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum PublishErrorKind {
    /// The index declined to reserve an entry (e.g. volume not mounted)
    #[display("Reservation denied for {}", _0)]
    ReservationDenied(String),
    /// Streaming bytes into the reservation failed
    #[display("Write failed: {}", _0)]
    WriteFailed(String),
    /// Clearing the pending flag failed
    #[display("Commit failed: {}", _0)]
    CommitFailed(String),
    /// The caller abandoned the operation before it committed
    #[display("Publish cancelled before commit")]
    Cancelled,
    /// Payload kind does not fit the requested category
    #[display("Cannot publish {} payload as {}", payload, category)]
    PayloadMismatch {
        /// Requested media category
        category: String,
        /// Kind of payload supplied
        payload: String,
    },
    /// Source file has no usable file name to display
    #[display("Source file has no file name: {}", _0)]
    MissingFileName(String),
}

/// Publish error with location tracking and rollback outcome.
///
/// # Examples
///
/// ```
/// use mediastash_error::{PublishError, PublishErrorKind};
///
/// let err = PublishError::new(PublishErrorKind::Cancelled);
/// assert!(!err.rolled_back);
/// let err = err.with_rollback(true);
/// assert!(err.rolled_back);
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Publish Error: {} (rolled back: {}) at line {} in {}", kind, rolled_back, line, file)]
pub struct PublishError {
    /// The kind of error that occurred
    pub kind: PublishErrorKind,
    /// Whether the reservation was deleted after the failure
    pub rolled_back: bool,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl PublishError {
    /// Create a new publish error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: PublishErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            rolled_back: false,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Record the outcome of the rollback attempt.
    pub fn with_rollback(mut self, rolled_back: bool) -> Self {
        self.rolled_back = rolled_back;
        self
    }

    /// Get the error kind.
    pub fn kind(&self) -> &PublishErrorKind {
        &self.kind
    }
}

/// Result type for publish operations.
pub type PublishResult<T> = std::result::Result<T, PublishError>;
