//! Errors from loading or validating `mediastash.toml`.

/// A configuration problem, tagged with the call site that found it.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Invalid mediastash configuration: {} ({}:{})", message, file, line)]
pub struct ConfigError {
    /// What is wrong
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ConfigError {
    /// Create a ConfigError at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use mediastash_error::ConfigError;
    ///
    /// let err = ConfigError::new("no index root configured and no data dir");
    /// assert!(err.to_string().starts_with("Invalid mediastash configuration"));
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }

    /// Reject the value of one `[section] key`.
    ///
    /// ```
    /// use mediastash_error::ConfigError;
    ///
    /// let err = ConfigError::invalid_value("publisher", "jpeg_quality", "must be in 1..=100, got 0");
    /// assert_eq!(err.message, "[publisher] jpeg_quality must be in 1..=100, got 0");
    /// ```
    #[track_caller]
    pub fn invalid_value(section: &str, key: &str, reason: impl std::fmt::Display) -> Self {
        Self::new(format!("[{}] {} {}", section, key, reason))
    }
}
