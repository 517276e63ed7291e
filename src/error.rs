use thiserror::Error;

/// Main error type for the beat-parser-core library.
///
/// Every variant carries a stable kind (the variant itself) plus a human
/// readable string. Errors never carry partial results: a `parse_*` call
/// either returns a complete `ParseResult` or one of these.
#[derive(Error, Debug)]
pub enum BeatParserError {
    /// Empty buffer, non-finite samples, too-short audio, malformed header,
    /// unsupported extension for the declared container, or a null/undefined
    /// input. Non-retryable.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// The declared (or sniffed) file extension is not in the adapter's
    /// supported list.
    #[error("unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    /// Invalid selection weights, invalid `target_picture_count`, or an
    /// unknown strategy reached validation despite the closed enum (e.g. via
    /// deserialized options).
    #[error("configuration error: {details}")]
    ConfigurationError { details: String },

    /// A numeric failure: division by zero, an empty reduction, or an
    /// unexpected empty spectrogram. Non-retryable.
    #[error("processing error: {reason}")]
    ProcessingError { reason: String },

    /// A plugin hook returned an error; the parse is aborted and the
    /// plugin's name is attached so the caller can identify the offender.
    #[error("plugin '{plugin_name}' failed: {reason}")]
    PluginError { plugin_name: String, reason: String },

    /// The parse was cancelled by the caller's token, or timed out (timeouts
    /// behave identically to cancellation).
    #[error("parse cancelled")]
    Cancelled,

    /// An attempt to mutate configuration or the plugin list after the
    /// parser has left the `Uninitialized` state.
    #[error("lifecycle error: {reason}")]
    LifecycleError { reason: String },

    /// IO error surfaced while reading a file or stream.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for results using [`BeatParserError`].
pub type Result<T> = std::result::Result<T, BeatParserError>;

impl BeatParserError {
    pub fn invalid_input<S: Into<String>>(reason: S) -> Self {
        Self::InvalidInput { reason: reason.into() }
    }

    pub fn processing<S: Into<String>>(reason: S) -> Self {
        Self::ProcessingError { reason: reason.into() }
    }

    pub fn configuration<S: Into<String>>(details: S) -> Self {
        Self::ConfigurationError { details: details.into() }
    }

    pub fn plugin<S: Into<String>, R: Into<String>>(plugin_name: S, reason: R) -> Self {
        Self::PluginError { plugin_name: plugin_name.into(), reason: reason.into() }
    }

    pub fn lifecycle<S: Into<String>>(reason: S) -> Self {
        Self::LifecycleError { reason: reason.into() }
    }

    /// Whether retrying the same call might succeed (e.g. a transient IO
    /// failure reading a file). Most variants here are permanent.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Io(_))
    }

    /// A user-friendly message suitable for CLI output.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput { reason } => {
                format!("The audio input is invalid: {reason}")
            }
            Self::UnsupportedFormat { format } => {
                format!("'{format}' is not a supported audio format. Supported: wav, mp3, flac, ogg, m4a, aac.")
            }
            Self::ConfigurationError { details } => {
                format!("Invalid configuration: {details}")
            }
            Self::Cancelled => "The parse was cancelled or timed out.".to_string(),
            _ => self.to_string(),
        }
    }

    /// Maps this error onto the CLI's documented exit status (see §6).
    pub fn exit_status(&self) -> i32 {
        match self {
            Self::InvalidInput { .. } => 1,
            Self::UnsupportedFormat { .. } => 2,
            Self::Cancelled => 4,
            _ => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_statuses_match_spec() {
        assert_eq!(BeatParserError::invalid_input("x").exit_status(), 1);
        assert_eq!(BeatParserError::UnsupportedFormat { format: "xyz".into() }.exit_status(), 2);
        assert_eq!(BeatParserError::Cancelled.exit_status(), 4);
        assert_eq!(BeatParserError::processing("x").exit_status(), 3);
    }

    #[test]
    fn io_errors_are_recoverable() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: BeatParserError = io_err.into();
        assert!(err.is_recoverable());
        assert!(!BeatParserError::invalid_input("x").is_recoverable());
    }
}
