/// Result alias that carries the custom [`MicrotoneError`] type.
pub type Result<T> = std::result::Result<T, MicrotoneError>;

/// Common error type for the core crate.
///
/// Nothing in here is fatal: every variant describes a local failure that the
/// caller recovers from by re-issuing the triggering action with better input.
#[derive(Debug, thiserror::Error)]
pub enum MicrotoneError {
    /// Free-form message for failures that do not fit a dedicated variant.
    #[error("{0}")]
    Message(String),
    /// A user supplied parameter was rejected before any state was touched.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The audio output backend refused a play or stop request.
    #[error("audio output: {0}")]
    Audio(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Configuration or recording (de)serialisation failed.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    /// The spectrum analyser was handed buffers of the wrong size.
    #[error("{0}")]
    Fft(#[from] realfft::FftError),
}

impl MicrotoneError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    /// Creates a validation error for a rejected parameter.
    pub fn invalid<T: Into<String>>(msg: T) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Returns `true` when the error came from parameter validation.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

impl From<&str> for MicrotoneError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for MicrotoneError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
