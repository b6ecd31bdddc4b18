//! Crate-wide error type
//!
//! Mirrors the shape of a typical `thiserror` error enum: one variant per
//! failure domain, a blanket conversion from `std::io::Error`, and a
//! convenience `From<String>`/`From<&str>` for ad-hoc messages raised deep
//! inside synthesis code that doesn't want to thread a dedicated variant
//! through.

/// Errors produced by the simulation engine.
#[derive(thiserror::Error, Debug)]
pub enum WwvSimError {
    /// Invalid or contradictory configuration (sample rate, DUT1, leap flags).
    #[error("configuration error: {0}")]
    Config(String),

    /// A tone/announcement/timecode operation was asked to address samples
    /// outside the buffer it was given.
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// IO error from filesystem or subprocess interaction.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The audio output device/sink could not be opened or written to.
    #[error("audio device error: {0}")]
    Device(String),

    /// Generic error with no dedicated variant.
    #[error("{0}")]
    Other(String),
}

impl From<String> for WwvSimError {
    fn from(msg: String) -> Self {
        WwvSimError::Other(msg)
    }
}

impl From<&str> for WwvSimError {
    fn from(msg: &str) -> Self {
        WwvSimError::Other(msg.to_string())
    }
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, WwvSimError>;
