//! Error types for source and decode operations.
//!
//! Only the top-level entry points (opening a decoder, validating a
//! configuration, starting a region decode) return errors. Per-channel and
//! per-sample conditions are recoverable and are logged instead.

use std::io;
use thiserror::Error;

/// Source or decode error.
#[derive(Debug, Error)]
pub enum IoError {
    /// File I/O error reported by a source.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The source could not be opened.
    #[error("failed to open source: {0}")]
    Open(String),

    /// The source exposes no planes.
    #[error("can't find any channels")]
    NoChannels,

    /// A deep shadow/camera map was handed to the flat decoder.
    #[error("deep shadow/camera maps not supported by the flat decoder (found '{0}' plane)")]
    DeepSourceUnsupported(String),

    /// Uncompositing was requested but a required plane is missing.
    #[error("cannot uncomposite: source has no {0} plane")]
    CannotUncomposite(&'static str),

    /// A source failed while reading pixel data.
    #[error("source error: {0}")]
    Source(String),

    /// Configuration could not be parsed or is inconsistent.
    #[error("config error: {0}")]
    Config(String),

    /// Geometry or layout error.
    #[error(transparent)]
    Core(#[from] deeprat_core::Error),
}

impl IoError {
    /// Returns `true` for errors that invalidate the whole source instance.
    ///
    /// Retrying the same call on the same source cannot succeed.
    #[inline]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Open(_)
                | Self::NoChannels
                | Self::DeepSourceUnsupported(_)
                | Self::CannotUncomposite(_)
        )
    }
}

impl From<serde_yaml::Error> for IoError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Config(e.to_string())
    }
}

/// Result type for source and decode operations.
pub type IoResult<T> = Result<T, IoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(IoError::NoChannels.is_fatal());
        assert!(IoError::CannotUncomposite("opacity").is_fatal());
        assert!(IoError::DeepSourceUnsupported("Depth-Complexity".into()).is_fatal());
        assert!(!IoError::Source("short read".into()).is_fatal());
    }

    #[test]
    fn test_core_error_is_transparent() {
        let err: IoError = deeprat_core::Error::out_of_bounds(5, 5, 4, 4).into();
        assert_eq!(err.to_string(), "pixel (5, 5) out of bounds for image 4x4");
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            IoError::CannotUncomposite("depth").to_string(),
            "cannot uncomposite: source has no depth plane"
        );
        assert_eq!(IoError::NoChannels.to_string(), "can't find any channels");
    }
}
