//! # Session Error Types
//!
//! Error types for the session controller and the decoder seam.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Session Error Categories                          │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Lifecycle     │  │     Decoder             │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Disposed       │  │  PermissionDenied       │ │
//! │  │  ConfigLoad     │  │                 │  │  DeviceBusy / NoDevice  │ │
//! │  │  ConfigSave     │  │                 │  │  Runtime                │ │
//! │  │  InvalidScript  │  │                 │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  DecoderError never reaches the host as an Err: the session converts   │
//! │  it into a ScanError on the error stream.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use medscan_core::{ScanError, ValidationError};
use thiserror::Error;

/// Result type alias for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors returned by session-level APIs.
#[derive(Debug, Error)]
pub enum SessionError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid scanner configuration.
    #[error("Invalid scanner configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    /// Replay script could not be parsed.
    #[error("Invalid replay script at line {line}: {reason}")]
    InvalidScript { line: usize, reason: String },

    // =========================================================================
    // Lifecycle Errors
    // =========================================================================
    /// The session actor is gone (disposed or its runtime shut down).
    #[error("Scan session has been disposed")]
    Disposed,

    // =========================================================================
    // Decoder Errors
    // =========================================================================
    /// Error reported by the decoder capability.
    #[error(transparent)]
    Decoder(#[from] DecoderError),
}

impl From<ValidationError> for SessionError {
    fn from(err: ValidationError) -> Self {
        SessionError::InvalidConfig(err.to_string())
    }
}

impl From<medscan_core::CoreError> for SessionError {
    fn from(err: medscan_core::CoreError) -> Self {
        SessionError::InvalidConfig(err.to_string())
    }
}

impl From<std::io::Error> for SessionError {
    fn from(err: std::io::Error) -> Self {
        SessionError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SessionError {
    fn from(err: toml::de::Error) -> Self {
        SessionError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SessionError {
    fn from(err: toml::ser::Error) -> Self {
        SessionError::ConfigSaveFailed(err.to_string())
    }
}

impl SessionError {
    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SessionError::InvalidConfig(_)
                | SessionError::ConfigLoadFailed(_)
                | SessionError::ConfigSaveFailed(_)
                | SessionError::InvalidScript { .. }
        )
    }

    /// Returns true if a later `start()` may succeed without user action.
    ///
    /// A busy camera or a library hiccup can clear on its own; a denied
    /// permission, a missing device, a bad config or a disposed session
    /// cannot.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SessionError::Decoder(DecoderError {
                kind: DecoderErrorKind::DeviceBusy | DecoderErrorKind::Runtime,
                ..
            })
        )
    }
}

// =============================================================================
// Decoder Error
// =============================================================================

/// Why the decoder capability refused or failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderErrorKind {
    /// The user or OS denied camera access.
    PermissionDenied,
    /// Another process holds the camera.
    DeviceBusy,
    /// No camera matches the request.
    NoDevice,
    /// Anything else from the underlying library.
    Runtime,
}

impl std::fmt::Display for DecoderErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecoderErrorKind::PermissionDenied => write!(f, "permission denied"),
            DecoderErrorKind::DeviceBusy => write!(f, "device busy"),
            DecoderErrorKind::NoDevice => write!(f, "no device"),
            DecoderErrorKind::Runtime => write!(f, "runtime"),
        }
    }
}

/// Error returned by a [`DecoderCapability`](crate::decoder::DecoderCapability).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DecoderError {
    /// Category, for hosts that want to tailor the retry prompt.
    pub kind: DecoderErrorKind,
    /// Adapter message, shown to the user as-is.
    pub message: String,
}

impl DecoderError {
    pub fn new(kind: DecoderErrorKind, message: impl Into<String>) -> Self {
        DecoderError {
            kind,
            message: message.into(),
        }
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(DecoderErrorKind::PermissionDenied, message)
    }

    pub fn device_busy(message: impl Into<String>) -> Self {
        Self::new(DecoderErrorKind::DeviceBusy, message)
    }

    pub fn no_device(message: impl Into<String>) -> Self {
        Self::new(DecoderErrorKind::NoDevice, message)
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(DecoderErrorKind::Runtime, message)
    }
}

/// Every decoder failure that reaches the host is fatal for the capture.
impl From<&DecoderError> for ScanError {
    fn from(err: &DecoderError) -> Self {
        ScanError::fatal(err.message.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors() {
        assert!(SessionError::InvalidConfig("bad".into()).is_config_error());
        assert!(SessionError::InvalidScript {
            line: 3,
            reason: "unknown step".into()
        }
        .is_config_error());
        assert!(!SessionError::Disposed.is_config_error());
    }

    #[test]
    fn test_retryable_errors() {
        assert!(SessionError::from(DecoderError::device_busy("camera in use")).is_retryable());
        assert!(SessionError::from(DecoderError::runtime("track ended")).is_retryable());

        assert!(!SessionError::from(DecoderError::permission_denied("blocked")).is_retryable());
        assert!(!SessionError::from(DecoderError::new(DecoderErrorKind::NoDevice, "none"))
            .is_retryable());
        assert!(!SessionError::Disposed.is_retryable());
        assert!(!SessionError::InvalidConfig("bad".into()).is_retryable());
    }

    #[test]
    fn test_decoder_error_to_scan_error() {
        let err = DecoderError::permission_denied("permission denied");
        let scan_err = ScanError::from(&err);
        assert!(scan_err.fatal);
        assert_eq!(scan_err.message, "permission denied");
    }

    #[test]
    fn test_error_display() {
        let err = SessionError::InvalidScript {
            line: 7,
            reason: "expected a number after 'repeat'".into(),
        };
        assert!(err.to_string().contains("line 7"));

        let err: SessionError = DecoderError::device_busy("camera in use").into();
        assert_eq!(err.to_string(), "camera in use");
    }
}
