//! # Host Error Type
//!
//! Error reported to the terminal for a single rejected input or a failed
//! write, without ending the host loop.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Error Flow in the Terminal Host                    │
//! │                                                                         │
//! │  stdin "scna"  ── parse ──► HostError{UNKNOWN_COMMAND} ──► rendered    │
//! │                                                                         │
//! │  stdin "start" ── session gone ──► SessionError::Disposed              │
//! │                                      └──► HostError{SESSION_CLOSED}    │
//! │                                                                         │
//! │  stdout closed ── io::Error ──► HostError{OUTPUT} ──► loop ends        │
//! │                                                                         │
//! │  Scan faults are NOT HostErrors: they arrive on the session's error    │
//! │  stream and are rendered as events.                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! In JSON output a rejected input renders as:
//! ```json
//! {"event":"rejected","code":"UNKNOWN_COMMAND","message":"Unknown command 'scna' (try 'help')"}
//! ```

use medscan_session::SessionError;
use serde::Serialize;

/// Error shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Error codes for host output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input line is not a host command
    UnknownCommand,

    /// The scan session has already exited
    SessionClosed,

    /// Configuration or script problem
    InvalidConfig,

    /// Writing to stdout failed
    Output,
}

impl HostError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        HostError {
            code,
            message: message.into(),
        }
    }

    pub fn unknown_command(input: &str) -> Self {
        HostError::new(
            ErrorCode::UnknownCommand,
            format!("Unknown command '{}' (try 'help')", input),
        )
    }

    /// Returns true if the host loop cannot continue after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self.code, ErrorCode::Output)
    }
}

impl From<SessionError> for HostError {
    fn from(err: SessionError) -> Self {
        if err.is_config_error() {
            return HostError::new(ErrorCode::InvalidConfig, err.to_string());
        }
        match err {
            SessionError::Disposed => HostError::new(ErrorCode::SessionClosed, err.to_string()),
            other => {
                tracing::error!(error = %other, "Unexpected session error");
                HostError::new(ErrorCode::SessionClosed, other.to_string())
            }
        }
    }
}

impl From<std::io::Error> for HostError {
    fn from(err: std::io::Error) -> Self {
        HostError::new(ErrorCode::Output, err.to_string())
    }
}

impl From<serde_json::Error> for HostError {
    fn from(err: serde_json::Error) -> Self {
        HostError::new(ErrorCode::Output, err.to_string())
    }
}

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for HostError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_command_serialization() {
        let err = HostError::unknown_command("scna");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"code\":\"UNKNOWN_COMMAND\""));
        assert!(json.contains("scna"));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_from_session_error() {
        let err = HostError::from(SessionError::Disposed);
        assert_eq!(err.code, ErrorCode::SessionClosed);

        let err = HostError::from(SessionError::InvalidConfig("fps".into()));
        assert_eq!(err.code, ErrorCode::InvalidConfig);
    }

    #[test]
    fn test_io_error_is_fatal() {
        let err = HostError::from(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "broken pipe",
        ));
        assert!(err.is_fatal());
        assert_eq!(err.to_string(), "[Output] broken pipe");
    }
}
