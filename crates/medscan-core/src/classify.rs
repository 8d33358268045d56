//! # Decode Error Classification
//!
//! Decoder libraries report "there was no symbol in this frame" through the
//! same error callback they use for real failures. The scanner would be
//! useless if every empty frame killed the session, and dangerous if a dead
//! camera were silently ignored, so the split between the two has to be exact.
//!
//! ## Classification
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Per-Frame Report Classification                     │
//! │                                                                         │
//! │  Decoded("ABC123") ─────────────────────────────► Payload("ABC123")    │
//! │                                                                         │
//! │  Failed("QR code parse error, error =                                   │
//! │         NotFoundException: ...")  ── marker hit ──► NoSymbolFound      │
//! │                                                                         │
//! │  Failed("Video stream ended")     ── no marker ───► Fault(message)     │
//! │                                                                         │
//! │  Marker matching is case-insensitive substring search. The default     │
//! │  markers cover html5-qrcode / ZXing wording.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::validation::validate_payload;

/// Substrings that mean "no symbol in this frame" for the html5-qrcode and
/// ZXing family of decoders.
pub const DEFAULT_NO_SYMBOL_MARKERS: &[&str] = &[
    "QR code not found",
    "NotFoundException",
    "No MultiFormat Readers",
    "No barcode or QR code detected",
];

/// Normalized outcome of a single frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// A symbol was decoded. Payload is trimmed and non-empty.
    Payload(String),
    /// Nothing to decode in this frame. Expected on most frames.
    NoSymbolFound,
    /// Anything else. Ends the session.
    Fault(String),
}

impl FrameOutcome {
    /// Returns true for outcomes that end the capture.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FrameOutcome::Fault(_))
    }
}

/// Splits decoder error messages into "no symbol" and "fault".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorClassifier {
    markers: Vec<String>,
}

impl ErrorClassifier {
    /// Creates a classifier from marker substrings.
    ///
    /// Blank markers are dropped: an empty marker would match every message
    /// and turn every fault into a miss.
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let markers = markers
            .into_iter()
            .map(Into::into)
            .filter(|m| !m.trim().is_empty())
            .map(|m| m.to_lowercase())
            .collect();
        ErrorClassifier { markers }
    }

    /// Markers in use (lowercased).
    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    /// Classifies an error message reported for one frame.
    pub fn classify_error(&self, message: &str) -> FrameOutcome {
        let haystack = message.to_lowercase();
        if self.markers.iter().any(|m| haystack.contains(m.as_str())) {
            FrameOutcome::NoSymbolFound
        } else {
            FrameOutcome::Fault(message.to_string())
        }
    }

    /// Classifies a successful decode.
    ///
    /// A blank payload carries no code, so it is treated as a miss rather
    /// than surfaced. Anything else is trimmed and passed through whole.
    pub fn classify_decoded(&self, raw: &str) -> FrameOutcome {
        match validate_payload(raw) {
            Ok(payload) => FrameOutcome::Payload(payload),
            Err(_) => FrameOutcome::NoSymbolFound,
        }
    }
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        ErrorClassifier::new(DEFAULT_NO_SYMBOL_MARKERS.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_symbol_messages() {
        let classifier = ErrorClassifier::default();
        assert_eq!(
            classifier.classify_error("QR code not found"),
            FrameOutcome::NoSymbolFound
        );
        assert_eq!(
            classifier.classify_error(
                "QR code parse error, error = NotFoundException: No MultiFormat Readers were able to detect the code."
            ),
            FrameOutcome::NoSymbolFound
        );
        assert_eq!(
            classifier.classify_error("qr CODE NOT FOUND"),
            FrameOutcome::NoSymbolFound
        );
    }

    #[test]
    fn test_fault_messages() {
        let classifier = ErrorClassifier::default();
        let outcome = classifier.classify_error("Video stream ended unexpectedly");
        assert_eq!(
            outcome,
            FrameOutcome::Fault("Video stream ended unexpectedly".to_string())
        );
        assert!(outcome.is_fatal());
        assert!(classifier.classify_error("").is_fatal());
    }

    #[test]
    fn test_blank_markers_are_ignored() {
        let classifier = ErrorClassifier::new(["", "  ", "nothing here"]);
        assert_eq!(classifier.markers(), &["nothing here".to_string()]);
        assert!(classifier.classify_error("camera unplugged").is_fatal());
        assert_eq!(
            classifier.classify_error("Nothing here, try again"),
            FrameOutcome::NoSymbolFound
        );
    }

    #[test]
    fn test_decoded_payloads() {
        let classifier = ErrorClassifier::default();
        assert_eq!(
            classifier.classify_decoded(" ABC123\n"),
            FrameOutcome::Payload("ABC123".to_string())
        );
        assert_eq!(classifier.classify_decoded("   "), FrameOutcome::NoSymbolFound);

        let long = "1".repeat(5000);
        assert_eq!(classifier.classify_decoded(&long), FrameOutcome::Payload(long));
    }
}
