//! # Decoder Capability
//!
//! The narrow seam between the session and whatever actually opens the
//! camera and decodes symbols.
//!
//! ## Adapter Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Decoder Adapter Contract                         │
//! │                                                                         │
//! │  acquire(request, frames) ──► Handle        (async, may fail)          │
//! │       │                                                                 │
//! │       │  while the handle is live, once per frame:                     │
//! │       ├──► frames.decoded("ABC123")                                    │
//! │       ├──► frames.failed("QR code not found")   ◄── classified later   │
//! │       └──► frames.failed("Video stream ended")                         │
//! │                                                                         │
//! │  release(handle) ──► ()                     (async, idempotent)        │
//! │                                                                         │
//! │  RULES                                                                  │
//! │  • Reports go through the FrameSink handed to acquire(); the sink is   │
//! │    tagged with the acquisition token, so the adapter never needs to    │
//! │    know which acquisition is current.                                  │
//! │  • `FrameSink::decoded` / `failed` return false once the session no    │
//! │    longer listens; adapters may stop their frame loop on that.         │
//! │  • release() must not fail because the resource is already gone.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use medscan_core::{AcquisitionToken, CaptureConfig};
use tokio::sync::mpsc;

use crate::error::DecoderError;

// =============================================================================
// Acquire Request
// =============================================================================

/// Everything an adapter needs to open a capture.
#[derive(Debug, Clone, PartialEq)]
pub struct AcquireRequest {
    /// Element or device id the capture attaches to.
    pub target_id: String,

    /// Frame rate, region of interest, aspect ratio and camera.
    pub config: CaptureConfig,
}

// =============================================================================
// Frame Reports
// =============================================================================

/// Raw per-frame report from an adapter, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameReport {
    /// The decoder produced text.
    Decoded(String),
    /// The decoder's error callback fired with this message.
    Failed(String),
}

/// A frame report together with the acquisition that produced it.
#[derive(Debug, Clone)]
pub(crate) struct TaggedFrame {
    pub token: AcquisitionToken,
    pub report: FrameReport,
}

/// Per-acquisition channel an adapter reports frames through.
#[derive(Debug, Clone)]
pub struct FrameSink {
    token: AcquisitionToken,
    tx: mpsc::UnboundedSender<TaggedFrame>,
}

impl FrameSink {
    pub(crate) fn new(token: AcquisitionToken, tx: mpsc::UnboundedSender<TaggedFrame>) -> Self {
        FrameSink { token, tx }
    }

    /// Token of the acquisition this sink belongs to.
    pub fn token(&self) -> AcquisitionToken {
        self.token
    }

    /// Sends a raw report. Returns false if the session is gone.
    pub fn report(&self, report: FrameReport) -> bool {
        self.tx
            .send(TaggedFrame {
                token: self.token,
                report,
            })
            .is_ok()
    }

    /// Reports a decoded payload.
    pub fn decoded(&self, payload: impl Into<String>) -> bool {
        self.report(FrameReport::Decoded(payload.into()))
    }

    /// Reports a decode error message.
    pub fn failed(&self, message: impl Into<String>) -> bool {
        self.report(FrameReport::Failed(message.into()))
    }

    /// Returns true once the session has stopped listening.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

// =============================================================================
// Decoder Capability Trait
// =============================================================================

/// A camera + symbol decoder the session can drive.
///
/// Implementations own the device. The session guarantees it never holds more
/// than one handle at a time and never releases a handle twice.
#[async_trait]
pub trait DecoderCapability: Send + Sync + 'static {
    /// Opaque resource handle returned by [`acquire`](Self::acquire).
    type Handle: Send + 'static;

    /// Opens the capture source and starts delivering frames to `frames`.
    async fn acquire(
        &self,
        request: AcquireRequest,
        frames: FrameSink,
    ) -> Result<Self::Handle, DecoderError>;

    /// Stops frame delivery and frees the device.
    async fn release(&self, handle: Self::Handle) -> Result<(), DecoderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_tags_reports() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let token = AcquisitionToken::first().next();
        let sink = FrameSink::new(token, tx);

        assert!(sink.decoded("ABC123"));
        assert!(sink.failed("QR code not found"));

        let first = rx.try_recv().unwrap();
        assert_eq!(first.token, token);
        assert_eq!(first.report, FrameReport::Decoded("ABC123".into()));
        let second = rx.try_recv().unwrap();
        assert_eq!(second.report, FrameReport::Failed("QR code not found".into()));
    }

    #[test]
    fn test_sink_reports_closed_session() {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = FrameSink::new(AcquisitionToken::first(), tx);
        drop(rx);

        assert!(sink.is_closed());
        assert!(!sink.decoded("ABC123"));
    }
}
