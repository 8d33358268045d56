//! # Scan Session
//!
//! The session controller: owns one capture-and-decode resource, drives it
//! through its lifecycle, and turns raw frame reports into results and errors.
//!
//! ## Actor Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Scan Session Actor                              │
//! │                                                                         │
//! │   Host view                                                             │
//! │   ─────────                                                             │
//! │   ScanSessionHandle ──► commands (start / stop / dispose)              │
//! │          ▲                        │                                     │
//! │          │ watch                  ▼                                     │
//! │   SessionState ◄────────── ┌──────────────┐ ◄── internal: acquired,    │
//! │                            │ SessionActor │      released (spawned)    │
//! │   SessionEvents ◄───────── │  (one task)  │ ◄── frames: TaggedFrame    │
//! │    results / errors        └──────┬───────┘      from FrameSink        │
//! │                                   │                                     │
//! │                                   ▼                                     │
//! │                          DecoderCapability                              │
//! │                          acquire / release                              │
//! │                                                                         │
//! │  RULES                                                                  │
//! │  • The actor is the only owner of SessionState and the CaptureHandle.  │
//! │  • Acquire and release run as spawned tasks so the actor stays         │
//! │    responsive; their outcome comes back on the internal channel.       │
//! │  • Every frame carries its acquisition token. A frame whose token is   │
//! │    not the stored handle's token is stale and dropped.                 │
//! │  • Fatal errors are emitted after the handle has been released.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use medscan_core::{
    AcquisitionToken, CaptureConfig, ErrorClassifier, FrameOutcome, ScanError, ScanResult,
    SessionEvent, SessionState, DEFAULT_TARGET_ID,
};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::timeout;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, error, info, info_span, trace, warn, Instrument, Span};
use uuid::Uuid;

use crate::config::ScannerConfig;
use crate::decoder::{AcquireRequest, DecoderCapability, FrameReport, FrameSink, TaggedFrame};
use crate::error::{DecoderError, SessionError, SessionResult};

// =============================================================================
// Session Options
// =============================================================================

/// Everything a session needs besides its decoder.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Element or device id handed to the decoder on acquisition.
    pub target_id: String,

    /// Capture parameters handed to the decoder on acquisition.
    pub capture: CaptureConfig,

    /// Splits decoder error messages into misses and faults.
    pub classifier: ErrorClassifier,

    /// Upper bound on how long `dispose()` waits for the release.
    pub dispose_timeout: Duration,
}

impl SessionOptions {
    /// Builds options from a loaded scanner config.
    pub fn from_config(config: &ScannerConfig) -> SessionResult<Self> {
        Ok(SessionOptions {
            target_id: config.capture.target_id.clone(),
            capture: config.capture_config()?,
            classifier: config.classifier(),
            dispose_timeout: config.dispose_timeout(),
        })
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        SessionOptions {
            target_id: DEFAULT_TARGET_ID.to_string(),
            capture: CaptureConfig::default(),
            classifier: ErrorClassifier::default(),
            dispose_timeout: Duration::from_secs(2),
        }
    }
}

// =============================================================================
// Capture Handle
// =============================================================================

/// The live capture resource, tagged with the acquisition that produced it.
#[derive(Debug)]
pub struct CaptureHandle<H> {
    pub token: AcquisitionToken,
    pub resource: H,
}

// =============================================================================
// Messages
// =============================================================================

enum Command {
    Start,
    Stop,
    Dispose(oneshot::Sender<()>),
}

/// Why a release was issued; decides the state it lands in.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ReleaseReason {
    /// Host called stop() while Active.
    Stop,
    /// Acquisition resolved after the session stopped wanting it.
    Unwanted,
    /// Frame fault while Active. The message is emitted once released.
    Fault(String),
    /// Host disposed the session.
    Dispose,
}

enum Internal<H> {
    Acquired {
        token: AcquisitionToken,
        result: Result<H, DecoderError>,
    },
    Released {
        token: AcquisitionToken,
        reason: ReleaseReason,
        result: Result<(), DecoderError>,
    },
}

// =============================================================================
// Host-Facing Handle and Events
// =============================================================================

/// Host-side handle to a running session.
///
/// Dropping the handle disposes the session without waiting.
#[derive(Debug)]
pub struct ScanSessionHandle {
    session_id: Uuid,
    cmd_tx: mpsc::UnboundedSender<Command>,
    state_rx: watch::Receiver<SessionState>,
    dispose_timeout: Duration,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Start => write!(f, "Start"),
            Command::Stop => write!(f, "Stop"),
            Command::Dispose(_) => write!(f, "Dispose"),
        }
    }
}

impl ScanSessionHandle {
    /// Requests a capture. No-op unless the session is Idle or Failed.
    pub fn start(&self) -> SessionResult<()> {
        self.send(Command::Start)
    }

    /// Requests the capture be released. No-op unless Starting or Active.
    pub fn stop(&self) -> SessionResult<()> {
        self.send(Command::Stop)
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        *self.state_rx.borrow()
    }

    /// Receiver that observes the latest state.
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state_rx.clone()
    }

    /// Id recorded on every log line of this session.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Tears the session down.
    ///
    /// Releases any live capture, discards any pending acquisition once it
    /// resolves, and closes both event streams. Returns when the release has
    /// completed or the configured dispose timeout has passed. Release
    /// failures are logged, never returned.
    pub async fn dispose(self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.cmd_tx.send(Command::Dispose(ack_tx)).is_err() {
            debug!(session = %self.session_id, "Dispose on a session that already exited");
            return;
        }

        match timeout(self.dispose_timeout, ack_rx).await {
            Ok(_) => debug!(session = %self.session_id, "Session disposed"),
            Err(_) => warn!(
                session = %self.session_id,
                timeout_ms = self.dispose_timeout.as_millis() as u64,
                "Timed out waiting for capture release during dispose"
            ),
        }
    }

    fn send(&self, command: Command) -> SessionResult<()> {
        self.cmd_tx.send(command).map_err(|_| SessionError::Disposed)
    }
}

/// Result and error streams of one session.
///
/// Both close when the session is disposed.
#[derive(Debug)]
pub struct SessionEvents {
    pub results: mpsc::UnboundedReceiver<ScanResult>,
    pub errors: mpsc::UnboundedReceiver<ScanError>,
}

impl SessionEvents {
    /// Converts both receivers into `Stream`s.
    pub fn into_streams(
        self,
    ) -> (
        UnboundedReceiverStream<ScanResult>,
        UnboundedReceiverStream<ScanError>,
    ) {
        (
            UnboundedReceiverStream::new(self.results),
            UnboundedReceiverStream::new(self.errors),
        )
    }
}

// =============================================================================
// Scan Session
// =============================================================================

/// Entry point for creating sessions.
pub struct ScanSession;

impl ScanSession {
    /// Spawns a session actor in Idle and returns its handle and event streams.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<D: DecoderCapability>(
        decoder: Arc<D>,
        options: SessionOptions,
    ) -> (ScanSessionHandle, SessionEvents) {
        let session_id = Uuid::new_v4();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(SessionState::Idle);
        let (result_tx, results) = mpsc::unbounded_channel();
        let (error_tx, errors) = mpsc::unbounded_channel();
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();
        let (frame_tx, frame_rx) = mpsc::unbounded_channel();

        let handle = ScanSessionHandle {
            session_id,
            cmd_tx,
            state_rx,
            dispose_timeout: options.dispose_timeout,
        };

        let actor = SessionActor {
            decoder,
            target_id: options.target_id,
            capture_config: options.capture,
            classifier: options.classifier,
            state: SessionState::Idle,
            state_tx,
            result_tx: Some(result_tx),
            error_tx: Some(error_tx),
            internal_tx,
            frame_tx,
            next_token: AcquisitionToken::first(),
            pending: None,
            capture: None,
            releases_in_flight: 0,
            disposed: false,
            dispose_acks: Vec::new(),
        };

        let span = info_span!("scan_session", session = %session_id);
        tokio::spawn(actor.run(cmd_rx, internal_rx, frame_rx).instrument(span));

        (handle, SessionEvents { results, errors })
    }
}

// =============================================================================
// Session Actor
// =============================================================================

struct SessionActor<D: DecoderCapability> {
    decoder: Arc<D>,
    target_id: String,
    capture_config: CaptureConfig,
    classifier: ErrorClassifier,

    state: SessionState,
    state_tx: watch::Sender<SessionState>,
    result_tx: Option<mpsc::UnboundedSender<ScanResult>>,
    error_tx: Option<mpsc::UnboundedSender<ScanError>>,
    internal_tx: mpsc::UnboundedSender<Internal<D::Handle>>,
    frame_tx: mpsc::UnboundedSender<TaggedFrame>,

    next_token: AcquisitionToken,
    /// Token of the acquisition currently in flight.
    pending: Option<AcquisitionToken>,
    capture: Option<CaptureHandle<D::Handle>>,
    releases_in_flight: usize,

    disposed: bool,
    dispose_acks: Vec<oneshot::Sender<()>>,
}

impl<D: DecoderCapability> SessionActor<D> {
    async fn run(
        mut self,
        mut cmd_rx: mpsc::UnboundedReceiver<Command>,
        mut internal_rx: mpsc::UnboundedReceiver<Internal<D::Handle>>,
        mut frame_rx: mpsc::UnboundedReceiver<TaggedFrame>,
    ) {
        info!(target_id = %self.target_id, "Scan session created");

        loop {
            if self.disposed && self.pending.is_none() && self.releases_in_flight == 0 {
                break;
            }

            tokio::select! {
                biased;

                cmd = cmd_rx.recv(), if !self.disposed => match cmd {
                    Some(Command::Start) => self.handle_start(),
                    Some(Command::Stop) => self.handle_stop(),
                    Some(Command::Dispose(ack)) => self.handle_dispose(Some(ack)),
                    None => {
                        debug!("Session handle dropped");
                        self.handle_dispose(None);
                    }
                },

                Some(msg) = internal_rx.recv() => match msg {
                    Internal::Acquired { token, result } => self.handle_acquired(token, result),
                    Internal::Released { token, reason, result } => {
                        self.handle_released(token, reason, result)
                    }
                },

                Some(frame) = frame_rx.recv() => self.handle_frame(frame),
            }
        }

        for ack in self.dispose_acks.drain(..) {
            let _ = ack.send(());
        }
        info!("Scan session closed");
    }

    // =========================================================================
    // Commands
    // =========================================================================

    fn handle_start(&mut self) {
        if !self.state.accepts_start() {
            debug!(state = %self.state, "Ignoring start");
            return;
        }

        let token = self.next_token;
        self.next_token = token.next();
        self.apply(SessionEvent::StartRequested);
        self.pending = Some(token);

        let request = AcquireRequest {
            target_id: self.target_id.clone(),
            config: self.capture_config.clone(),
        };
        let sink = FrameSink::new(token, self.frame_tx.clone());
        let decoder = Arc::clone(&self.decoder);
        let tx = self.internal_tx.clone();

        debug!(%token, "Requesting capture");
        tokio::spawn(
            async move {
                let result = decoder.acquire(request, sink).await;
                let _ = tx.send(Internal::Acquired { token, result });
            }
            .instrument(Span::current()),
        );
    }

    fn handle_stop(&mut self) {
        match self.state {
            SessionState::Active => {
                self.apply(SessionEvent::StopRequested);
                if let Some(capture) = self.capture.take() {
                    self.spawn_release(capture, ReleaseReason::Stop);
                }
            }
            // The pending acquisition is released as soon as it resolves.
            SessionState::Starting => self.apply(SessionEvent::StopRequested),
            _ => debug!(state = %self.state, "Ignoring stop"),
        }
    }

    fn handle_dispose(&mut self, ack: Option<oneshot::Sender<()>>) {
        info!(state = %self.state, "Disposing scan session");
        self.disposed = true;
        self.dispose_acks.extend(ack);

        if let Some(capture) = self.capture.take() {
            self.spawn_release(capture, ReleaseReason::Dispose);
        }

        self.apply(SessionEvent::Disposed);

        // Closing the senders ends the host's streams.
        self.result_tx = None;
        self.error_tx = None;
    }

    // =========================================================================
    // Acquire / Release Completions
    // =========================================================================

    fn handle_acquired(&mut self, token: AcquisitionToken, result: Result<D::Handle, DecoderError>) {
        if self.pending == Some(token) {
            self.pending = None;
        }

        let wanted = !self.disposed && self.state == SessionState::Starting;

        match result {
            Ok(resource) if wanted => {
                info!(%token, "Capture acquired");
                self.capture = Some(CaptureHandle { token, resource });
                self.apply(SessionEvent::Acquired);
            }
            Ok(resource) => {
                debug!(%token, state = %self.state, "Releasing capture acquired after stop");
                self.spawn_release(CaptureHandle { token, resource }, ReleaseReason::Unwanted);
            }
            Err(err) if wanted => {
                error!(%token, kind = %err.kind, error = %err, "Capture acquisition failed");
                self.apply(SessionEvent::AcquireFailed);
                self.emit_error(ScanError::from(&err));
            }
            Err(err) => {
                debug!(%token, error = %err, "Acquisition failed after stop");
                if !self.disposed && self.state == SessionState::Stopping {
                    self.apply(SessionEvent::Released);
                }
            }
        }
    }

    fn handle_released(
        &mut self,
        token: AcquisitionToken,
        reason: ReleaseReason,
        result: Result<(), DecoderError>,
    ) {
        self.releases_in_flight = self.releases_in_flight.saturating_sub(1);

        match &result {
            Ok(()) => debug!(%token, ?reason, "Capture released"),
            Err(err) => warn!(%token, ?reason, error = %err, "Capture release failed"),
        }

        if self.disposed {
            return;
        }

        match reason {
            ReleaseReason::Fault(message) => {
                self.apply(SessionEvent::ReleasedAfterFault);
                self.emit_error(ScanError::fatal(message));
            }
            ReleaseReason::Stop | ReleaseReason::Unwanted => {
                if self.state == SessionState::Stopping {
                    self.apply(SessionEvent::Released);
                }
            }
            ReleaseReason::Dispose => {}
        }
    }

    // =========================================================================
    // Frames
    // =========================================================================

    fn handle_frame(&mut self, frame: TaggedFrame) {
        let current = self.capture.as_ref().map(|c| c.token);
        if self.disposed || self.state != SessionState::Active || current != Some(frame.token) {
            debug!(token = %frame.token, state = %self.state, "Discarding stale frame");
            return;
        }

        let outcome = match &frame.report {
            FrameReport::Decoded(raw) => self.classifier.classify_decoded(raw),
            FrameReport::Failed(message) => self.classifier.classify_error(message),
        };

        match outcome {
            FrameOutcome::Payload(payload) => {
                debug!(token = %frame.token, payload_len = payload.len(), "Symbol decoded");
                if let Some(tx) = &self.result_tx {
                    let _ = tx.send(ScanResult::now(payload));
                }
            }
            FrameOutcome::NoSymbolFound => trace!(token = %frame.token, "No symbol in frame"),
            FrameOutcome::Fault(message) => {
                error!(token = %frame.token, error = %message, "Decode fault, stopping capture");
                self.apply(SessionEvent::FaultDetected);
                if let Some(capture) = self.capture.take() {
                    self.spawn_release(capture, ReleaseReason::Fault(message));
                }
            }
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn spawn_release(&mut self, capture: CaptureHandle<D::Handle>, reason: ReleaseReason) {
        self.releases_in_flight += 1;

        let decoder = Arc::clone(&self.decoder);
        let tx = self.internal_tx.clone();
        let token = capture.token;

        tokio::spawn(
            async move {
                let result = decoder.release(capture.resource).await;
                let _ = tx.send(Internal::Released {
                    token,
                    reason,
                    result,
                });
            }
            .instrument(Span::current()),
        );
    }

    fn apply(&mut self, event: SessionEvent) {
        match self.state.transition(event) {
            Ok(next) if next != self.state => {
                info!(from = %self.state, to = %next, "Session state changed");
                self.state = next;
                self.state_tx.send_replace(next);
            }
            Ok(_) => {}
            Err(err) => debug!(error = %err, "Transition rejected"),
        }
    }

    fn emit_error(&self, err: ScanError) {
        if let Some(tx) = &self.error_tx {
            let _ = tx.send(err);
        }
    }
}
