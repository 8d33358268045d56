//! # MedScan CLI Entry Point
//!
//! Terminal host view for a scan session.
//!
//! ## Application Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          MedScan Terminal Host                          │
//! │                                                                         │
//! │   stdin ──► "start" / "stop" / "history" ──┐                           │
//! │                                            ▼                            │
//! │                                   ┌─────────────────┐                  │
//! │                                   │  host loop      │                  │
//! │                                   │  (commands/scan)│                  │
//! │                                   └───┬─────────▲───┘                  │
//! │                      start/stop/dispose│         │ state, results,     │
//! │                                        ▼         │ errors              │
//! │                                   ┌─────────────────┐                  │
//! │                                   │  ScanSession    │ ◄── ReplayDecoder│
//! │                                   └─────────────────┘     (script)     │
//! │                                                                         │
//! │   stdout ◄── text lines or JSON lines      stderr ◄── tracing logs     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Startup Sequence
//! 1. Parse arguments
//! 2. Initialize tracing (logging to stderr)
//! 3. Load scanner config (file + env + defaults)
//! 4. Dispatch the subcommand

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // The actual setup is in lib.rs for better testability
    medscan_cli::run().await
}
