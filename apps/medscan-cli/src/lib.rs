//! # MedScan CLI Library
//!
//! Terminal host view for a scan session. This is the entry point that parses
//! arguments, sets up logging and dispatches subcommands.
//!
//! ## Module Organization
//! ```text
//! medscan_cli/
//! ├── lib.rs          ◄─── You are here (logging & dispatch)
//! ├── cli.rs          ◄─── clap argument definitions
//! ├── commands/       ◄─── run (host loop), config show/init
//! ├── state/          ◄─── ViewState: host copy of session state + history
//! ├── output.rs       ◄─── text / JSON-lines rendering
//! └── error.rs        ◄─── HostError for rejected input
//! ```

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;
pub mod state;

use clap::Parser;
use medscan_session::ScannerConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, ConfigAction};
use output::OutputWriter;

/// Runs the CLI.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                         Host Startup                                    │
/// │                                                                         │
/// │  1. Initialize Logging ───────────────────────────────────────────────► │
/// │     • tracing-subscriber with env filter, written to stderr            │
/// │     • Default: info,medscan=debug; RUST_LOG or --log-level overrides   │
/// │                                                                         │
/// │  2. Load Scanner Config ──────────────────────────────────────────────► │
/// │     • --config path or the platform config dir                         │
/// │     • MEDSCAN_* environment overrides                                  │
/// │                                                                         │
/// │  3. Dispatch ─────────────────────────────────────────────────────────► │
/// │     • run: spawn session, drive it from stdin, dispose on exit         │
/// │     • config show | init                                               │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let mut out = OutputWriter::new(cli.output, std::io::stdout());

    match cli.command {
        Commands::Run(args) => {
            let config = ScannerConfig::load(cli.config.clone())?;
            info!("Starting MedScan terminal host");
            let view = commands::scan::run(&config, &args, &mut out).await?;
            info!(scans = view.status().scans, "Terminal host finished");
        }
        Commands::Config(config_args) => match config_args.action {
            ConfigAction::Show => {
                let config = ScannerConfig::load(cli.config.clone())?;
                commands::config::show(&config, cli.config, &mut out)?;
            }
            ConfigAction::Init { force } => {
                let written = commands::config::init(cli.config, force)?;
                out.render(&written)?;
            }
        },
    }

    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=medscan_session=trace` - Also show per-frame misses
/// - Default: INFO, DEBUG for medscan crates
///
/// Logs go to stderr so JSON output on stdout stays machine-readable.
fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Default filter when neither `--log-level` nor `RUST_LOG` is set.
pub const DEFAULT_LOG_FILTER: &str = "info,medscan=debug";
