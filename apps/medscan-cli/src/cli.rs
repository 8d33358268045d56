//! CLI argument parsing using clap derive API
//!
//! Purely declarative: no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// MedScan terminal host for the camera scan session.
///
/// Use `medscan <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "medscan", version, about, long_about = None)]
pub struct Cli {
    /// Path to scanner.toml (default: the platform config directory).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the log filter (e.g. debug, medscan_session=trace).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a scan session driven by stdin commands.
    Run(RunArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- run ----

/// Run a scan session over a replay script.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Replay script the decoder plays back on each start.
    #[arg(short, long)]
    pub script: PathBuf,

    /// Issue `start` immediately instead of waiting for it on stdin.
    #[arg(long)]
    pub autostart: bool,

    /// Make every camera release report a failure.
    #[arg(long)]
    pub fail_release: bool,
}

// ---- config ----

/// Manage scanner configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration (file + env overrides + defaults).
    Show,
    /// Write a default scanner.toml.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run() {
        let cli = Cli::parse_from([
            "medscan",
            "run",
            "--script",
            "scan.txt",
            "--autostart",
            "--output",
            "json",
        ]);
        assert_eq!(cli.output, OutputFormat::Json);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.script, PathBuf::from("scan.txt"));
                assert!(args.autostart);
                assert!(!args.fail_release);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_config_init() {
        let cli = Cli::parse_from(["medscan", "-c", "/tmp/scanner.toml", "config", "init", "--force"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/scanner.toml")));
        assert!(matches!(
            cli.command,
            Commands::Config(ConfigArgs {
                action: ConfigAction::Init { force: true }
            })
        ));
    }

    #[test]
    fn test_run_requires_script() {
        assert!(Cli::try_parse_from(["medscan", "run"]).is_err());
    }
}
