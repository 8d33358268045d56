//! # Host Commands Module
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs      ◄─── You are here (stdin command parsing)
//! ├── scan.rs     ◄─── `medscan run`: the host loop
//! └── config.rs   ◄─── `medscan config show | init`
//! ```
//!
//! ## Stdin Commands
//! While `medscan run` is active, each input line is one [`HostCommand`].
//! `start` and `stop` are forwarded to the session; the rest are answered
//! from the host's own view state.

pub mod config;
pub mod scan;

use std::str::FromStr;

use crate::error::HostError;

/// One line of operator input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCommand {
    Start,
    Stop,
    State,
    History,
    Clear,
    Help,
    Quit,
}

/// Help lines, in display order.
pub const HELP: &[&str] = &[
    "start     open the camera and begin scanning",
    "stop      release the camera",
    "state     show session state and last scanned code",
    "history   list recently scanned codes, newest first",
    "clear     clear the scan history",
    "help      show this list",
    "quit      release the camera and exit",
];

impl HostCommand {
    pub fn help() -> Vec<String> {
        HELP.iter().map(|s| s.to_string()).collect()
    }
}

impl FromStr for HostCommand {
    type Err = HostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        match input.to_lowercase().as_str() {
            "start" | "scan" => Ok(HostCommand::Start),
            "stop" => Ok(HostCommand::Stop),
            "state" | "status" => Ok(HostCommand::State),
            "history" | "h" => Ok(HostCommand::History),
            "clear" => Ok(HostCommand::Clear),
            "help" | "?" => Ok(HostCommand::Help),
            "quit" | "exit" | "q" => Ok(HostCommand::Quit),
            _ => Err(HostError::unknown_command(input)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_parse_commands() {
        assert_eq!("start".parse::<HostCommand>().unwrap(), HostCommand::Start);
        assert_eq!("  STOP ".parse::<HostCommand>().unwrap(), HostCommand::Stop);
        assert_eq!("status".parse::<HostCommand>().unwrap(), HostCommand::State);
        assert_eq!("exit".parse::<HostCommand>().unwrap(), HostCommand::Quit);
        assert_eq!("?".parse::<HostCommand>().unwrap(), HostCommand::Help);
    }

    #[test]
    fn test_unknown_command() {
        let err = "scna".parse::<HostCommand>().unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownCommand);
        assert!(err.message.contains("'scna'"));
    }

    #[test]
    fn test_help_lists_every_command() {
        let help = HostCommand::help();
        for name in ["start", "stop", "state", "history", "clear", "help", "quit"] {
            assert!(help.iter().any(|line| line.starts_with(name)), "missing {}", name);
        }
    }
}
