//! # Config Commands
//!
//! `medscan config show` prints the effective configuration; `medscan config
//! init` writes a default `scanner.toml`.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context};
use medscan_session::ScannerConfig;
use serde::Serialize;
use tracing::info;

use crate::error::HostError;
use crate::output::{OutputWriter, Render};

/// Effective configuration together with where it was looked up.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigView<'a> {
    pub path: Option<PathBuf>,
    pub config: &'a ScannerConfig,
}

impl Render for ConfigView<'_> {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        match &self.path {
            Some(path) => writeln!(w, "# {}", path.display())?,
            None => writeln!(w, "# no config path available, showing defaults")?,
        }
        let body = toml::to_string_pretty(self.config)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        write!(w, "{}", body)
    }
}

/// Result of `config init`.
#[derive(Debug, Serialize)]
pub struct ConfigWritten {
    pub path: PathBuf,
}

impl Render for ConfigWritten {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "wrote {}", self.path.display())
    }
}

/// Prints the effective configuration.
pub fn show<W: Write>(
    config: &ScannerConfig,
    path: Option<PathBuf>,
    out: &mut OutputWriter<W>,
) -> Result<(), HostError> {
    let path = path.or_else(ScannerConfig::default_config_path);
    out.render(&ConfigView { path, config })
}

/// Writes a default config file, refusing to overwrite unless `force`.
pub fn init(path: Option<PathBuf>, force: bool) -> anyhow::Result<ConfigWritten> {
    let path = path
        .or_else(ScannerConfig::default_config_path)
        .context("no config directory available on this platform; pass --config")?;

    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    let path = ScannerConfig::default().save(Some(path))?;
    info!(?path, "Default scanner config written");
    Ok(ConfigWritten { path })
}
