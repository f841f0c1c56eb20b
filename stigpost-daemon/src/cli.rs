//! CLI argument definitions for stigpost-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use stigpost_core::config::StigpostConfig;

/// Stigpost checklist ingestion daemon.
///
/// Accepts CKL checklists and XCCDF scan results over HTTP, stores the
/// normalized documents, and announces every change on the event channel.
#[derive(Parser, Debug)]
#[command(name = "stigpost-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to stigpost.toml configuration file.
    #[arg(short, long, default_value = "/etc/stigpost/stigpost.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Override the HTTP listen address (e.g. 127.0.0.1:8080).
    #[arg(long)]
    pub bind: Option<String>,

    /// Validate configuration file and exit without starting the daemon.
    #[arg(long)]
    pub validate: bool,
}

impl DaemonCli {
    /// Apply command-line overrides on top of a loaded configuration.
    ///
    /// The caller re-validates afterwards.
    pub fn apply_overrides(&self, config: &mut StigpostConfig) {
        if let Some(level) = &self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.general.log_format = format.clone();
        }
        if let Some(bind) = &self.bind {
            config.server.bind = bind.clone();
        }
    }
}
