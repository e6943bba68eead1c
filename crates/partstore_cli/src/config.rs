//! Command-line and environment configuration.
//!
//! Every flag falls back to a `PARTSTORE_*` environment variable, which may
//! come from a `.env` file loaded before parsing.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use partstore_core::{default_log_level, LogTarget, PartId};
use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "partstore.sqlite3";

#[derive(Debug, Parser)]
#[command(name = "partstore", version, about = "Manage the inventory part catalog")]
pub struct Cli {
    /// SQLite database file.
    #[arg(long, env = "PARTSTORE_DB_PATH", default_value = DEFAULT_DB_PATH)]
    pub db_path: PathBuf,
    /// trace|debug|info|warn|error. Defaults by build mode.
    #[arg(long, env = "PARTSTORE_LOG_LEVEL")]
    pub log_level: Option<String>,
    /// Absolute directory for rotating log files. Logs go to stderr when unset.
    #[arg(long, env = "PARTSTORE_LOG_DIR")]
    pub log_dir: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Create a part from a JSON body (POST /part).
    Create {
        /// JSON file to read; stdin when omitted.
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Fetch a live part (GET /part/:id).
    Get { id: PartId },
    /// Fetch a live part at an exact version (GET /part/:id/:version).
    GetVersion { id: PartId, version: i64 },
    /// Replace a part's mutable fields from a JSON body (PUT /part/:id).
    Update {
        id: PartId,
        /// JSON file to read; stdin when omitted.
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Tombstone a part (DELETE /part/:id).
    Delete { id: PartId },
}

impl Cli {
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(default_log_level())
    }

    pub fn log_target(&self) -> LogTarget {
        match &self.log_dir {
            Some(dir) => LogTarget::Directory(dir.clone()),
            None => LogTarget::Stderr,
        }
    }
}

/// Accepts the result of loading a `.env` file.
///
/// A missing file is fine. Any other failure is returned, since skipping a
/// broken file would silently fall back to default settings.
pub fn accept_env_file<T>(loaded: dotenvy::Result<T>) -> Result<()> {
    match loaded {
        Ok(_) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(err).context("failed to load .env"),
    }
}
