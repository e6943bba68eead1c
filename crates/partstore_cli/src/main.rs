//! Part store command-line entry point.
//!
//! # Responsibility
//! - Bootstrap configuration, logging and storage for one invocation.
//! - Run a single part route and print `{"status", "body"}` to stdout.

mod commands;
mod config;

use anyhow::{Context, Result};
use clap::Parser;
use commands::{handle, Outcome, Request};
use config::Cli;
use log::info;
use partstore_core::db::open_db;
use partstore_core::{init_logging, PartService, SqlitePartRepository};
use std::io::Read;
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(err) = config::accept_env_file(dotenvy::dotenv()) {
        eprintln!("partstore: {err:#}");
        return ExitCode::FAILURE;
    }
    let cli = Cli::parse();

    match run(&cli) {
        Ok(outcome) => {
            println!("{}", outcome.render());
            if outcome.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            eprintln!("partstore: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<Outcome> {
    init_logging(cli.log_level(), cli.log_target())
        .map_err(anyhow::Error::msg)
        .context("failed to initialize logging")?;
    info!(
        "event=cli_start module=cli status=ok version={} db_path={}",
        partstore_core::core_version(),
        cli.db_path.display()
    );

    let request = Request::from_command(&cli.command, read_body)?;
    let mut conn = open_db(&cli.db_path)
        .with_context(|| format!("failed to open database `{}`", cli.db_path.display()))?;
    let repo = SqlitePartRepository::try_new(&mut conn).context("database is not ready")?;
    let mut service = PartService::new(repo);

    handle(&mut service, request)
}

fn read_body(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read `{}`", path.display())),
        None => {
            let mut body = String::new();
            std::io::stdin()
                .read_to_string(&mut body)
                .context("failed to read part body from stdin")?;
            Ok(body)
        }
    }
}
