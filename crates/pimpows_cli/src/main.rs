//! `pimpows` command-line entry point.
//!
//! # Responsibility
//! - Resolve configuration from flags and environment.
//! - Open the ledger database and dispatch subcommands to core services.
//!
//! # Invariants
//! - All business rules live in `pimpows_core`; this crate only parses
//!   input and renders output.

#![forbid(unsafe_code)]

mod commands;
mod render;
mod run;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::Parser;
use commands::Command;
use log::info;
use pimpows_core::{default_log_level, init_logging, LogLevel};
use std::path::PathBuf;

/// Personal-finance ledger: bills, income, expenses, predictions and loans.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Ledger database file.
    #[arg(long, env = "PIMPOWS_DB", default_value = "pimpows.sqlite3", global = true)]
    db: PathBuf,

    /// Absolute directory for rolling log files; logging is off when unset.
    #[arg(long, env = "PIMPOWS_LOG_DIR", global = true)]
    log_dir: Option<PathBuf>,

    #[arg(long, env = "PIMPOWS_LOG_LEVEL", global = true)]
    log_level: Option<LogLevel>,

    /// Reference day for summaries and overdue checks (YYYY-MM-DD).
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    #[command(subcommand)]
    command: Command,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = &cli.log_dir {
        let level = cli.log_level.unwrap_or_else(default_log_level);
        init_logging(level, log_dir).map_err(anyhow::Error::msg)?;
    }

    if let Command::Version = cli.command {
        println!("pimpows_core {}", pimpows_core::core_version());
        return Ok(());
    }

    let conn = pimpows_core::open_db(&cli.db)
        .with_context(|| format!("failed to open ledger at `{}`", cli.db.display()))?;
    let today = cli.today.unwrap_or_else(|| Utc::now().date_naive());
    info!("event=cli_dispatch module=cli status=start today={today}");

    run::dispatch(&conn, cli.command, today)
}
