//! Vendor Summary
//!
//! Rebuilds the `vendor_sales_summary` table from the vendor invoice,
//! purchase and sales facts of a SQLite database, then prints a sample of
//! the result with aggregate statistics.
//!
//! Usage:
//!   cargo run --release --bin vendor_summary -- --db-path ./inventory.db
//!   cargo run --release --bin vendor_summary -- --config summary.toml --json

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use rusqlite::{Connection, OpenFlags};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

use vendor_summary::{
    config::{ConfigOverrides, SummaryConfig},
    logging::{init_tracing, RunLog, TracingLog},
    report,
    summary::{self, RunOutcome},
};

/// Vendor sales summary builder
#[derive(Parser, Debug)]
#[command(name = "vendor_summary")]
#[command(about = "Aggregate purchases, sales and freight into a per-vendor summary table")]
struct Cli {
    /// Path to the SQLite database
    #[arg(short, long, env = "VENDOR_SUMMARY_DB")]
    db_path: Option<PathBuf>,

    /// Table to (re)create with the summary
    #[arg(short, long)]
    target_table: Option<String>,

    /// Append-mode log file
    #[arg(long, env = "VENDOR_SUMMARY_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Number of rows to print in the sample
    #[arg(short, long)]
    sample_rows: Option<usize>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG overrides
    #[arg(long, env = "VENDOR_SUMMARY_LOG")]
    log_level: Option<String>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the report as JSON instead of tables
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    let config = SummaryConfig::resolve(cli.config.as_deref())
        .context("Failed to load configuration")?
        .apply(ConfigOverrides {
            db_path: cli.db_path,
            target_table: cli.target_table,
            log_file: cli.log_file,
            sample_rows: cli.sample_rows,
            log_level: cli.log_level,
        });

    init_tracing(&config.log_level, &config.log_file)?;

    let total_start = Instant::now();
    let log = TracingLog;

    let result = match open_store(&config) {
        Ok(conn) => {
            log.info("Database connection established.");
            // Run failures are logged by run_and_close ahead of the close.
            match summary::run_and_close(conn, &config.target_table, &log) {
                Ok(outcome) => {
                    print_report(&outcome, &config, cli.json).map_err(|e| log_failure(&log, e))
                }
                Err(e) => Err(e.into()),
            }
        }
        Err(e) => Err(log_failure(&log, e)),
    };

    info!(
        "Total Script Runtime: {:.2} seconds.",
        total_start.elapsed().as_secs_f64()
    );

    result
}

fn log_failure(log: &dyn RunLog, e: anyhow::Error) -> anyhow::Error {
    let cause: &(dyn std::error::Error + 'static) = e.as_ref();
    log.error("An error occurred", cause);
    e
}

fn open_store(config: &SummaryConfig) -> Result<Connection> {
    Connection::open_with_flags(
        &config.db_path,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("Failed to open database: {:?}", config.db_path))
}

fn print_report(outcome: &RunOutcome, config: &SummaryConfig, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            report::report_json(
                &outcome.rows,
                config.sample_rows,
                &config.target_table,
                &outcome.timings
            )?
        );
    } else {
        report::print_report(&outcome.rows, config.sample_rows);
    }

    Ok(())
}
