//! End-to-end summary run: verify, aggregate, clean, materialize.

use super::materialize::persist;
use super::metrics::{compute, VendorSummaryRow};
use super::query::fetch_summary;
use super::schema::verify_tables;
use crate::error::Result;
use crate::logging::RunLog;
use rusqlite::Connection;
use std::time::{Duration, Instant};

/// Wall-clock time spent in each stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct StageTimings {
    pub query: Duration,
    pub clean: Duration,
    pub ingest: Duration,
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub rows: Vec<VendorSummaryRow>,
    pub timings: StageTimings,
}

/// Rebuild `target_table` from the current base facts.
pub fn run(conn: &Connection, target_table: &str, log: &dyn RunLog) -> Result<RunOutcome> {
    verify_tables(conn, log)?;

    log.info("Creating Vendor Summary...");
    let start = Instant::now();
    let raw = fetch_summary(conn, log)?;
    let query = start.elapsed();
    log.info(&format!(
        "Vendor Summary created in {:.2} seconds.",
        query.as_secs_f64()
    ));

    log.info("Cleaning Vendor Summary Data...");
    let start = Instant::now();
    let rows = compute(raw);
    let clean = start.elapsed();
    log.info(&format!("Data cleaned in {:.2} seconds.", clean.as_secs_f64()));

    log.info("Ingesting cleaned data into database...");
    let start = Instant::now();
    persist(conn, &rows, target_table)?;
    log.info(&format!(
        "Data successfully ingested into table '{}'.",
        target_table
    ));
    let ingest = start.elapsed();
    log.info(&format!(
        "Data ingestion completed in {:.2} seconds.",
        ingest.as_secs_f64()
    ));

    Ok(RunOutcome {
        rows,
        timings: StageTimings {
            query,
            clean,
            ingest,
        },
    })
}

/// [`run`] on an owned connection, closing it on every path.
///
/// A failed run is logged before the close, then the error is returned.
pub fn run_and_close(
    conn: Connection,
    target_table: &str,
    log: &dyn RunLog,
) -> Result<RunOutcome> {
    let result = run(&conn, target_table, log);
    if let Err(e) = &result {
        log.error("An error occurred", e);
    }

    match conn.close() {
        Ok(()) => log.info("Database connection closed."),
        Err((_, e)) => log.error("Failed to close database connection", &e),
    }

    result
}
