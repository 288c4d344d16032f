//! Vendor sales summary pipeline
//!
//! - `schema`: catalog inspection, product column detection, table gate
//! - `query`: the three-way aggregation query and its raw rows
//! - `metrics`: null-fill, normalization and derived ratios
//! - `materialize`: atomic replace of the output table
//! - `pipeline`: the stages in order, with timings

pub mod materialize;
pub mod metrics;
pub mod pipeline;
pub mod query;
pub mod schema;

pub use materialize::{persist, SUMMARY_COLUMNS};
pub use metrics::{compute, safe_ratio, VendorSummaryRow};
pub use pipeline::{run, run_and_close, RunOutcome, StageTimings};
pub use query::{build_query, fetch_summary, RawSummaryRow};
pub use schema::{
    columns_of, detect_product_column, list_tables, verify_tables, ProductColumn,
    PRODUCT_COLUMN_CANDIDATES, REQUIRED_TABLES,
};
