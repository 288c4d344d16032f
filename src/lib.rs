//! Vendor Sales Summary
//!
//! Builds the per-vendor, per-brand purchasing/sales summary from the base
//! fact tables of a SQLite store and materializes it as
//! `vendor_sales_summary`.

pub mod config;
pub mod error;
pub mod logging;
pub mod report;
pub mod summary;

pub use error::{Result, SummaryError};
