//! Cleaning and derived business ratios.
//!
//! Pure transform from raw aggregate rows to [`VendorSummaryRow`]s. Every
//! missing value counts as 0, names are trimmed, and ratios use
//! [`safe_ratio`] so a zero denominator never yields NaN or infinity.

use super::query::RawSummaryRow;
use rusqlite::types::Value;
use serde::Serialize;

/// One materialized summary row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VendorSummaryRow {
    /// Stored as found in `purchases`; NULL becomes `0`.
    #[serde(serialize_with = "serialize_value")]
    pub vendor_number: Value,
    pub vendor_name: String,
    #[serde(serialize_with = "serialize_value")]
    pub brand: Value,
    pub description: String,
    pub purchase_price: f64,
    pub actual_price: f64,
    pub volume: f64,
    pub total_purchase_quantity: f64,
    pub total_purchase_dollars: f64,
    pub total_sales_quantity: f64,
    pub total_sales_dollars: f64,
    pub freight_cost: f64,
    pub gross_profit: f64,
    pub profit_margin: f64,
    pub stock_turnover: f64,
    pub sales_to_purchase_ratio: f64,
}

/// `numerator / denominator`, dividing by 1 when the denominator is 0.
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        numerator
    } else {
        numerator / denominator
    }
}

/// Numeric reading of a value: NULL, blobs and unparseable text are 0.
pub fn numeric_or_zero(value: &Value) -> f64 {
    match value {
        Value::Null | Value::Blob(_) => 0.0,
        Value::Integer(i) => *i as f64,
        Value::Real(r) if r.is_finite() => *r,
        Value::Real(_) => 0.0,
        Value::Text(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .unwrap_or(0.0),
    }
}

/// Trimmed text form of a value; NULL reads as `"0"`.
pub fn trimmed_text(value: &Value) -> String {
    match value {
        Value::Null => "0".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(r) => format!("{:?}", r),
        Value::Text(s) => s.trim().to_string(),
        Value::Blob(b) => String::from_utf8_lossy(b).trim().to_string(),
    }
}

fn null_to_zero(value: Value) -> Value {
    match value {
        Value::Null => Value::Integer(0),
        other => other,
    }
}

impl VendorSummaryRow {
    pub fn from_raw(raw: RawSummaryRow) -> Self {
        let total_purchase_quantity = numeric_or_zero(&raw.total_purchase_quantity);
        let total_purchase_dollars = numeric_or_zero(&raw.total_purchase_dollars);
        let total_sales_quantity = numeric_or_zero(&raw.total_sales_quantity);
        let total_sales_dollars = numeric_or_zero(&raw.total_sales_dollars);

        let gross_profit = total_sales_dollars - total_purchase_dollars;

        Self {
            vendor_name: trimmed_text(&raw.vendor_name),
            description: trimmed_text(&raw.description),
            purchase_price: numeric_or_zero(&raw.purchase_price),
            actual_price: numeric_or_zero(&raw.actual_price),
            volume: numeric_or_zero(&raw.volume),
            freight_cost: numeric_or_zero(&raw.freight_cost),
            vendor_number: null_to_zero(raw.vendor_number),
            brand: null_to_zero(raw.brand),
            total_purchase_quantity,
            total_purchase_dollars,
            total_sales_quantity,
            total_sales_dollars,
            gross_profit,
            profit_margin: safe_ratio(gross_profit, total_sales_dollars),
            stock_turnover: safe_ratio(total_sales_quantity, total_purchase_quantity),
            sales_to_purchase_ratio: safe_ratio(total_sales_dollars, total_purchase_dollars),
        }
    }
}

/// Clean every row and derive its ratios. Row order is preserved.
pub fn compute(rows: Vec<RawSummaryRow>) -> Vec<VendorSummaryRow> {
    rows.into_iter().map(VendorSummaryRow::from_raw).collect()
}

fn serialize_value<S: serde::Serializer>(value: &Value, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Value::Null => serializer.serialize_none(),
        Value::Integer(i) => serializer.serialize_i64(*i),
        Value::Real(r) => serializer.serialize_f64(*r),
        Value::Text(s) => serializer.serialize_str(s),
        Value::Blob(b) => serializer.serialize_str(&String::from_utf8_lossy(b)),
    }
}
