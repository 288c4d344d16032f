//! Materialize summary rows as a table, replacing any previous version.

use super::metrics::VendorSummaryRow;
use super::schema::quote_ident;
use crate::error::{Result, SummaryError};
use rusqlite::types::Value;
use rusqlite::{params, Connection};

/// Output columns, in table order.
pub const SUMMARY_COLUMNS: [&str; 16] = [
    "VendorNumber",
    "VendorName",
    "Brand",
    "Description",
    "PurchasePrice",
    "ActualPrice",
    "Volume",
    "TotalPurchaseQuantity",
    "TotalPurchaseDollars",
    "TotalSalesQuantity",
    "TotalSalesDollars",
    "FreightCost",
    "GrossProfit",
    "ProfitMargin",
    "StockTurnover",
    "SalesToPurchaseRatio",
];

/// Narrowest column type holding every value: INTEGER, then REAL, else TEXT.
fn infer_type<'a>(values: impl Iterator<Item = &'a Value>) -> &'static str {
    let mut ty = "INTEGER";
    for value in values {
        match value {
            Value::Integer(_) | Value::Null => {}
            Value::Real(_) => ty = "REAL",
            Value::Text(_) | Value::Blob(_) => return "TEXT",
        }
    }
    ty
}

/// INTEGER when every value is whole, else REAL. No rows reads as REAL.
fn infer_measure_type(mut values: impl Iterator<Item = f64>) -> &'static str {
    let mut any = false;
    let whole = values.all(|v| {
        any = true;
        v.fract() == 0.0 && v.abs() < i64::MAX as f64
    });
    if any && whole {
        "INTEGER"
    } else {
        "REAL"
    }
}

fn create_statement(target: &str, rows: &[VendorSummaryRow]) -> String {
    let vendor_type = infer_type(rows.iter().map(|r| &r.vendor_number));
    let brand_type = infer_type(rows.iter().map(|r| &r.brand));
    let measure = |pick: fn(&VendorSummaryRow) -> f64| infer_measure_type(rows.iter().map(pick));

    let columns = SUMMARY_COLUMNS
        .iter()
        .map(|name| {
            let ty = match *name {
                "VendorNumber" => vendor_type,
                "Brand" => brand_type,
                "VendorName" | "Description" => "TEXT",
                "PurchasePrice" => measure(|r| r.purchase_price),
                "ActualPrice" => measure(|r| r.actual_price),
                "TotalPurchaseQuantity" => measure(|r| r.total_purchase_quantity),
                "TotalPurchaseDollars" => measure(|r| r.total_purchase_dollars),
                "TotalSalesQuantity" => measure(|r| r.total_sales_quantity),
                "TotalSalesDollars" => measure(|r| r.total_sales_dollars),
                "FreightCost" => measure(|r| r.freight_cost),
                "GrossProfit" => measure(|r| r.gross_profit),
                // Volume is coerced to float; ratios are quotients.
                _ => "REAL",
            };
            format!("{} {}", quote_ident(name), ty)
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!("CREATE TABLE {} ({})", quote_ident(target), columns)
}

/// Replace `target` with exactly `rows`, in order.
///
/// Drop, create and inserts run in one transaction: on any failure the
/// previous table is left as it was.
pub fn persist(conn: &Connection, rows: &[VendorSummaryRow], target: &str) -> Result<()> {
    if target.trim().is_empty() {
        return Err(SummaryError::InvalidIdentifier(target.to_string()));
    }

    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(&format!("DROP TABLE IF EXISTS {};", quote_ident(target)))?;
    tx.execute_batch(&create_statement(target, rows))?;

    {
        let placeholders = (1..=SUMMARY_COLUMNS.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO {} VALUES ({})",
            quote_ident(target),
            placeholders
        ))?;

        for row in rows {
            stmt.execute(params![
                &row.vendor_number,
                &row.vendor_name,
                &row.brand,
                &row.description,
                row.purchase_price,
                row.actual_price,
                row.volume,
                row.total_purchase_quantity,
                row.total_purchase_dollars,
                row.total_sales_quantity,
                row.total_sales_dollars,
                row.freight_cost,
                row.gross_profit,
                row.profit_margin,
                row.stock_turnover,
                row.sales_to_purchase_ratio,
            ])?;
        }
    }

    tx.commit()?;
    Ok(())
}
