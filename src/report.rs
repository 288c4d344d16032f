//! Console report for a finished run: a sample of rows plus aggregate stats.

use crate::summary::{StageTimings, VendorSummaryRow, SUMMARY_COLUMNS};
use rusqlite::types::Value;
use serde::Serialize;
use std::collections::HashSet;

/// Aggregate statistics over the summary rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    pub vendor_count: usize,
    pub record_count: usize,
    pub total_gross_profit: f64,
    /// Mean of ProfitMargin; 0 when there are no rows
    pub average_profit_margin: f64,
}

impl SummaryStats {
    pub fn from_rows(rows: &[VendorSummaryRow]) -> Self {
        let vendors: HashSet<String> = rows.iter().map(|r| value_key(&r.vendor_number)).collect();
        let total_gross_profit = rows.iter().map(|r| r.gross_profit).sum::<f64>();
        let average_profit_margin = if rows.is_empty() {
            0.0
        } else {
            rows.iter().map(|r| r.profit_margin).sum::<f64>() / rows.len() as f64
        };

        Self {
            vendor_count: vendors.len(),
            record_count: rows.len(),
            total_gross_profit,
            average_profit_margin,
        }
    }
}

fn value_key(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(i) => format!("i:{}", i),
        Value::Real(r) => format!("r:{}", r),
        Value::Text(s) => format!("t:{}", s),
        Value::Blob(b) => format!("b:{:?}", b),
    }
}

fn value_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Integer(i) => i.to_string(),
        Value::Real(r) => format!("{:.2}", r),
        Value::Text(s) => s.clone(),
        Value::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

fn cells(row: &VendorSummaryRow) -> Vec<String> {
    let number = |v: f64| format!("{:.2}", v);
    vec![
        value_cell(&row.vendor_number),
        row.vendor_name.clone(),
        value_cell(&row.brand),
        row.description.clone(),
        number(row.purchase_price),
        number(row.actual_price),
        number(row.volume),
        number(row.total_purchase_quantity),
        number(row.total_purchase_dollars),
        number(row.total_sales_quantity),
        number(row.total_sales_dollars),
        number(row.freight_cost),
        number(row.gross_profit),
        format!("{:.4}", row.profit_margin),
        format!("{:.4}", row.stock_turnover),
        format!("{:.4}", row.sales_to_purchase_ratio),
    ]
}

/// Right-aligned table of the first `limit` rows.
pub fn render_sample(rows: &[VendorSummaryRow], limit: usize) -> String {
    let body: Vec<Vec<String>> = rows.iter().take(limit).map(cells).collect();

    let widths: Vec<usize> = SUMMARY_COLUMNS
        .iter()
        .enumerate()
        .map(|(i, header)| {
            body.iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(header.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = pad_line(SUMMARY_COLUMNS.iter().copied(), &widths);
    for row in &body {
        out.push('\n');
        out.push_str(&pad_line(row.iter().map(String::as_str), &widths));
    }
    out
}

fn pad_line<'a>(values: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    values
        .zip(widths)
        .map(|(v, w)| format!("{:>width$}", v, width = *w))
        .collect::<Vec<_>>()
        .join(" ")
}

/// `1234567.891` -> `1,234,567.89`
pub fn format_thousands(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && formatted != "0.00" { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}

/// Stats block as printed after a successful run.
pub fn render_stats(stats: &SummaryStats) -> String {
    format!(
        "Total Vendors: {}\nTotal Records: {}\nTotal Gross Profit: ${}\nAverage Profit Margin: {:.2}%",
        stats.vendor_count,
        stats.record_count,
        format_thousands(stats.total_gross_profit),
        stats.average_profit_margin * 100.0
    )
}

/// Print the sample and stats banners to stdout.
pub fn print_report(rows: &[VendorSummaryRow], sample_rows: usize) {
    let stats = SummaryStats::from_rows(rows);
    println!();
    println!("================ SAMPLE OUTPUT ================");
    println!("{}", render_sample(rows, sample_rows));
    println!();
    println!("================ SUMMARY STATS ================");
    println!("{}", render_stats(&stats));
    println!("==============================================");
}

/// Machine-readable report.
pub fn report_json(
    rows: &[VendorSummaryRow],
    sample_rows: usize,
    target_table: &str,
    timings: &StageTimings,
) -> serde_json::Result<String> {
    use serde_json::json;

    let report = json!({
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "target_table": target_table,
        "stats": SummaryStats::from_rows(rows),
        "timings": {
            "query_seconds": timings.query.as_secs_f64(),
            "clean_seconds": timings.clean.as_secs_f64(),
            "ingest_seconds": timings.ingest.as_secs_f64(),
        },
        "sample": rows.iter().take(sample_rows).collect::<Vec<_>>(),
    });
    serde_json::to_string_pretty(&report)
}
