//! Summary aggregation query
//!
//! Three independent grouped aggregates (freight, purchases, sales) joined so
//! that every purchase group survives:
//!
//! ```sql
//! WITH FreightSummary  AS (... GROUP BY VendorNumber),
//!      PurchaseSummary AS (... [LEFT JOIN product_prices] GROUP BY <7-column key>),
//!      SalesSummary    AS (... GROUP BY VendorNo, Brand)
//! SELECT ... FROM PurchaseSummary
//!   LEFT JOIN SalesSummary ... LEFT JOIN FreightSummary ...
//! ORDER BY TotalPurchaseDollars DESC
//! ```

use super::schema::{columns_of, detect_product_column, quote_ident, ProductColumn};
use crate::error::Result;
use crate::logging::RunLog;
use rusqlite::types::Value;
use rusqlite::{Connection, Row};

/// One row of the aggregation query, typed as SQLite returned it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSummaryRow {
    pub vendor_number: Value,
    pub vendor_name: Value,
    pub brand: Value,
    pub description: Value,
    pub purchase_price: Value,
    pub actual_price: Value,
    pub volume: Value,
    pub total_purchase_quantity: Value,
    pub total_purchase_dollars: Value,
    pub total_sales_quantity: Value,
    pub total_sales_dollars: Value,
    pub freight_cost: Value,
}

impl RawSummaryRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            vendor_number: row.get(0)?,
            vendor_name: row.get(1)?,
            brand: row.get(2)?,
            description: row.get(3)?,
            purchase_price: row.get(4)?,
            actual_price: row.get(5)?,
            volume: row.get(6)?,
            total_purchase_quantity: row.get(7)?,
            total_purchase_dollars: row.get(8)?,
            total_sales_quantity: row.get(9)?,
            total_sales_dollars: row.get(10)?,
            freight_cost: row.get(11)?,
        })
    }
}

/// Build the summary query for the detected product column.
///
/// With a product column, purchases are enriched from `product_prices`;
/// without one, ActualPrice and Volume are NULL and no join is emitted.
pub fn build_query(product_column: ProductColumn) -> String {
    let (actual_price, volume, join_clause) = match product_column {
        ProductColumn::Found(column) => (
            "pp.Price AS ActualPrice",
            "pp.Volume AS Volume",
            format!(
                "LEFT JOIN product_prices pp ON p.{} = pp.ProductID",
                quote_ident(column)
            ),
        ),
        ProductColumn::NotFound => ("NULL AS ActualPrice", "NULL AS Volume", String::new()),
    };

    format!(
        r#"
        WITH FreightSummary AS (
            SELECT
                VendorNumber,
                SUM(Freight) AS FreightCost
            FROM vendor_invoice
            GROUP BY VendorNumber
        ),
        PurchaseSummary AS (
            SELECT
                p.VendorNumber,
                p.VendorName,
                p.Brand,
                p.Description,
                p.PurchasePrice,
                {actual_price},
                {volume},
                SUM(p.Quantity) AS TotalPurchaseQuantity,
                SUM(p.Dollars) AS TotalPurchaseDollars
            FROM purchases p
            {join_clause}
            GROUP BY p.VendorNumber, p.VendorName, p.Brand, p.Description, p.PurchasePrice, ActualPrice, Volume
        ),
        SalesSummary AS (
            SELECT
                VendorNo,
                Brand,
                SUM(SalesQuantity) AS TotalSalesQuantity,
                SUM(SalesDollars) AS TotalSalesDollars
            FROM sales
            GROUP BY VendorNo, Brand
        )
        SELECT
            ps.VendorNumber AS VendorNumber,
            ps.VendorName AS VendorName,
            ps.Brand AS Brand,
            ps.Description AS Description,
            ps.PurchasePrice AS PurchasePrice,
            ps.ActualPrice AS ActualPrice,
            ps.Volume AS Volume,
            ps.TotalPurchaseQuantity AS TotalPurchaseQuantity,
            ps.TotalPurchaseDollars AS TotalPurchaseDollars,
            ss.TotalSalesQuantity AS TotalSalesQuantity,
            ss.TotalSalesDollars AS TotalSalesDollars,
            fs.FreightCost AS FreightCost
        FROM PurchaseSummary ps
        LEFT JOIN SalesSummary ss
            ON ps.VendorNumber = ss.VendorNo AND ps.Brand = ss.Brand
        LEFT JOIN FreightSummary fs
            ON ps.VendorNumber = fs.VendorNumber
        ORDER BY ps.TotalPurchaseDollars DESC,
            ps.VendorNumber, ps.VendorName, ps.Brand, ps.Description, ps.PurchasePrice,
            ps.ActualPrice, ps.Volume
        "#
    )
}

/// Inspect `purchases`, run the matching summary query and collect its rows.
pub fn fetch_summary(conn: &Connection, log: &dyn RunLog) -> Result<Vec<RawSummaryRow>> {
    let product_column = detect_product_column(&columns_of(conn, "purchases")?);
    match product_column {
        ProductColumn::Found(column) => {
            log.info(&format!("Joining product_prices on purchases.{}", column))
        }
        ProductColumn::NotFound => {
            log.info("No product identifier column in purchases; skipping price enrichment")
        }
    }

    let query = build_query(product_column);
    let mut stmt = conn.prepare(&query)?;
    let rows = stmt
        .query_map([], RawSummaryRow::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::test_support::MemoryLog;

    fn base_schema(product_column: Option<&str>) -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        let extra = product_column
            .map(|c| format!(", {} INTEGER", c))
            .unwrap_or_default();
        conn.execute_batch(&format!(
            r#"
            CREATE TABLE vendor_invoice (VendorNumber INTEGER, Freight REAL);
            CREATE TABLE purchases (
                VendorNumber INTEGER, VendorName TEXT, Brand INTEGER, Description TEXT,
                PurchasePrice REAL, Quantity INTEGER, Dollars REAL{extra}
            );
            CREATE TABLE sales (VendorNo INTEGER, Brand INTEGER, SalesQuantity INTEGER, SalesDollars REAL);
            CREATE TABLE product_prices (ProductID INTEGER PRIMARY KEY, Brand INTEGER, Price DECIMAL(10,2), Volume DECIMAL(10,2));
            "#
        ))
        .unwrap();
        conn
    }

    #[test]
    fn test_unenriched_query_has_no_join() {
        let sql = build_query(ProductColumn::NotFound);
        assert!(!sql.contains("product_prices"));
        assert!(sql.contains("NULL AS ActualPrice"));
        assert!(sql.contains("NULL AS Volume"));
    }

    #[test]
    fn test_enriched_query_joins_on_detected_column() {
        let sql = build_query(ProductColumn::Found("SKU"));
        assert!(sql.contains("LEFT JOIN product_prices pp ON p.\"SKU\" = pp.ProductID"));
        assert!(sql.contains("pp.Price AS ActualPrice"));
        assert!(sql.contains("pp.Volume AS Volume"));
    }

    #[test]
    fn test_both_shapes_prepare_against_base_schema() {
        let conn = base_schema(Some("ProductID"));
        conn.prepare(&build_query(ProductColumn::Found("ProductID")))
            .unwrap();
        conn.prepare(&build_query(ProductColumn::NotFound)).unwrap();
    }

    #[test]
    fn test_groups_are_aggregated_and_sorted_by_purchase_dollars() {
        let conn = base_schema(None);
        conn.execute_batch(
            r#"
            INSERT INTO purchases VALUES (1, 'Acme', 10, 'Gin', 5.0, 2, 10.0);
            INSERT INTO purchases VALUES (1, 'Acme', 10, 'Gin', 5.0, 3, 15.0);
            INSERT INTO purchases VALUES (2, 'Bolt', 20, 'Rum', 9.0, 10, 90.0);
            INSERT INTO sales VALUES (1, 10, 4, 40.0);
            INSERT INTO sales VALUES (1, 10, 1, 12.5);
            INSERT INTO vendor_invoice VALUES (1, 3.5);
            INSERT INTO vendor_invoice VALUES (1, 1.5);
            INSERT INTO vendor_invoice VALUES (2, 7.0);
            "#,
        )
        .unwrap();

        let rows = fetch_summary(&conn, &MemoryLog::default()).unwrap();
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].vendor_number, Value::Integer(2));
        assert_eq!(rows[0].total_purchase_dollars, Value::Real(90.0));
        assert_eq!(rows[0].total_sales_dollars, Value::Null);
        assert_eq!(rows[0].freight_cost, Value::Real(7.0));

        assert_eq!(rows[1].vendor_number, Value::Integer(1));
        assert_eq!(rows[1].total_purchase_quantity, Value::Integer(5));
        assert_eq!(rows[1].total_purchase_dollars, Value::Real(25.0));
        assert_eq!(rows[1].total_sales_quantity, Value::Integer(5));
        assert_eq!(rows[1].total_sales_dollars, Value::Real(52.5));
        assert_eq!(rows[1].freight_cost, Value::Real(5.0));
        assert_eq!(rows[1].actual_price, Value::Null);
        assert_eq!(rows[1].volume, Value::Null);
    }

    #[test]
    fn test_equal_dollars_tie_break_on_vendor_name() {
        let conn = base_schema(None);
        conn.execute_batch(
            r#"
            INSERT INTO purchases VALUES (1, 'Zephyr Spirits', 10, 'Gin', 5.0, 2, 10.0);
            INSERT INTO purchases VALUES (1, 'Alder Wines', 10, 'Gin', 5.0, 2, 10.0);
            "#,
        )
        .unwrap();

        let rows = fetch_summary(&conn, &MemoryLog::default()).unwrap();
        let names: Vec<&Value> = rows.iter().map(|r| &r.vendor_name).collect();
        assert_eq!(
            names,
            [
                &Value::Text("Alder Wines".into()),
                &Value::Text("Zephyr Spirits".into())
            ]
        );
        assert!(build_query(ProductColumn::NotFound).contains("ps.VendorNumber, ps.VendorName, ps.Brand"));
    }

    #[test]
    fn test_enrichment_pulls_price_and_volume() {
        let conn = base_schema(Some("ItemID"));
        conn.execute_batch(
            r#"
            INSERT INTO purchases VALUES (1, 'Acme', 10, 'Gin', 5.0, 2, 10.0, 77);
            INSERT INTO purchases VALUES (1, 'Acme', 10, 'Gin', 5.0, 1, 5.0, 78);
            INSERT INTO product_prices VALUES (77, 10, 12.99, 750);
            "#,
        )
        .unwrap();

        let log = MemoryLog::default();
        let rows = fetch_summary(&conn, &log).unwrap();
        assert!(log.infos.borrow()[0].contains("purchases.ItemID"));

        // Different reference prices split the same vendor/brand into two groups.
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].actual_price, Value::Real(12.99));
        assert_eq!(rows[0].volume, Value::Integer(750));
        assert_eq!(rows[1].actual_price, Value::Null);
    }

    #[test]
    fn test_missing_base_table_surfaces_as_store_error() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE purchases (VendorNumber INTEGER);")
            .unwrap();
        let err = fetch_summary(&conn, &MemoryLog::default()).unwrap_err();
        assert!(matches!(err, crate::error::SummaryError::Store(_)));
    }
}
