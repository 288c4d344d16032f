//! Schema inspection and verification
//!
//! Reads the SQLite catalog, picks the purchases column that identifies a
//! product, and gates the run on the required base tables.

use crate::error::{Result, SummaryError};
use crate::logging::RunLog;
use rusqlite::Connection;
use std::collections::HashSet;

/// Tables the summary reads, in reporting order.
pub const REQUIRED_TABLES: [&str; 4] = ["vendor_invoice", "purchases", "sales", "product_prices"];

/// The only required table the verifier may create.
pub const PRICE_TABLE: &str = "product_prices";

/// Product identifier candidates, highest priority first.
pub const PRODUCT_COLUMN_CANDIDATES: [&str; 4] = ["ProductID", "ItemID", "SKU", "ProductCode"];

/// Outcome of product column detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductColumn {
    Found(&'static str),
    NotFound,
}

/// Names of all tables in the store.
pub fn list_tables(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type='table'")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(names)
}

/// Column names of `table` in declaration order. Empty if the table is absent.
pub fn columns_of(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(names)
}

/// First candidate from [`PRODUCT_COLUMN_CANDIDATES`] present in `columns`.
pub fn detect_product_column<S: AsRef<str>>(columns: &[S]) -> ProductColumn {
    PRODUCT_COLUMN_CANDIDATES
        .iter()
        .find(|candidate| columns.iter().any(|c| c.as_ref() == **candidate))
        .map_or(ProductColumn::NotFound, |c| ProductColumn::Found(*c))
}

fn missing_tables(conn: &Connection) -> Result<Vec<&'static str>> {
    let existing: HashSet<String> = list_tables(conn)?.into_iter().collect();
    Ok(REQUIRED_TABLES
        .iter()
        .copied()
        .filter(|t| !existing.contains(*t))
        .collect())
}

/// Ensure every required table exists, creating an empty `product_prices`
/// when it is the one missing.
///
/// `ProductID` is declared `INT`, not `INTEGER`, so it is not a rowid alias
/// and accepts text codes such as SKUs.
pub fn verify_tables(conn: &Connection, log: &dyn RunLog) -> Result<()> {
    let mut missing = missing_tables(conn)?;

    if missing.contains(&PRICE_TABLE) {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS product_prices (
                ProductID INT PRIMARY KEY,
                Brand INT,
                Price DECIMAL(10,2),
                Volume DECIMAL(10,2)
            );",
        )?;
        log.info("Table 'product_prices' created automatically.");
        missing = missing_tables(conn)?;
    }

    if !missing.is_empty() {
        return Err(SummaryError::MissingTables(
            missing.into_iter().map(String::from).collect(),
        ));
    }

    log.info("All required tables verified successfully.");
    Ok(())
}

/// Double-quote an SQLite identifier.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::test_support::MemoryLog;

    fn conn_with(tables: &[&str]) -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        for t in tables {
            conn.execute_batch(&format!("CREATE TABLE {} (id INTEGER);", t))
                .unwrap();
        }
        conn
    }

    #[test]
    fn test_detection_follows_priority_not_column_order() {
        assert_eq!(
            detect_product_column(&["SKU", "ProductID"]),
            ProductColumn::Found("ProductID")
        );
        assert_eq!(
            detect_product_column(&["ProductCode", "SKU", "ItemID"]),
            ProductColumn::Found("ItemID")
        );
        assert_eq!(
            detect_product_column(&["ProductCode"]),
            ProductColumn::Found("ProductCode")
        );
    }

    #[test]
    fn test_detection_is_case_sensitive_and_can_miss() {
        assert_eq!(
            detect_product_column(&["productid", "Brand"]),
            ProductColumn::NotFound
        );
        let empty: [&str; 0] = [];
        assert_eq!(detect_product_column(&empty), ProductColumn::NotFound);
    }

    #[test]
    fn test_columns_of_preserves_declaration_order() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE purchases (VendorNumber INTEGER, SKU TEXT, Brand INTEGER);")
            .unwrap();
        assert_eq!(
            columns_of(&conn, "purchases").unwrap(),
            vec!["VendorNumber", "SKU", "Brand"]
        );
        assert!(columns_of(&conn, "absent").unwrap().is_empty());
    }

    #[test]
    fn test_missing_sales_fails_after_creating_prices() {
        let conn = conn_with(&["vendor_invoice", "purchases"]);
        let log = MemoryLog::default();

        let err = verify_tables(&conn, &log).unwrap_err();
        match err {
            SummaryError::MissingTables(tables) => assert_eq!(tables, vec!["sales"]),
            other => panic!("unexpected error: {}", other),
        }

        let tables = list_tables(&conn).unwrap();
        assert!(tables.iter().any(|t| t == PRICE_TABLE));
        assert_eq!(
            columns_of(&conn, PRICE_TABLE).unwrap(),
            vec!["ProductID", "Brand", "Price", "Volume"]
        );
        assert_eq!(
            log.infos.borrow().as_slice(),
            ["Table 'product_prices' created automatically."]
        );
    }

    #[test]
    fn test_created_prices_table_accepts_text_codes() {
        let conn = conn_with(&["vendor_invoice", "purchases", "sales"]);
        verify_tables(&conn, &MemoryLog::default()).unwrap();

        conn.execute(
            "INSERT INTO product_prices VALUES ('SKU-A', 10, 12.99, 750)",
            [],
        )
        .unwrap();
        conn.execute("INSERT INTO product_prices VALUES (77, 10, 9.5, 1000)", [])
            .unwrap();

        let key: String = conn
            .query_row(
                "SELECT ProductID FROM product_prices WHERE Price = 12.99",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(key, "SKU-A");
    }

    #[test]
    fn test_all_missing_tables_are_named() {
        let conn = conn_with(&[]);
        let err = verify_tables(&conn, &MemoryLog::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required tables: vendor_invoice, purchases, sales"
        );
    }

    #[test]
    fn test_complete_schema_passes_untouched() {
        let conn = conn_with(&["vendor_invoice", "purchases", "sales", "product_prices"]);
        let log = MemoryLog::default();
        verify_tables(&conn, &log).unwrap();
        assert_eq!(
            log.infos.borrow().as_slice(),
            ["All required tables verified successfully."]
        );
    }

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("plain"), "\"plain\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
