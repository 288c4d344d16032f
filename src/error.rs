//! Errors surfaced by the summary pipeline.

/// Errors from schema verification, the summary query, or materialization.
#[derive(Debug)]
pub enum SummaryError {
    /// Required base tables absent from the store (and not auto-creatable).
    MissingTables(Vec<String>),
    /// Connection, query execution, or write failure.
    Store(rusqlite::Error),
    /// Table name that cannot be used as an identifier.
    InvalidIdentifier(String),
}

impl std::fmt::Display for SummaryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingTables(tables) => {
                write!(f, "Missing required tables: {}", tables.join(", "))
            }
            Self::Store(e) => write!(f, "SQLite error: {}", e),
            Self::InvalidIdentifier(name) => write!(f, "Invalid table name: {:?}", name),
        }
    }
}

impl std::error::Error for SummaryError {}

impl From<rusqlite::Error> for SummaryError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Store(e)
    }
}

pub type Result<T> = std::result::Result<T, SummaryError>;
