//! `SQLite` schema definitions for partstrack.
//!
//! Status is stored as the legacy `purchased`/`shipped`/`delivered` flag
//! columns; checkpoints are a JSON array replaced on every sync.

/// SQL statement to create the parts table.
pub const CREATE_PARTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS parts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    tracking TEXT NOT NULL DEFAULT '',
    purchased INTEGER NOT NULL DEFAULT 0,
    shipped INTEGER NOT NULL DEFAULT 0,
    delivered INTEGER NOT NULL DEFAULT 0,
    tracking_status TEXT,
    tracking_checkpoints TEXT NOT NULL DEFAULT '[]',
    tracking_updated_at TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// Index for finding parts that still need tracking lookups.
pub const CREATE_DELIVERED_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_parts_delivered ON parts(delivered)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_PARTS_TABLE,
    CREATE_DELIVERED_INDEX,
    CREATE_METADATA_TABLE,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_not_empty() {
        assert!(!SCHEMA_STATEMENTS.is_empty());
        for stmt in SCHEMA_STATEMENTS {
            assert!(!stmt.is_empty());
        }
    }

    #[test]
    fn test_parts_table_has_flag_columns() {
        assert!(CREATE_PARTS_TABLE.contains("purchased INTEGER NOT NULL"));
        assert!(CREATE_PARTS_TABLE.contains("shipped INTEGER NOT NULL"));
        assert!(CREATE_PARTS_TABLE.contains("delivered INTEGER NOT NULL"));
        assert!(CREATE_PARTS_TABLE.contains("tracking_checkpoints TEXT NOT NULL"));
    }
}
