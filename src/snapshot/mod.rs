//! Whole-database snapshot persistence.
//!
//! The snapshot is a single JSON document holding every table's schema,
//! row-id counter, and rows. Indexes are never persisted; they are
//! rebuilt from row data on load, so a snapshot can never disagree with
//! its indexes.

use crate::catalog::{Column, TableSchema};
use crate::error::{Error, Result};
use crate::storage::{Database, Row, RowId, Table};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

/// Serializable proxy for a whole database
#[derive(serde::Serialize, serde::Deserialize)]
struct SnapshotData {
    tables: Vec<TableData>,
}

/// Serializable proxy for one table
#[derive(serde::Serialize, serde::Deserialize)]
struct TableData {
    name: String,
    columns: Vec<Column>,
    next_row_id: RowId,
    /// (row id, row) pairs in ascending row-id order
    rows: Vec<(RowId, Row)>,
}

/// Write the whole database to `path` as pretty-printed JSON.
pub fn save(db: &Database, path: impl AsRef<Path>) -> Result<()> {
    let data = SnapshotData {
        tables: db
            .tables()
            .map(|table| TableData {
                name: table.name().to_string(),
                columns: table.schema().columns().to_vec(),
                next_row_id: table.next_row_id(),
                rows: table.scan().map(|(id, row)| (id, row.clone())).collect(),
            })
            .collect(),
    };

    let json = serde_json::to_string_pretty(&data).map_err(|e| Error::SnapshotDecode(e.to_string()))?;
    std::fs::write(&path, json)?;
    info!(path = %path.as_ref().display(), tables = data.tables.len(), "saved snapshot");
    Ok(())
}

/// Load a database from a snapshot file.
pub fn load(path: impl AsRef<Path>) -> Result<Database> {
    let json = std::fs::read_to_string(&path)?;
    let data: SnapshotData =
        serde_json::from_str(&json).map_err(|e| Error::SnapshotDecode(e.to_string()))?;

    let mut db = Database::new();
    for table_data in data.tables {
        let schema = TableSchema::from_columns(&table_data.name, table_data.columns)?;
        let rows: BTreeMap<RowId, Row> = table_data.rows.into_iter().collect();
        db.insert_table(Table::from_parts(
            table_data.name,
            schema,
            table_data.next_row_id,
            rows,
        ));
    }

    info!(path = %path.as_ref().display(), tables = db.table_names().len(), "loaded snapshot");
    Ok(db)
}

/// Load a database from a snapshot file, falling back to an empty
/// database when the file is missing or unreadable. A missing file is the
/// normal first-run case; anything else is logged.
pub fn load_or_default(path: impl AsRef<Path>) -> Database {
    match load(&path) {
        Ok(db) => db,
        Err(Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.as_ref().display(), "no snapshot found, starting empty");
            Database::new()
        }
        Err(e) => {
            warn!(path = %path.as_ref().display(), error = %e, "snapshot unreadable, starting empty");
            Database::new()
        }
    }
}
