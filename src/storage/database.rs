//! The database: an insertion-ordered registry of tables.

use super::table::Table;
use crate::catalog::{Column, TableSchema};
use crate::error::{Error, Result};
use indexmap::IndexMap;

/// A whole database. Plain owned value: multiple independent instances
/// can coexist, e.g. one per test.
#[derive(Debug, Clone, Default)]
pub struct Database {
    tables: IndexMap<String, Table>,
}

impl Database {
    /// Create a new empty database
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new table from column definitions
    pub fn create_table(&mut self, name: &str, columns: Vec<Column>) -> Result<()> {
        if self.tables.contains_key(name) {
            return Err(Error::TableAlreadyExists(name.to_string()));
        }

        let schema = TableSchema::from_columns(name, columns)?;
        self.tables
            .insert(name.to_string(), Table::new(name, schema));
        Ok(())
    }

    /// Register an already-built table (used by snapshot load)
    pub(crate) fn insert_table(&mut self, table: Table) {
        self.tables.insert(table.name().to_string(), table);
    }

    /// Drop a table
    pub fn drop_table(&mut self, name: &str) -> Result<()> {
        self.tables
            .shift_remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    /// Get a table by name
    pub fn table(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    /// Get a mutable table by name
    pub fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    /// Check if a table exists
    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// All tables, in creation order
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    /// All table names, in creation order
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.keys().map(|s| s.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DataType;

    #[test]
    fn test_create_and_get_table() {
        let mut db = Database::new();
        db.create_table(
            "users",
            vec![
                Column::new("id", DataType::Integer).primary_key(true),
                Column::new("name", DataType::Text),
            ],
        )
        .unwrap();

        let table = db.table("users").unwrap();
        assert_eq!(table.name(), "users");
        assert_eq!(table.schema().column_count(), 2);
    }

    #[test]
    fn test_duplicate_table_rejected() {
        let mut db = Database::new();
        db.create_table("t", vec![Column::new("a", DataType::Integer)])
            .unwrap();

        let err = db
            .create_table("t", vec![Column::new("b", DataType::Text)])
            .unwrap_err();
        assert!(matches!(err, Error::TableAlreadyExists(_)));
    }

    #[test]
    fn test_drop_table() {
        let mut db = Database::new();
        db.create_table("t", vec![Column::new("a", DataType::Integer)])
            .unwrap();

        db.drop_table("t").unwrap();
        assert!(!db.has_table("t"));
        assert!(matches!(db.drop_table("t"), Err(Error::TableNotFound(_))));
    }

    #[test]
    fn test_table_names_keep_creation_order() {
        let mut db = Database::new();
        db.create_table("zebra", vec![Column::new("a", DataType::Integer)])
            .unwrap();
        db.create_table("apple", vec![Column::new("a", DataType::Integer)])
            .unwrap();

        assert_eq!(db.table_names(), vec!["zebra", "apple"]);
    }
}
