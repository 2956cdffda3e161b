//! Schema definitions for SnapDB
//!
//! This module defines table schemas and column metadata.

use super::types::DataType;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Column definition in a table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    /// Column name
    pub name: String,
    /// Data type
    pub data_type: DataType,
    /// Is this the primary key?
    pub primary_key: bool,
    /// Is this column unique?
    pub unique: bool,
    /// Does this column reject NULL?
    pub not_null: bool,
}

impl Column {
    /// Create a new nullable, unconstrained column
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            primary_key: false,
            unique: false,
            not_null: false,
        }
    }

    /// Set primary key flag. A primary key is implicitly NOT NULL.
    pub fn primary_key(mut self, pk: bool) -> Self {
        self.primary_key = pk;
        if pk {
            self.not_null = true;
        }
        self
    }

    /// Set unique flag
    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Set NOT NULL flag
    pub fn not_null(mut self, not_null: bool) -> Self {
        self.not_null = not_null;
        self
    }

    /// True when this column is backed by a hash index.
    pub fn is_indexed(&self) -> bool {
        self.primary_key || self.unique
    }
}

/// Table schema - the ordered column layout of a table.
///
/// Column order is significant: INSERT without an explicit column list
/// supplies values in declared order.
#[derive(Debug, Clone)]
pub struct TableSchema {
    /// Ordered list of columns
    columns: Vec<Column>,
    /// Column name to position mapping
    name_to_index: HashMap<String, usize>,
}

impl TableSchema {
    /// Build a schema from column definitions, validating that names are
    /// unique and at most one column is the primary key.
    pub fn from_columns(table: &str, columns: Vec<Column>) -> Result<Self> {
        let mut name_to_index = HashMap::new();
        let mut pk_count = 0;

        for (pos, col) in columns.iter().enumerate() {
            if name_to_index.insert(col.name.clone(), pos).is_some() {
                return Err(Error::DuplicateColumn(col.name.clone(), table.to_string()));
            }
            if col.primary_key {
                pk_count += 1;
            }
        }
        if pk_count > 1 {
            return Err(Error::MultiplePrimaryKeys(table.to_string()));
        }

        Ok(Self {
            columns,
            name_to_index,
        })
    }

    /// Get column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.name_to_index.get(name).map(|&idx| &self.columns[idx])
    }

    /// Get column position by name
    pub fn position(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    /// Get all columns in declared order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Get number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Check if column exists
    pub fn has_column(&self, name: &str) -> bool {
        self.name_to_index.contains_key(name)
    }

    /// The primary key column, if the table declares one.
    pub fn primary_key(&self) -> Option<(usize, &Column)> {
        self.columns
            .iter()
            .enumerate()
            .find(|(_, c)| c.primary_key)
    }

    /// Positions of all indexed (PRIMARY KEY or UNIQUE) columns.
    pub fn indexed_positions(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_indexed())
            .map(|(pos, _)| pos)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users_schema() -> TableSchema {
        TableSchema::from_columns(
            "users",
            vec![
                Column::new("id", DataType::Integer).primary_key(true),
                Column::new("name", DataType::Text).not_null(true),
                Column::new("email", DataType::Text).unique(true),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_schema_lookup() {
        let schema = users_schema();

        assert_eq!(schema.column_count(), 3);
        assert!(schema.has_column("id"));
        assert!(!schema.has_column("unknown"));
        assert_eq!(schema.position("email"), Some(2));

        let id_col = schema.column("id").unwrap();
        assert!(id_col.primary_key);
        assert!(id_col.not_null);
    }

    #[test]
    fn test_primary_key_and_indexed() {
        let schema = users_schema();

        let (pos, pk) = schema.primary_key().unwrap();
        assert_eq!(pos, 0);
        assert_eq!(pk.name, "id");

        assert_eq!(schema.indexed_positions(), vec![0, 2]);
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let result = TableSchema::from_columns(
            "t",
            vec![
                Column::new("a", DataType::Integer),
                Column::new("a", DataType::Text),
            ],
        );
        assert!(matches!(result, Err(Error::DuplicateColumn(_, _))));
    }

    #[test]
    fn test_multiple_primary_keys_rejected() {
        let result = TableSchema::from_columns(
            "t",
            vec![
                Column::new("a", DataType::Integer).primary_key(true),
                Column::new("b", DataType::Integer).primary_key(true),
            ],
        );
        assert!(matches!(result, Err(Error::MultiplePrimaryKeys(_))));
    }
}
