//! Per-table row store with index maintenance.
//!
//! All write paths validate constraints before mutating anything: a
//! failing insert or per-row update leaves the row store and every index
//! exactly as they were.

use super::index::HashIndex;
use super::value::Value;
use crate::catalog::{DataType, TableSchema};
use crate::error::{Error, Result};
use std::collections::{BTreeMap, HashMap};

/// Internal, table-scoped row identifier. Strictly increasing, never
/// reused after a delete, distinct from any user-declared key.
pub type RowId = u64;

/// A stored row: one value per declared column, in schema order.
pub type Row = Vec<Value>;

/// A table: schema, row store, and one hash index per constrained column.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    schema: TableSchema,
    /// Row store, ordered by row id so scans iterate in insertion order
    rows: BTreeMap<RowId, Row>,
    /// Next row id to assign; monotone, survives deletes and reloads
    next_row_id: RowId,
    /// Hash indexes keyed by column position
    indexes: HashMap<usize, HashIndex>,
}

impl Table {
    /// Create an empty table. Every PRIMARY KEY or UNIQUE column gets an
    /// index immediately.
    pub fn new(name: impl Into<String>, schema: TableSchema) -> Self {
        let indexes = schema
            .indexed_positions()
            .into_iter()
            .map(|pos| (pos, HashIndex::new()))
            .collect();

        Self {
            name: name.into(),
            schema,
            rows: BTreeMap::new(),
            next_row_id: 1,
            indexes,
        }
    }

    /// Rebuild a table from persisted parts, reconstructing indexes from
    /// row data.
    pub(crate) fn from_parts(
        name: String,
        schema: TableSchema,
        next_row_id: RowId,
        rows: BTreeMap<RowId, Row>,
    ) -> Self {
        let mut table = Self::new(name, schema);
        for (row_id, row) in &rows {
            for (&pos, index) in table.indexes.iter_mut() {
                index.add(&row[pos], *row_id);
            }
        }
        table.rows = rows;
        table.next_row_id = next_row_id;
        table
    }

    /// Table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Table schema
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Number of stored rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Next row id the table would assign
    pub fn next_row_id(&self) -> RowId {
        self.next_row_id
    }

    /// Get a row by id
    pub fn get(&self, row_id: RowId) -> Option<&Row> {
        self.rows.get(&row_id)
    }

    /// Iterate all rows in ascending row-id order
    pub fn scan(&self) -> impl Iterator<Item = (RowId, &Row)> {
        self.rows.iter().map(|(id, row)| (*id, row))
    }

    /// The hash index on the column at `pos`, if that column is indexed
    pub fn index_at(&self, pos: usize) -> Option<&HashIndex> {
        self.indexes.get(&pos)
    }

    /// Insert a fully materialized row (one value per declared column).
    ///
    /// The row id comes from an INTEGER PRIMARY KEY value when the schema
    /// declares one and the row supplies it; a NULL primary key is filled
    /// in from the auto-increment counter. Tables without an integer
    /// primary key always use the counter.
    ///
    /// Every constraint is checked before anything is mutated.
    pub fn insert(&mut self, mut row: Row) -> Result<RowId> {
        if row.len() != self.schema.column_count() {
            return Err(Error::ColumnCountMismatch {
                expected: self.schema.column_count(),
                found: row.len(),
            });
        }

        let row_id = match self.schema.primary_key() {
            Some((pos, col)) if col.data_type == DataType::Integer => match row[pos] {
                Value::Integer(v) if v >= 0 => v as RowId,
                Value::Integer(v) => return Err(Error::PrimaryKeyOutOfRange(v)),
                Value::Null => {
                    row[pos] = Value::Integer(self.next_row_id as i64);
                    self.next_row_id
                }
                ref other => {
                    return Err(Error::TypeMismatch {
                        column: col.name.clone(),
                        expected: DataType::Integer,
                        found: other.type_name().to_string(),
                    })
                }
            },
            _ => self.next_row_id,
        };

        // Validation pass: nothing below may mutate.
        if self.rows.contains_key(&row_id) {
            let column = self
                .schema
                .primary_key()
                .map(|(_, c)| c.name.clone())
                .unwrap_or_else(|| "rowid".to_string());
            return Err(Error::UniqueViolation {
                column,
                value: row_id.to_string(),
            });
        }
        for (pos, col) in self.schema.columns().iter().enumerate() {
            if col.not_null && row[pos].is_null() {
                return Err(Error::NullNotAllowed(col.name.clone()));
            }
        }
        for (&pos, index) in &self.indexes {
            let value = &row[pos];
            if !value.is_null() && index.is_held_by_other(value, None) {
                return Err(Error::UniqueViolation {
                    column: self.schema.columns()[pos].name.clone(),
                    value: value.to_string(),
                });
            }
        }

        // Commit: row store and indexes change in the same step.
        for (&pos, index) in self.indexes.iter_mut() {
            index.add(&row[pos], row_id);
        }
        self.rows.insert(row_id, row);
        self.next_row_id = self.next_row_id.max(row_id + 1);

        Ok(row_id)
    }

    /// Apply column changes to one row. Returns false when the row id no
    /// longer exists.
    ///
    /// Validation happens before this row is touched; a uniqueness check
    /// lets the row keep its own prior value. The row id never changes,
    /// even when the change rewrites a primary key column value.
    pub fn update(&mut self, row_id: RowId, changes: &[(usize, Value)]) -> Result<bool> {
        if !self.rows.contains_key(&row_id) {
            return Ok(false);
        }

        for (pos, new_value) in changes {
            let col = &self.schema.columns()[*pos];
            if col.not_null && new_value.is_null() {
                return Err(Error::NullNotAllowed(col.name.clone()));
            }
            if let Some(index) = self.indexes.get(pos) {
                if !new_value.is_null() && index.is_held_by_other(new_value, Some(row_id)) {
                    return Err(Error::UniqueViolation {
                        column: col.name.clone(),
                        value: new_value.to_string(),
                    });
                }
            }
        }

        let row = self
            .rows
            .get_mut(&row_id)
            .expect("row existence checked above");
        let mut touched = Vec::with_capacity(changes.len());
        for (pos, new_value) in changes {
            let old_value = std::mem::replace(&mut row[*pos], new_value.clone());
            touched.push((*pos, old_value, new_value.clone()));
        }
        for (pos, old_value, new_value) in touched {
            if let Some(index) = self.indexes.get_mut(&pos) {
                index.remove(&old_value, row_id);
                index.add(&new_value, row_id);
            }
        }

        Ok(true)
    }

    /// Remove one row and its entries from every index. Returns false
    /// when the row id does not exist.
    pub fn delete(&mut self, row_id: RowId) -> bool {
        let Some(row) = self.rows.remove(&row_id) else {
            return false;
        };
        for (&pos, index) in self.indexes.iter_mut() {
            index.remove(&row[pos], row_id);
        }
        true
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Column;

    fn users_table() -> Table {
        let schema = TableSchema::from_columns(
            "users",
            vec![
                Column::new("id", DataType::Integer).primary_key(true),
                Column::new("name", DataType::Text).not_null(true),
                Column::new("email", DataType::Text).unique(true),
            ],
        )
        .unwrap();
        Table::new("users", schema)
    }

    fn row(id: Option<i64>, name: &str, email: &str) -> Row {
        vec![
            id.map(Value::Integer).unwrap_or(Value::Null),
            Value::Text(name.to_string()),
            Value::Text(email.to_string()),
        ]
    }

    #[test]
    fn test_insert_auto_assigns_increasing_ids() {
        let mut table = users_table();

        let a = table.insert(row(None, "Alice", "alice@x.com")).unwrap();
        let b = table.insert(row(None, "Bob", "bob@x.com")).unwrap();
        assert!(b > a);

        // The auto id is written into the integer primary key column.
        assert_eq!(table.get(a).unwrap()[0], Value::Integer(a as i64));
    }

    #[test]
    fn test_ids_never_reused_after_delete() {
        let mut table = users_table();

        let a = table.insert(row(None, "Alice", "alice@x.com")).unwrap();
        assert!(table.delete(a));

        let b = table.insert(row(None, "Bob", "bob@x.com")).unwrap();
        assert!(b > a);
    }

    #[test]
    fn test_explicit_primary_key_becomes_row_id() {
        let mut table = users_table();

        let id = table.insert(row(Some(42), "Alice", "alice@x.com")).unwrap();
        assert_eq!(id, 42);

        // Counter advances past explicit ids.
        let next = table.insert(row(None, "Bob", "bob@x.com")).unwrap();
        assert_eq!(next, 43);
    }

    #[test]
    fn test_duplicate_primary_key_rejected() {
        let mut table = users_table();

        table.insert(row(Some(1), "Alice", "alice@x.com")).unwrap();
        let err = table.insert(row(Some(1), "Bob", "bob@x.com")).unwrap_err();
        assert!(matches!(err, Error::UniqueViolation { .. }));
    }

    #[test]
    fn test_failed_insert_leaves_table_untouched() {
        let mut table = users_table();
        table.insert(row(None, "Alice", "alice@x.com")).unwrap();

        // Duplicate email: unique index catches it before mutation.
        let err = table.insert(row(None, "Eve", "alice@x.com")).unwrap_err();
        assert!(matches!(err, Error::UniqueViolation { .. }));
        assert_eq!(table.row_count(), 1);

        // NOT NULL on name.
        let err = table
            .insert(vec![Value::Null, Value::Null, Value::Text("x@y".into())])
            .unwrap_err();
        assert!(matches!(err, Error::NullNotAllowed(_)));
        assert_eq!(table.row_count(), 1);

        // Email index holds exactly the surviving row.
        let email_pos = table.schema().position("email").unwrap();
        assert_eq!(table.index_at(email_pos).unwrap().len(), 1);
    }

    #[test]
    fn test_negative_primary_key_rejected() {
        let mut table = users_table();
        let err = table.insert(row(Some(-1), "Alice", "a@x.com")).unwrap_err();
        assert!(matches!(err, Error::PrimaryKeyOutOfRange(-1)));
    }

    #[test]
    fn test_update_unique_to_own_value_succeeds() {
        let mut table = users_table();
        let id = table.insert(row(None, "Alice", "alice@x.com")).unwrap();

        let email_pos = table.schema().position("email").unwrap();
        let changed = table
            .update(id, &[(email_pos, Value::Text("alice@x.com".into()))])
            .unwrap();
        assert!(changed);
    }

    #[test]
    fn test_update_unique_to_other_rows_value_fails() {
        let mut table = users_table();
        table.insert(row(None, "Alice", "alice@x.com")).unwrap();
        let bob = table.insert(row(None, "Bob", "bob@x.com")).unwrap();

        let email_pos = table.schema().position("email").unwrap();
        let err = table
            .update(bob, &[(email_pos, Value::Text("alice@x.com".into()))])
            .unwrap_err();
        assert!(matches!(err, Error::UniqueViolation { .. }));

        // Bob's row is untouched.
        assert_eq!(
            table.get(bob).unwrap()[email_pos],
            Value::Text("bob@x.com".into())
        );
    }

    #[test]
    fn test_update_keeps_index_in_step() {
        let mut table = users_table();
        let id = table.insert(row(None, "Alice", "old@x.com")).unwrap();

        let email_pos = table.schema().position("email").unwrap();
        table
            .update(id, &[(email_pos, Value::Text("new@x.com".into()))])
            .unwrap();

        let index = table.index_at(email_pos).unwrap();
        assert_eq!(index.lookup(&Value::Text("old@x.com".into())).count(), 0);
        assert_eq!(
            index.lookup(&Value::Text("new@x.com".into())).collect::<Vec<_>>(),
            vec![id]
        );
    }

    #[test]
    fn test_update_missing_row_is_not_an_error() {
        let mut table = users_table();
        let changed = table.update(99, &[(1, Value::Text("x".into()))]).unwrap();
        assert!(!changed);
    }

    #[test]
    fn test_delete_removes_index_entries() {
        let mut table = users_table();
        let id = table.insert(row(None, "Alice", "alice@x.com")).unwrap();

        assert!(table.delete(id));
        assert!(!table.delete(id));

        let email_pos = table.schema().position("email").unwrap();
        assert!(table.index_at(email_pos).unwrap().is_empty());
        let id_pos = table.schema().position("id").unwrap();
        assert!(table.index_at(id_pos).unwrap().is_empty());
    }

    #[test]
    fn test_from_parts_rebuilds_indexes() {
        let mut original = users_table();
        original.insert(row(None, "Alice", "alice@x.com")).unwrap();
        original.insert(row(None, "Bob", "bob@x.com")).unwrap();

        let rows: BTreeMap<RowId, Row> = original.scan().map(|(id, r)| (id, r.clone())).collect();
        let rebuilt = Table::from_parts(
            original.name().to_string(),
            original.schema().clone(),
            original.next_row_id(),
            rows,
        );

        let email_pos = rebuilt.schema().position("email").unwrap();
        assert_eq!(
            rebuilt
                .index_at(email_pos)
                .unwrap()
                .lookup(&Value::Text("bob@x.com".into()))
                .count(),
            1
        );
        assert_eq!(rebuilt.next_row_id(), original.next_row_id());
    }
}
