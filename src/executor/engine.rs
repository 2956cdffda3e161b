//! Statement executor for SnapDB
//!
//! The engine owns the database, parses statement text, and applies it:
//! constraint checks before mutation, hash-index lookups for equality
//! predicates, and a single-level equi-join for SELECT.

use crate::catalog::{Column, TableSchema};
use crate::error::{Error, Result};
use crate::snapshot;
use crate::sql::ast::*;
use crate::sql::Parser;
use crate::storage::{Database, RowId, Table, Value};
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::path::Path;
use tracing::debug;

/// Result of one executed statement
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// SELECT result rows
    Rows(ResultSet),
    /// INSERT/UPDATE/DELETE row counts. INSERT carries the assigned row id.
    Affected {
        count: usize,
        last_insert_id: Option<RowId>,
    },
    /// CREATE TABLE / DROP TABLE acknowledgement
    Ack,
}

/// An ordered set of result rows. Values are copies; results never borrow
/// from the row store.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultSet {
    /// Column labels, in projection order
    pub columns: Vec<String>,
    /// Result rows, one value per column label
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    /// Number of result rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when no rows were returned
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value at (row, column label), if both exist
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let pos = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(pos)
    }

    /// One row as an ordered column -> value mapping
    pub fn row_map(&self, row: usize) -> Option<IndexMap<&str, &Value>> {
        let values = self.rows.get(row)?;
        Some(
            self.columns
                .iter()
                .map(|c| c.as_str())
                .zip(values.iter())
                .collect(),
        )
    }
}

/// The statement execution engine.
///
/// Fully synchronous: `execute` runs to completion before the next
/// statement is accepted. Callers needing concurrent access must
/// serialize calls themselves.
#[derive(Debug, Default)]
pub struct Engine {
    db: Database,
}

/// Which side of a join a resolved column lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Driving,
    Joined,
}

/// A WHERE predicate resolved against concrete columns, with the literal
/// coerced to the column's declared type so index lookups and scans agree.
struct CompiledPredicate {
    side: Side,
    pos: usize,
    op: CompareOp,
    target: Value,
}

impl Engine {
    /// Create an engine over an empty database
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine over an existing database
    pub fn with_database(db: Database) -> Self {
        Self { db }
    }

    /// Open an engine from a snapshot file. A missing or unreadable
    /// snapshot yields an empty database; the caller is expected to
    /// bootstrap the schema via ordinary statements.
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self {
            db: snapshot::load_or_default(path),
        }
    }

    /// Write the whole database to a snapshot file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        snapshot::save(&self.db, path)
    }

    /// The underlying database
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Parse and execute a single statement.
    pub fn execute(&mut self, sql: &str) -> Result<Output> {
        debug!(sql, "executing statement");
        let stmt = Parser::new(sql)?.parse()?;

        match stmt {
            Statement::CreateTable(stmt) => self.execute_create_table(stmt),
            Statement::DropTable(stmt) => self.execute_drop_table(stmt),
            Statement::Insert(stmt) => self.execute_insert(stmt),
            Statement::Select(stmt) => self.execute_select(stmt),
            Statement::Update(stmt) => self.execute_update(stmt),
            Statement::Delete(stmt) => self.execute_delete(stmt),
        }
    }

    // ========== CREATE TABLE / DROP TABLE ==========

    fn execute_create_table(&mut self, stmt: CreateTableStatement) -> Result<Output> {
        let columns = stmt
            .columns
            .into_iter()
            .map(|def| {
                Column::new(def.name, def.data_type)
                    .unique(def.unique)
                    .not_null(def.not_null)
                    .primary_key(def.primary_key)
            })
            .collect();

        self.db.create_table(&stmt.table, columns)?;
        debug!(table = %stmt.table, "created table");
        Ok(Output::Ack)
    }

    fn execute_drop_table(&mut self, stmt: DropTableStatement) -> Result<Output> {
        self.db.drop_table(&stmt.table)?;
        debug!(table = %stmt.table, "dropped table");
        Ok(Output::Ack)
    }

    // ========== INSERT ==========

    fn execute_insert(&mut self, stmt: InsertStatement) -> Result<Output> {
        let table = self.db.table(&stmt.table)?;
        let schema = table.schema();

        let positions: Vec<usize> = match &stmt.columns {
            Some(cols) => {
                if cols.len() != stmt.values.len() {
                    return Err(Error::ColumnCountMismatch {
                        expected: cols.len(),
                        found: stmt.values.len(),
                    });
                }
                let mut positions = Vec::with_capacity(cols.len());
                for col in cols {
                    let pos = schema.position(col).ok_or_else(|| {
                        Error::ColumnNotFound(col.clone(), stmt.table.clone())
                    })?;
                    if positions.contains(&pos) {
                        return Err(Error::DuplicateColumn(col.clone(), stmt.table.clone()));
                    }
                    positions.push(pos);
                }
                positions
            }
            None => {
                if schema.column_count() != stmt.values.len() {
                    return Err(Error::ColumnCountMismatch {
                        expected: schema.column_count(),
                        found: stmt.values.len(),
                    });
                }
                (0..schema.column_count()).collect()
            }
        };

        // Columns absent from the list stay NULL; NOT NULL is enforced by
        // the table on insert.
        let mut row = vec![Value::Null; schema.column_count()];
        for (&pos, literal) in positions.iter().zip(&stmt.values) {
            row[pos] = coerce_literal(literal, &schema.columns()[pos])?;
        }

        let row_id = self.db.table_mut(&stmt.table)?.insert(row)?;
        debug!(table = %stmt.table, row_id, "inserted row");
        Ok(Output::Affected {
            count: 1,
            last_insert_id: Some(row_id),
        })
    }

    // ========== SELECT ==========

    fn execute_select(&mut self, stmt: SelectStatement) -> Result<Output> {
        match &stmt.join {
            None => self.select_single(&stmt),
            Some(join) => self.select_join(&stmt, join),
        }
    }

    fn select_single(&self, stmt: &SelectStatement) -> Result<Output> {
        let table = self.db.table(&stmt.table)?;
        let schema = table.schema();

        let predicate = stmt
            .predicate
            .as_ref()
            .map(|p| compile_single_predicate(schema, &stmt.table, p))
            .transpose()?;

        // (label, position) pairs in projection order
        let projection: Vec<(String, usize)> = match &stmt.projection {
            Projection::All => schema
                .columns()
                .iter()
                .enumerate()
                .map(|(pos, col)| (col.name.clone(), pos))
                .collect(),
            Projection::Columns(refs) => {
                let mut cols = Vec::with_capacity(refs.len());
                for r in refs {
                    if let Some(t) = &r.table {
                        if t != &stmt.table {
                            return Err(Error::TableNotFound(t.clone()));
                        }
                    }
                    let pos = schema.position(&r.column).ok_or_else(|| {
                        Error::ColumnNotFound(r.column.clone(), stmt.table.clone())
                    })?;
                    cols.push((r.to_string(), pos));
                }
                cols
            }
        };

        let mut result = ResultSet {
            columns: projection.iter().map(|(label, _)| label.clone()).collect(),
            rows: Vec::new(),
        };

        for row_id in matching_row_ids(table, predicate.as_ref()) {
            if let Some(row) = table.get(row_id) {
                result
                    .rows
                    .push(projection.iter().map(|(_, pos)| row[*pos].clone()).collect());
            }
        }

        Ok(Output::Rows(result))
    }

    fn select_join(&self, stmt: &SelectStatement, join: &JoinClause) -> Result<Output> {
        let driving = self.db.table(&stmt.table)?;
        let joined = self.db.table(&join.table)?;

        let (drive_pos, join_pos) = orient_join(driving, joined, join)?;
        let join_index = joined.index_at(join_pos);

        let predicate = stmt
            .predicate
            .as_ref()
            .map(|p| compile_joined_predicate(driving, joined, p))
            .transpose()?;

        // (label, side, position) triples in projection order. Wildcard
        // projection over a join qualifies every label with its table.
        let projection: Vec<(String, Side, usize)> = match &stmt.projection {
            Projection::All => {
                let mut cols = Vec::new();
                for (pos, col) in driving.schema().columns().iter().enumerate() {
                    cols.push((format!("{}.{}", stmt.table, col.name), Side::Driving, pos));
                }
                for (pos, col) in joined.schema().columns().iter().enumerate() {
                    cols.push((format!("{}.{}", join.table, col.name), Side::Joined, pos));
                }
                cols
            }
            Projection::Columns(refs) => {
                let mut cols = Vec::with_capacity(refs.len());
                for r in refs {
                    let (side, pos) = resolve_joined_column(driving, joined, r)?;
                    cols.push((r.to_string(), side, pos));
                }
                cols
            }
        };

        let mut result = ResultSet {
            columns: projection.iter().map(|(label, _, _)| label.clone()).collect(),
            rows: Vec::new(),
        };

        // Driving side iterates in ascending row-id order; matches on the
        // joined side resolve through its index when the column has one.
        for (_, drive_row) in driving.scan() {
            let key = &drive_row[drive_pos];
            if key.is_null() {
                continue;
            }

            let matches: Vec<&Vec<Value>> = match join_index {
                Some(index) => index
                    .lookup(key)
                    .filter_map(|row_id| joined.get(row_id))
                    .collect(),
                None => joined
                    .scan()
                    .filter(|(_, join_row)| join_row[join_pos] == *key)
                    .map(|(_, join_row)| join_row)
                    .collect(),
            };

            for join_row in matches {
                if let Some(p) = &predicate {
                    let value = match p.side {
                        Side::Driving => &drive_row[p.pos],
                        Side::Joined => &join_row[p.pos],
                    };
                    if !compare_matches(p.op, value, &p.target) {
                        continue;
                    }
                }

                result.rows.push(
                    projection
                        .iter()
                        .map(|(_, side, pos)| match side {
                            Side::Driving => drive_row[*pos].clone(),
                            Side::Joined => join_row[*pos].clone(),
                        })
                        .collect(),
                );
            }
        }

        Ok(Output::Rows(result))
    }

    // ========== UPDATE ==========

    fn execute_update(&mut self, stmt: UpdateStatement) -> Result<Output> {
        let table = self.db.table(&stmt.table)?;
        let schema = table.schema();

        let mut changes = Vec::with_capacity(stmt.assignments.len());
        for assignment in &stmt.assignments {
            let pos = schema.position(&assignment.column).ok_or_else(|| {
                Error::ColumnNotFound(assignment.column.clone(), stmt.table.clone())
            })?;
            changes.push((pos, coerce_literal(&assignment.value, &schema.columns()[pos])?));
        }

        let predicate = stmt
            .predicate
            .as_ref()
            .map(|p| compile_single_predicate(schema, &stmt.table, p))
            .transpose()?;
        let row_ids = matching_row_ids(table, predicate.as_ref());

        let table = self.db.table_mut(&stmt.table)?;
        let mut count = 0;
        for row_id in row_ids {
            if table.update(row_id, &changes)? {
                count += 1;
            }
        }

        debug!(table = %stmt.table, count, "updated rows");
        Ok(Output::Affected {
            count,
            last_insert_id: None,
        })
    }

    // ========== DELETE ==========

    fn execute_delete(&mut self, stmt: DeleteStatement) -> Result<Output> {
        let table = self.db.table(&stmt.table)?;
        let predicate = stmt
            .predicate
            .as_ref()
            .map(|p| compile_single_predicate(table.schema(), &stmt.table, p))
            .transpose()?;
        let row_ids = matching_row_ids(table, predicate.as_ref());

        let table = self.db.table_mut(&stmt.table)?;
        let mut count = 0;
        for row_id in row_ids {
            if table.delete(row_id) {
                count += 1;
            }
        }

        debug!(table = %stmt.table, count, "deleted rows");
        Ok(Output::Affected {
            count,
            last_insert_id: None,
        })
    }
}

/// Convert a literal into a stored value of the column's declared type.
/// Integer literals widen to REAL columns; everything else must match.
fn coerce_literal(literal: &Literal, column: &Column) -> Result<Value> {
    use crate::catalog::DataType;

    match (literal, column.data_type) {
        (Literal::Null, _) => Ok(Value::Null),
        (Literal::Integer(n), DataType::Integer) => Ok(Value::Integer(*n)),
        (Literal::Integer(n), DataType::Real) => Ok(Value::Real(*n as f64)),
        (Literal::Float(n), DataType::Real) => Ok(Value::Real(*n)),
        (Literal::String(s), DataType::Text) => Ok(Value::Text(s.clone())),
        _ => Err(Error::TypeMismatch {
            column: column.name.clone(),
            expected: column.data_type,
            found: literal.to_string(),
        }),
    }
}

/// Resolve a WHERE predicate against a single table.
fn compile_single_predicate(
    schema: &TableSchema,
    table_name: &str,
    predicate: &Predicate,
) -> Result<CompiledPredicate> {
    if let Some(t) = &predicate.column.table {
        if t != table_name {
            return Err(Error::TableNotFound(t.clone()));
        }
    }
    let pos = schema.position(&predicate.column.column).ok_or_else(|| {
        Error::ColumnNotFound(predicate.column.column.clone(), table_name.to_string())
    })?;
    let target = coerce_literal(&predicate.value, &schema.columns()[pos])?;

    Ok(CompiledPredicate {
        side: Side::Driving,
        pos,
        op: predicate.op,
        target,
    })
}

/// Resolve a WHERE predicate against a joined row: a qualified column
/// names its table, an unqualified one resolves driving-side first.
fn compile_joined_predicate(
    driving: &Table,
    joined: &Table,
    predicate: &Predicate,
) -> Result<CompiledPredicate> {
    let (side, pos) = resolve_joined_column(driving, joined, &predicate.column)?;
    let schema = match side {
        Side::Driving => driving.schema(),
        Side::Joined => joined.schema(),
    };
    let target = coerce_literal(&predicate.value, &schema.columns()[pos])?;

    Ok(CompiledPredicate {
        side,
        pos,
        op: predicate.op,
        target,
    })
}

/// Resolve a column reference to one side of a join.
fn resolve_joined_column(
    driving: &Table,
    joined: &Table,
    column: &ColumnRef,
) -> Result<(Side, usize)> {
    match &column.table {
        Some(t) if t == driving.name() => {
            let pos = driving
                .schema()
                .position(&column.column)
                .ok_or_else(|| Error::ColumnNotFound(column.column.clone(), t.clone()))?;
            Ok((Side::Driving, pos))
        }
        Some(t) if t == joined.name() => {
            let pos = joined
                .schema()
                .position(&column.column)
                .ok_or_else(|| Error::ColumnNotFound(column.column.clone(), t.clone()))?;
            Ok((Side::Joined, pos))
        }
        Some(t) => Err(Error::TableNotFound(t.clone())),
        None => {
            if let Some(pos) = driving.schema().position(&column.column) {
                Ok((Side::Driving, pos))
            } else if let Some(pos) = joined.schema().position(&column.column) {
                Ok((Side::Joined, pos))
            } else {
                Err(Error::ColumnNotFound(
                    column.column.clone(),
                    driving.name().to_string(),
                ))
            }
        }
    }
}

/// Map the ON predicate's two sides onto (driving position, joined
/// position), whichever order they were written in.
fn orient_join(driving: &Table, joined: &Table, join: &JoinClause) -> Result<(usize, usize)> {
    let left = resolve_joined_column(driving, joined, &join.left)?;
    let right = resolve_joined_column(driving, joined, &join.right)?;

    match (left, right) {
        ((Side::Driving, d), (Side::Joined, j)) => Ok((d, j)),
        ((Side::Joined, j), (Side::Driving, d)) => Ok((d, j)),
        _ => Err(Error::InvalidJoin(format!(
            "{} = {}",
            join.left, join.right
        ))),
    }
}

/// Row ids matching a predicate, in ascending order.
///
/// An equality predicate on an indexed column resolves through the hash
/// index; everything else scans. The access path never changes which rows
/// match.
fn matching_row_ids(table: &Table, predicate: Option<&CompiledPredicate>) -> Vec<RowId> {
    let Some(p) = predicate else {
        return table.scan().map(|(row_id, _)| row_id).collect();
    };

    if p.op == CompareOp::Eq && !p.target.is_null() {
        if let Some(index) = table.index_at(p.pos) {
            return index.lookup(&p.target).collect();
        }
    }

    table
        .scan()
        .filter(|(_, row)| compare_matches(p.op, &row[p.pos], &p.target))
        .map(|(row_id, _)| row_id)
        .collect()
}

/// Evaluate `value op target`. Incomparable pairs (including anything
/// involving NULL) never match.
fn compare_matches(op: CompareOp, value: &Value, target: &Value) -> bool {
    match value.compare(target) {
        None => false,
        Some(ordering) => match op {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Neq => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Lte => ordering != Ordering::Greater,
            CompareOp::Gte => ordering != Ordering::Less,
        },
    }
}
