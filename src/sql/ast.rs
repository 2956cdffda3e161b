//! SQL Abstract Syntax Tree (AST)
//!
//! This module defines the AST nodes for SQL statements.

use crate::catalog::DataType;
use std::fmt;

/// A SQL statement
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// CREATE TABLE statement
    CreateTable(CreateTableStatement),
    /// DROP TABLE statement
    DropTable(DropTableStatement),
    /// INSERT statement
    Insert(InsertStatement),
    /// SELECT statement
    Select(SelectStatement),
    /// UPDATE statement
    Update(UpdateStatement),
    /// DELETE statement
    Delete(DeleteStatement),
}

/// CREATE TABLE statement
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStatement {
    /// Table name
    pub table: String,
    /// Column definitions, in declared order
    pub columns: Vec<ColumnDef>,
}

/// Column definition
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    /// Column name
    pub name: String,
    /// Data type
    pub data_type: DataType,
    /// PRIMARY KEY constraint
    pub primary_key: bool,
    /// UNIQUE constraint
    pub unique: bool,
    /// NOT NULL constraint
    pub not_null: bool,
}

/// DROP TABLE statement
#[derive(Debug, Clone, PartialEq)]
pub struct DropTableStatement {
    /// Table name
    pub table: String,
}

/// INSERT statement
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    /// Target table name
    pub table: String,
    /// Column names; None means full declared column order
    pub columns: Option<Vec<String>>,
    /// Literal values, positionally matched to the column list
    pub values: Vec<Literal>,
}

/// SELECT statement
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    /// Projection: `*` or an explicit column list
    pub projection: Projection,
    /// Driving table
    pub table: String,
    /// Optional single equi-join
    pub join: Option<JoinClause>,
    /// Optional WHERE predicate
    pub predicate: Option<Predicate>,
}

/// Projection list
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// All columns (*)
    All,
    /// Explicit column list, in requested order
    Columns(Vec<ColumnRef>),
}

/// JOIN clause: `JOIN table ON left = right`
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    /// Joined table name
    pub table: String,
    /// Left side of the equality predicate, as written
    pub left: ColumnRef,
    /// Right side of the equality predicate, as written
    pub right: ColumnRef,
}

/// UPDATE statement
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    /// Target table name
    pub table: String,
    /// SET assignments
    pub assignments: Vec<Assignment>,
    /// Optional WHERE predicate
    pub predicate: Option<Predicate>,
}

/// Column assignment (for UPDATE)
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// Column name
    pub column: String,
    /// New value
    pub value: Literal,
}

/// DELETE statement
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    /// Target table name
    pub table: String,
    /// Optional WHERE predicate
    pub predicate: Option<Predicate>,
}

/// WHERE predicate: `column op literal`. Absence of a predicate in a
/// statement means "match all rows".
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    /// Column being tested
    pub column: ColumnRef,
    /// Comparison operator
    pub op: CompareOp,
    /// Literal to compare against
    pub value: Literal,
}

/// Column reference, optionally table-qualified
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    /// Table name (optional)
    pub table: Option<String>,
    /// Column name
    pub column: String,
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(t) => write!(f, "{}.{}", t, self.column),
            None => write!(f, "{}", self.column),
        }
    }
}

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Neq,
    Lt,
    Gt,
    Lte,
    Gte,
}

/// Literal value
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// NULL
    Null,
    /// Integer
    Integer(i64),
    /// Float
    Float(f64),
    /// String
    String(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => write!(f, "NULL"),
            Literal::Integer(n) => write!(f, "{}", n),
            Literal::Float(n) => write!(f, "{}", n),
            Literal::String(s) => write!(f, "'{}'", s),
        }
    }
}
