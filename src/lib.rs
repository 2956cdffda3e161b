//! SnapDB - A minimal relational database engine with snapshot persistence
//!
//! This library provides the core components for a small SQL database:
//! - SQL parsing (lexer, parser, AST)
//! - Typed in-memory storage with hash indexes
//! - Statement execution with constraint enforcement
//! - Whole-database snapshot persistence

pub mod catalog;
pub mod error;
pub mod executor;
pub mod snapshot;
pub mod sql;
pub mod storage;

pub use error::{Error, ErrorKind, Result};
pub use executor::{Engine, Output, ResultSet};
pub use storage::{Database, Value};
