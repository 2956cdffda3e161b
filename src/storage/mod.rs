//! Storage engine: typed values, hash indexes, row stores, and the
//! database that owns them.

pub mod database;
pub mod index;
pub mod table;
pub mod value;

pub use database::Database;
pub use index::HashIndex;
pub use table::{Row, RowId, Table};
pub use value::Value;
