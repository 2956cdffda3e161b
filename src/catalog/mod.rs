//! System catalog: data types, column definitions, and table schemas.

mod schema;
mod types;

pub use schema::{Column, TableSchema};
pub use types::DataType;
