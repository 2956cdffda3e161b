//! Statement execution against a [`Database`](crate::storage::Database).

mod engine;

pub use engine::{Engine, Output, ResultSet};
