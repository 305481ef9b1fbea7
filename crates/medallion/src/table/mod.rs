//! Tabular data model shared by every layer.

mod data_table;
mod value;

pub use data_table::{Column, DataTable, cell};
pub use value::{ColumnType, Value, is_null_text};
