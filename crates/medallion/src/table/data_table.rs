//! Typed in-memory tables.

use serde::{Deserialize, Serialize};

use crate::error::{MedallionError, Result};

use super::value::{ColumnType, Value};

/// A named, typed column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column header.
    pub name: String,
    /// Declared type.
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

impl Column {
    /// Create a new column.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Represents a tabular dataset snapshot.
///
/// Constructors and deserialization pad every row to one cell per column.
/// Code that pushes into `rows` directly can break that, so readers go
/// through [`cell`] rather than indexing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredTable")]
pub struct DataTable {
    /// Column definitions, in order.
    pub columns: Vec<Column>,
    /// Row data (row-major order).
    pub rows: Vec<Vec<Value>>,
}

/// Serialized shape of a table; rows are re-padded on load.
#[derive(Deserialize)]
struct StoredTable {
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
}

impl From<StoredTable> for DataTable {
    fn from(stored: StoredTable) -> Self {
        DataTable::new(stored.columns, stored.rows)
    }
}

/// Cell `index` of a row; null when the row is too short.
pub fn cell(row: &[Value], index: usize) -> &Value {
    row.get(index).unwrap_or(&Value::Null)
}

impl DataTable {
    /// Create a table from explicit columns and rows.
    ///
    /// Rows are padded with nulls or truncated to the column count.
    pub fn new(columns: Vec<Column>, rows: Vec<Vec<Value>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Value::Null);
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Create a table from headers and rows, inferring each column's type
    /// from its non-null values.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let mut table = Self::new(
            headers
                .into_iter()
                .map(|h| Column::new(h, ColumnType::String))
                .collect(),
            rows,
        );
        for idx in 0..table.column_count() {
            let inferred = infer_type(table.column_values(idx));
            table.columns[idx].column_type = inferred;
        }
        table
    }

    /// Create a table with no rows.
    pub fn empty(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get all column names.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Find the index of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Get a column definition by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get all values for a column by index.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Value> {
        self.rows.iter().map(move |row| cell(row, index))
    }

    /// Get a specific cell value.
    pub fn get(&self, row: usize, col: usize) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Set a specific cell value.
    pub fn set(&mut self, row: usize, col: usize, value: Value) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            *cell = value;
        }
    }

    /// Append a column, filling every row with `fill`.
    pub fn add_column(&mut self, column: Column, fill: Value) {
        self.pad_rows();
        self.columns.push(column);
        for row in &mut self.rows {
            row.push(fill.clone());
        }
    }

    /// Pad or truncate every row to the column count.
    pub fn pad_rows(&mut self) {
        let width = self.column_count();
        for row in &mut self.rows {
            row.resize(width, Value::Null);
        }
    }

    /// Append a row, padding or truncating it to the column count.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.column_count(), Value::Null);
        self.rows.push(row);
    }

    /// Look up a column index, failing with a descriptive message.
    ///
    /// Business rules use this to report which column they needed.
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name).ok_or_else(|| {
            MedallionError::MalformedInput(format!("column '{}' not found", name))
        })
    }

    /// Count non-null cells in a column.
    pub fn non_null_count(&self, index: usize) -> usize {
        self.column_values(index).filter(|v| !v.is_null()).count()
    }
}

/// Pick a column type from its values: numeric or date when every non-null
/// value is one, otherwise string.
fn infer_type<'a>(values: impl Iterator<Item = &'a Value>) -> ColumnType {
    let mut numeric = true;
    let mut date = true;
    let mut seen = false;

    for value in values.filter(|v| !v.is_null()) {
        seen = true;
        numeric &= matches!(value, Value::Number(_));
        date &= matches!(value, Value::Date(_));
    }

    match (seen, numeric, date) {
        (true, true, _) => ColumnType::Numeric,
        (true, _, true) => ColumnType::Date,
        _ => ColumnType::String,
    }
}
