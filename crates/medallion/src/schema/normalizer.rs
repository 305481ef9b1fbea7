//! Mapping raw tables onto the canonical schema.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{MedallionError, Result};
use crate::table::{Column, ColumnType, DataTable, Value};

use super::canonical::{AliasTable, CanonicalField, normalize_header};
use super::coerce::coerce;

/// A source column that was renamed to a canonical field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    /// Header as it appeared in the raw table.
    pub source: String,
    /// Canonical field it now represents.
    pub field: CanonicalField,
}

/// A passed-through column given a new name because its header was
/// already taken in the normalized table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRename {
    /// Header as it appeared in the raw table.
    pub source: String,
    /// Name in the normalized table.
    pub name: String,
}

/// A cell that could not be coerced to its canonical type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoercionFailure {
    /// Row index in the raw table (0-based).
    pub row: usize,
    /// Canonical field of the column.
    pub field: CanonicalField,
    /// Original cell text.
    pub value: String,
    /// Type the cell should have had.
    pub expected: ColumnType,
}

/// Output of [`SchemaNormalizer::normalize`].
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTable {
    /// Table with canonical headers and coerced cells.
    pub table: DataTable,
    /// Columns renamed to canonical fields.
    pub mappings: Vec<ColumnMapping>,
    /// Headers that matched no alias and passed through.
    pub unmapped_columns: Vec<String>,
    /// Passed-through columns renamed to keep column names unique.
    pub renamed_columns: Vec<ColumnRename>,
    /// Cells that failed coercion; each became null.
    pub coercion_failures: Vec<CoercionFailure>,
    /// Rows dropped because every cell was null.
    pub dropped_rows: usize,
    /// Unmapped columns dropped because every cell was null.
    pub dropped_columns: Vec<String>,
}

impl NormalizedTable {
    /// Canonical fields present in the normalized table.
    pub fn fields(&self) -> Vec<CanonicalField> {
        self.mappings.iter().map(|m| m.field).collect()
    }

    /// Coercion failures for one field.
    pub fn failures_for(&self, field: CanonicalField) -> impl Iterator<Item = &CoercionFailure> {
        self.coercion_failures.iter().filter(move |f| f.field == field)
    }
}

/// Maps source headers to canonical fields and coerces canonical columns.
///
/// Pure: the output depends only on the input table and the alias table.
#[derive(Debug, Clone)]
pub struct SchemaNormalizer {
    lookup: HashMap<String, CanonicalField>,
}

impl SchemaNormalizer {
    /// Create a normalizer from an alias table.
    ///
    /// Fails if the alias table is ambiguous.
    pub fn new(aliases: &AliasTable) -> Result<Self> {
        Ok(Self {
            lookup: aliases.lookup()?,
        })
    }

    /// Resolve a single header to a canonical field.
    pub fn resolve(&self, header: &str) -> Option<CanonicalField> {
        self.lookup.get(&normalize_header(header)).copied()
    }

    /// Normalize a raw table.
    ///
    /// Unmapped columns never cause an error. Fails only when the table has
    /// no rows or no columns.
    pub fn normalize(&self, raw: &DataTable) -> Result<NormalizedTable> {
        if raw.column_count() == 0 {
            return Err(MedallionError::MalformedInput(
                "table has no columns".to_string(),
            ));
        }
        if raw.row_count() == 0 {
            return Err(MedallionError::MalformedInput(
                "table has no rows".to_string(),
            ));
        }

        let mut mappings = Vec::new();
        let mut unmapped_columns = Vec::new();
        let mut claimed: HashSet<CanonicalField> = HashSet::new();
        // Target field for each raw column, None when passed through.
        let mut targets: Vec<Option<CanonicalField>> = Vec::with_capacity(raw.column_count());
        let mut columns = Vec::with_capacity(raw.column_count());

        for column in &raw.columns {
            match self.resolve(&column.name) {
                Some(field) if claimed.insert(field) => {
                    mappings.push(ColumnMapping {
                        source: column.name.clone(),
                        field,
                    });
                    targets.push(Some(field));
                    columns.push(Column::new(field.name(), field.column_type()));
                }
                // Second column for an already-claimed field, or no match.
                _ => {
                    unmapped_columns.push(column.name.clone());
                    targets.push(None);
                    columns.push(column.clone());
                }
            }
        }
        let renamed_columns = dedupe_names(&mut columns, &targets);

        let mut coercion_failures = Vec::new();
        let mut rows = Vec::with_capacity(raw.row_count());

        for (row_idx, raw_row) in raw.rows.iter().enumerate() {
            let row: Vec<Value> = raw_row
                .iter()
                .zip(&targets)
                .map(|(cell, target)| match target {
                    Some(field) => coerce(cell, field.column_type()).unwrap_or_else(|| {
                        coercion_failures.push(CoercionFailure {
                            row: row_idx,
                            field: *field,
                            value: cell.to_string(),
                            expected: field.column_type(),
                        });
                        Value::Null
                    }),
                    None => cell.clone(),
                })
                .collect();
            rows.push(row);
        }

        let table = DataTable::new(columns, rows);
        let (table, dropped_rows, dropped_columns) = drop_empty(table, &targets);

        Ok(NormalizedTable {
            table,
            mappings,
            unmapped_columns,
            renamed_columns,
            coercion_failures,
            dropped_rows,
            dropped_columns,
        })
    }
}

/// Give passed-through columns whose name is already in use a `_N` suffix.
///
/// Canonical columns keep their names; an unmapped column can never carry a
/// canonical name unless that field was claimed by an earlier column.
fn dedupe_names(columns: &mut [Column], targets: &[Option<CanonicalField>]) -> Vec<ColumnRename> {
    // New names avoid every header in the table, not just earlier ones.
    let reserved: HashSet<String> = columns.iter().map(|c| c.name.clone()).collect();
    let mut taken: HashSet<String> = columns
        .iter()
        .zip(targets)
        .filter(|(_, target)| target.is_some())
        .map(|(c, _)| c.name.clone())
        .collect();
    let mut renamed = Vec::new();

    for (column, target) in columns.iter_mut().zip(targets) {
        if target.is_some() || taken.insert(column.name.clone()) {
            continue;
        }
        let name = (2..)
            .map(|n| format!("{}_{}", column.name, n))
            .find(|candidate| !reserved.contains(candidate) && !taken.contains(candidate))
            .unwrap_or_default();
        taken.insert(name.clone());
        renamed.push(ColumnRename {
            source: std::mem::replace(&mut column.name, name.clone()),
            name,
        });
    }

    renamed
}

/// Remove rows where every cell is null, then unmapped columns where every
/// remaining cell is null. Canonical columns are always kept.
fn drop_empty(
    mut table: DataTable,
    targets: &[Option<CanonicalField>],
) -> (DataTable, usize, Vec<String>) {
    let before = table.row_count();
    table.rows.retain(|row| row.iter().any(|v| !v.is_null()));
    let dropped_rows = before - table.row_count();

    let keep: Vec<bool> = (0..table.column_count())
        .map(|idx| targets[idx].is_some() || table.non_null_count(idx) > 0)
        .collect();

    if keep.iter().all(|&k| k) {
        return (table, dropped_rows, Vec::new());
    }

    let dropped_columns = table
        .columns
        .iter()
        .zip(&keep)
        .filter(|(_, k)| !**k)
        .map(|(c, _)| c.name.clone())
        .collect();

    let columns = table
        .columns
        .into_iter()
        .zip(&keep)
        .filter_map(|(c, &k)| k.then_some(c))
        .collect();
    let rows = table
        .rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&keep)
                .filter_map(|(v, &k)| k.then_some(v))
                .collect()
        })
        .collect();

    (DataTable::new(columns, rows), dropped_rows, dropped_columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn raw(headers: &[&str], rows: &[&[&str]]) -> DataTable {
        DataTable::from_rows(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| Value::text(*c)).collect())
                .collect(),
        )
    }

    fn normalizer() -> SchemaNormalizer {
        SchemaNormalizer::new(&AliasTable::default()).unwrap()
    }

    #[test]
    fn test_maps_chinese_headers() {
        let table = raw(&["市场", "产品", "销售额"], &[&["RX", "A", "100"]]);
        let result = normalizer().normalize(&table).unwrap();

        assert_eq!(result.table.column_names(), vec!["market", "product", "sales"]);
        assert!(result.unmapped_columns.is_empty());
        assert_eq!(result.table.get(0, 2), Some(&Value::Number(100.0)));
        assert_eq!(
            result.table.column("market").unwrap().column_type,
            ColumnType::Categorical
        );
    }

    #[test]
    fn test_header_matching_ignores_case_and_whitespace() {
        let table = raw(&[" Order\nDate ", "QTY 数量"], &[&["2024-01-05", "3"]]);
        let result = normalizer().normalize(&table).unwrap();

        assert_eq!(result.table.column_names(), vec!["period", "sales"]);
        assert_eq!(
            result.table.get(0, 0),
            Some(&Value::Date(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()))
        );
    }

    #[test]
    fn test_unmapped_columns_pass_through() {
        let table = raw(&["market", "备注"], &[&["RX", "first order"]]);
        let result = normalizer().normalize(&table).unwrap();

        assert_eq!(result.unmapped_columns, vec!["备注".to_string()]);
        assert_eq!(result.table.column_names(), vec!["market", "备注"]);
        assert_eq!(result.table.get(0, 1), Some(&Value::text("first order")));
    }

    #[test]
    fn test_duplicate_field_keeps_first() {
        let table = raw(&["销售额", "sales", "market"], &[&["1", "2", "RX"]]);
        let result = normalizer().normalize(&table).unwrap();

        assert_eq!(result.fields(), vec![CanonicalField::Sales, CanonicalField::Market]);
        assert_eq!(result.unmapped_columns, vec!["sales".to_string()]);
        assert_eq!(result.table.column_names(), vec!["sales", "sales_2", "market"]);
        assert_eq!(
            result.renamed_columns,
            vec![ColumnRename {
                source: "sales".to_string(),
                name: "sales_2".to_string(),
            }]
        );
        assert_eq!(result.table.get(0, 0), Some(&Value::Number(1.0)));
        assert_eq!(result.table.get(0, 1), Some(&Value::text("2")));
    }

    #[test]
    fn test_repeated_unmapped_headers_get_unique_names() {
        let table = raw(
            &["备注", "备注", "备注_2", "market"],
            &[&["a", "b", "c", "RX"]],
        );
        let result = normalizer().normalize(&table).unwrap();

        let names = result.table.column_names();
        assert_eq!(names, vec!["备注", "备注_3", "备注_2", "market"]);
        assert!(result.renamed_columns.iter().all(|r| r.source == "备注"));
    }

    #[test]
    fn test_coercion_failures_recorded_per_cell() {
        let table = raw(
            &["market", "sales", "period"],
            &[&["RX", "12.5", "2024-02"], &["RX", "twelve", "someday"]],
        );
        let result = normalizer().normalize(&table).unwrap();

        assert_eq!(result.coercion_failures.len(), 2);
        assert_eq!(result.failures_for(CanonicalField::Sales).count(), 1);
        let failure = result.failures_for(CanonicalField::Period).next().unwrap();
        assert_eq!(failure.row, 1);
        assert_eq!(failure.value, "someday");
        assert_eq!(failure.expected, ColumnType::Date);
        assert_eq!(result.table.get(1, 1), Some(&Value::Null));
    }

    #[test]
    fn test_drops_empty_rows_and_unmapped_columns() {
        let table = raw(
            &["market", "notes", "sales"],
            &[&["RX", "", "1"], &["", "", ""], &["Retail", "", "2"]],
        );
        let result = normalizer().normalize(&table).unwrap();

        assert_eq!(result.dropped_rows, 1);
        assert_eq!(result.dropped_columns, vec!["notes".to_string()]);
        assert_eq!(result.table.row_count(), 2);
        assert_eq!(result.table.column_names(), vec!["market", "sales"]);
    }

    #[test]
    fn test_empty_input_is_malformed() {
        let table = DataTable::empty(vec![Column::new("market", ColumnType::String)]);
        assert!(matches!(
            normalizer().normalize(&table),
            Err(MedallionError::MalformedInput(_))
        ));

        let table = DataTable::new(Vec::new(), vec![Vec::new()]);
        assert!(matches!(
            normalizer().normalize(&table),
            Err(MedallionError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let table = raw(
            &["市场", "销售额", "其他"],
            &[&["RX", "1", "x"], &["RX", "bad", "y"]],
        );
        let n = normalizer();
        assert_eq!(n.normalize(&table).unwrap(), n.normalize(&table).unwrap());
    }
}
