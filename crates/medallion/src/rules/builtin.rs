//! Built-in business rules.

use chrono::Datelike;
use indexmap::IndexMap;

use crate::error::RuleError;
use crate::schema::CanonicalField;
use crate::table::{Column, ColumnType, DataTable, Value, cell};

use super::BusinessRule;

/// Column produced by the aggregation rules.
pub const TOTAL_SALES: &str = "total_sales";

/// Column added by [`tag_market_type`].
pub const MARKET_TYPE: &str = "market_type";

/// Market labels by keyword; the first keyword found in the market value wins.
const MARKET_TYPES: &[(&[&str], &str)] = &[
    (&["RX"], "RX处方药市场"),
    (&["电子商务"], "电子商务市场"),
    (&["Device"], "医疗器械市场"),
    (&["Retail"], "零售市场"),
    (&["CSO", "DSO"], "CSO&DSO市场"),
    (&["非目标"], "非目标市场"),
];

const OTHER_MARKET: &str = "其他市场";

type RuleResult = std::result::Result<DataTable, RuleError>;

/// One row per distinct market, in first-seen order, with `total_sales`.
///
/// Rows with a null market are skipped; null sales count as zero.
pub fn sum_sales_by_market() -> BusinessRule {
    BusinessRule::new("sum_sales_by_market", |table: &DataTable| -> RuleResult {
        let market = table.require_column(CanonicalField::Market.name())?;
        let sales = table.require_column(CanonicalField::Sales.name())?;

        let mut totals: IndexMap<String, (Value, f64)> = IndexMap::new();
        for row in &table.rows {
            let market = cell(row, market);
            if market.is_null() {
                continue;
            }
            let entry = totals
                .entry(market.group_key())
                .or_insert_with(|| (market.clone(), 0.0));
            entry.1 += cell(row, sales).as_number().unwrap_or(0.0);
        }

        let columns = vec![
            Column::new(CanonicalField::Market.name(), ColumnType::Categorical),
            Column::new(TOTAL_SALES, ColumnType::Numeric),
        ];
        let rows = totals
            .into_values()
            .map(|(market, total)| vec![market, Value::Number(total)])
            .collect();
        Ok(DataTable::new(columns, rows))
    })
}

/// One row per (market, month) with `total_sales`; the period is rendered
/// as `YYYY-MM`.
pub fn sum_sales_by_market_period() -> BusinessRule {
    BusinessRule::new(
        "sum_sales_by_market_period",
        |table: &DataTable| -> RuleResult {
            let market = table.require_column(CanonicalField::Market.name())?;
            let period = table.require_column(CanonicalField::Period.name())?;
            let sales = table.require_column(CanonicalField::Sales.name())?;

            let mut totals: IndexMap<(String, String), (Value, f64)> = IndexMap::new();
            for row in &table.rows {
                let Some(date) = cell(row, period).as_date() else {
                    continue;
                };
                let market = cell(row, market);
                if market.is_null() {
                    continue;
                }
                let month = date.format("%Y-%m").to_string();
                let entry = totals
                    .entry((market.group_key(), month))
                    .or_insert_with(|| (market.clone(), 0.0));
                entry.1 += cell(row, sales).as_number().unwrap_or(0.0);
            }

            let columns = vec![
                Column::new(CanonicalField::Market.name(), ColumnType::Categorical),
                Column::new(CanonicalField::Period.name(), ColumnType::String),
                Column::new(TOTAL_SALES, ColumnType::Numeric),
            ];
            let rows = totals
                .into_iter()
                .map(|((_, month), (market, total))| {
                    vec![market, Value::Text(month), Value::Number(total)]
                })
                .collect();
            Ok(DataTable::new(columns, rows))
        },
    )
}

/// Add `year`, `month` and `quarter` columns derived from the period.
pub fn add_period_features() -> BusinessRule {
    BusinessRule::new("add_period_features", |table: &DataTable| -> RuleResult {
        let period = table.require_column(CanonicalField::Period.name())?;

        let mut out = table.clone();
        let year = out.column_count();
        for name in ["year", "month", "quarter"] {
            out.add_column(Column::new(name, ColumnType::Numeric), Value::Null);
        }
        for row in &mut out.rows {
            if let Some(date) = cell(row, period).as_date() {
                row[year] = Value::from(i64::from(date.year()));
                row[year + 1] = Value::from(i64::from(date.month()));
                row[year + 2] = Value::from(i64::from((date.month() - 1) / 3 + 1));
            }
        }
        Ok(out)
    })
}

/// Add `share_pct`: each row's `total_sales` as a percentage of the column
/// sum. Null when the sum is zero.
pub fn market_share() -> BusinessRule {
    BusinessRule::new("market_share", |table: &DataTable| -> RuleResult {
        let total = table.require_column(TOTAL_SALES)?;
        let sum: f64 = table.column_values(total).filter_map(Value::as_number).sum();

        let mut out = table.clone();
        out.add_column(Column::new("share_pct", ColumnType::Numeric), Value::Null);
        let share = out.column_count() - 1;
        if sum != 0.0 {
            for row in &mut out.rows {
                if let Some(value) = cell(row, total).as_number() {
                    row[share] = Value::Number(value / sum * 100.0);
                }
            }
        }
        Ok(out)
    })
}

/// Remove rows with a null in any of the given fields.
pub fn drop_incomplete_rows(required: Vec<CanonicalField>) -> BusinessRule {
    BusinessRule::new("drop_incomplete_rows", move |table: &DataTable| -> RuleResult {
        let indices = required
            .iter()
            .map(|field| table.require_column(field.name()))
            .collect::<crate::error::Result<Vec<usize>>>()?;

        let mut out = table.clone();
        out.rows
            .retain(|row| indices.iter().all(|&idx| !cell(row, idx).is_null()));
        Ok(out)
    })
}

/// Null out sales below `min`, e.g. order quantities under the minimum
/// order size.
pub fn null_below_min_sales(min: f64) -> BusinessRule {
    BusinessRule::new("null_below_min_sales", move |table: &DataTable| -> RuleResult {
        let sales = table.require_column(CanonicalField::Sales.name())?;

        let mut out = table.clone();
        out.pad_rows();
        for row in &mut out.rows {
            if row[sales].as_number().is_some_and(|n| n < min) {
                row[sales] = Value::Null;
            }
        }
        Ok(out)
    })
}

/// Add `market_type`, a market category label derived from the market value.
pub fn tag_market_type() -> BusinessRule {
    BusinessRule::new("tag_market_type", |table: &DataTable| -> RuleResult {
        let market = table.require_column(CanonicalField::Market.name())?;

        let mut out = table.clone();
        out.add_column(Column::new(MARKET_TYPE, ColumnType::Categorical), Value::Null);
        let tag = out.column_count() - 1;
        for row in &mut out.rows {
            let label = match &row[market] {
                Value::Null => continue,
                value => market_type(&value.to_string()),
            };
            row[tag] = Value::text(label);
        }
        Ok(out)
    })
}

fn market_type(market: &str) -> &'static str {
    MARKET_TYPES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| market.contains(k)))
        .map_or(OTHER_MARKET, |(_, label)| *label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> Value {
        Value::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn silver() -> DataTable {
        DataTable::new(
            vec![
                Column::new("market", ColumnType::Categorical),
                Column::new("period", ColumnType::Date),
                Column::new("sales", ColumnType::Numeric),
            ],
            vec![
                vec![Value::text("RX"), date(2024, 1, 5), Value::Number(100.0)],
                vec![Value::text("Retail"), date(2024, 1, 9), Value::Number(50.0)],
                vec![Value::text("RX"), date(2024, 2, 1), Value::Number(25.0)],
                vec![Value::text("RX"), date(2024, 1, 20), Value::Null],
                vec![Value::Null, date(2024, 4, 1), Value::Number(7.0)],
            ],
        )
    }

    #[test]
    fn test_sum_sales_by_market() {
        let gold = sum_sales_by_market().apply(&silver()).unwrap();

        assert_eq!(gold.column_names(), vec!["market", "total_sales"]);
        assert_eq!(gold.row_count(), 2);
        assert_eq!(gold.get(0, 0), Some(&Value::text("RX")));
        assert_eq!(gold.get(0, 1), Some(&Value::Number(125.0)));
        assert_eq!(gold.get(1, 1), Some(&Value::Number(50.0)));
    }

    #[test]
    fn test_sum_sales_by_market_period() {
        let gold = sum_sales_by_market_period().apply(&silver()).unwrap();

        assert_eq!(gold.column_names(), vec!["market", "period", "total_sales"]);
        assert_eq!(gold.row_count(), 3);
        assert_eq!(gold.get(0, 1), Some(&Value::text("2024-01")));
        assert_eq!(gold.get(0, 2), Some(&Value::Number(100.0)));
        assert_eq!(gold.get(2, 1), Some(&Value::text("2024-02")));
    }

    #[test]
    fn test_add_period_features() {
        let out = add_period_features().apply(&silver()).unwrap();

        let quarter = out.column_index("quarter").unwrap();
        assert_eq!(out.get(0, out.column_index("year").unwrap()), Some(&Value::Number(2024.0)));
        assert_eq!(out.get(2, out.column_index("month").unwrap()), Some(&Value::Number(2.0)));
        assert_eq!(out.get(4, quarter), Some(&Value::Number(2.0)));
    }

    #[test]
    fn test_market_share_after_aggregation() {
        let totals = sum_sales_by_market().apply(&silver()).unwrap();
        let out = market_share().apply(&totals).unwrap();

        let share = out.column_index("share_pct").unwrap();
        let rx = out.get(0, share).and_then(Value::as_number).unwrap();
        let retail = out.get(1, share).and_then(Value::as_number).unwrap();
        assert!((rx - 125.0 / 175.0 * 100.0).abs() < 1e-9);
        assert!((rx + retail - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_market_share_zero_total_is_null() {
        let table = DataTable::new(
            vec![Column::new(TOTAL_SALES, ColumnType::Numeric)],
            vec![vec![Value::Number(0.0)]],
        );
        let out = market_share().apply(&table).unwrap();
        assert_eq!(out.get(0, 1), Some(&Value::Null));
    }

    #[test]
    fn test_drop_incomplete_rows() {
        let rule = drop_incomplete_rows(vec![CanonicalField::Market, CanonicalField::Sales]);
        let out = rule.apply(&silver()).unwrap();
        assert_eq!(out.row_count(), 3);
    }

    #[test]
    fn test_null_below_min_sales() {
        let out = null_below_min_sales(30.0).apply(&silver()).unwrap();

        assert_eq!(out.get(0, 2), Some(&Value::Number(100.0)));
        assert_eq!(out.get(2, 2), Some(&Value::Null));
        assert_eq!(out.get(4, 2), Some(&Value::Null));
        assert_eq!(out.row_count(), 5);
    }

    #[test]
    fn test_tag_market_type() {
        let table = DataTable::new(
            vec![Column::new("market", ColumnType::Categorical)],
            vec![
                vec![Value::text("RX")],
                vec![Value::text("电子商务")],
                vec![Value::text("CSO&DSO")],
                vec![Value::text("Hospital")],
                vec![Value::Null],
            ],
        );
        let out = tag_market_type().apply(&table).unwrap();

        let tag = out.column_index(MARKET_TYPE).unwrap();
        let labels: Vec<String> = out.column_values(tag).map(|v| v.to_string()).collect();
        assert_eq!(
            labels,
            vec!["RX处方药市场", "电子商务市场", "CSO&DSO市场", "其他市场", ""]
        );
    }

    #[test]
    fn test_short_rows_read_as_null() {
        let mut table = silver();
        table.rows.push(vec![Value::text("Retail")]);

        let gold = sum_sales_by_market().apply(&table).unwrap();
        assert_eq!(gold.get(1, 1), Some(&Value::Number(50.0)));

        let kept = drop_incomplete_rows(vec![CanonicalField::Sales])
            .apply(&table)
            .unwrap();
        assert_eq!(kept.row_count(), 4);
        assert!(sum_sales_by_market_period().apply(&table).is_ok());
        assert!(add_period_features().apply(&table).is_ok());
        assert!(tag_market_type().apply(&table).is_ok());
    }

    #[test]
    fn test_missing_column_is_descriptive() {
        let table = DataTable::from_rows(vec!["product".into()], vec![vec![Value::text("A")]]);
        let err = sum_sales_by_market().apply(&table).unwrap_err();
        assert!(err.to_string().contains("column 'market' not found"));
    }
}
