//! Quality scoring for table snapshots.

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{MedallionError, Result};
use crate::schema::{CanonicalField, CoercionFailure, NormalizedTable};
use crate::table::{DataTable, cell};

use super::report::{IssueKind, Measurements, QualityIssue, QualityReport, Severity};

/// Duplicate groups reported individually before they are summarized.
const MAX_DUPLICATE_GROUP_ISSUES: usize = 20;

/// Relative weight of each quality dimension in the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub completeness: f64,
    pub conformance: f64,
    pub uniqueness: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            completeness: 0.4,
            conformance: 0.4,
            uniqueness: 0.2,
        }
    }
}

impl ScoringWeights {
    fn total(&self) -> f64 {
        self.completeness + self.conformance + self.uniqueness
    }
}

/// Inclusive numeric bounds for a field.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ValueRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl ValueRange {
    /// Create a range with a lower bound only.
    pub fn at_least(min: f64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    /// Returns true if the value lies within the bounds.
    pub fn contains(&self, value: f64) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }
}

/// Inclusive window of acceptable period dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PeriodRange {
    /// Returns true if the date lies within the window.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Quality scoring configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Fields completeness and conformance are measured over.
    pub required_fields: Vec<CanonicalField>,
    /// Dimension weights.
    pub weights: ScoringWeights,
    /// Scores under this are flagged `below_threshold`.
    pub min_score: f64,
    /// Numeric bounds per field.
    pub ranges: IndexMap<CanonicalField, ValueRange>,
    /// Acceptable period window, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_range: Option<PeriodRange>,
}

impl Default for QualityConfig {
    fn default() -> Self {
        let mut ranges = IndexMap::new();
        ranges.insert(CanonicalField::Sales, ValueRange::at_least(0.0));

        Self {
            required_fields: vec![
                CanonicalField::Market,
                CanonicalField::Product,
                CanonicalField::Sales,
            ],
            weights: ScoringWeights::default(),
            min_score: 70.0,
            ranges,
            period_range: None,
        }
    }
}

impl QualityConfig {
    /// Check weights, threshold, required fields and ranges.
    pub fn validate(&self) -> Result<()> {
        let w = &self.weights;
        let weights = [w.completeness, w.conformance, w.uniqueness];
        if weights.iter().any(|x| !x.is_finite() || *x < 0.0) {
            return Err(MedallionError::Config(
                "Scoring weights must be finite and non-negative".to_string(),
            ));
        }
        if w.total() <= 0.0 {
            return Err(MedallionError::Config(
                "At least one scoring weight must be positive".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.min_score) {
            return Err(MedallionError::Config(format!(
                "Minimum score {} is outside [0, 100]",
                self.min_score
            )));
        }
        if self.required_fields.is_empty() {
            return Err(MedallionError::Config(
                "At least one required field must be configured".to_string(),
            ));
        }
        for (field, range) in &self.ranges {
            if let (Some(min), Some(max)) = (range.min, range.max) {
                if min > max {
                    return Err(MedallionError::Config(format!(
                        "Range for '{}' has min {} above max {}",
                        field, min, max
                    )));
                }
            }
        }
        if let Some(period) = &self.period_range {
            if period.start > period.end {
                return Err(MedallionError::Config(format!(
                    "Period range starts {} after it ends {}",
                    period.start, period.end
                )));
            }
        }
        Ok(())
    }
}

/// Computes quality reports.
///
/// Never fails on data content: every table, including an empty one,
/// yields a report.
#[derive(Debug, Clone)]
pub struct QualityScorer {
    config: QualityConfig,
}

impl QualityScorer {
    /// Create a scorer with default configuration.
    pub fn new() -> Self {
        Self {
            config: QualityConfig::default(),
        }
    }

    /// Create a scorer with custom configuration.
    ///
    /// Fails with a configuration error if the config does not validate.
    pub fn with_config(config: QualityConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get the scorer configuration.
    pub fn config(&self) -> &QualityConfig {
        &self.config
    }

    /// Score a table.
    pub fn score(&self, table: &DataTable) -> QualityReport {
        self.assess(table, &[])
    }

    /// Score the output of the normalizer, folding its coercion failures
    /// into conformance and the issue list.
    pub fn score_normalized(&self, normalized: &NormalizedTable) -> QualityReport {
        self.assess(&normalized.table, &normalized.coercion_failures)
    }

    fn assess(&self, table: &DataTable, failures: &[CoercionFailure]) -> QualityReport {
        if table.is_empty() {
            let issue = QualityIssue::new(IssueKind::EmptyDataset, Severity::Error, "empty dataset");
            return QualityReport::new(
                Measurements::default(),
                0.0,
                self.config.min_score,
                vec![issue],
            );
        }

        let mut issues = Vec::new();
        let rows = table.row_count();

        let completeness = self.completeness(table, &mut issues);
        let conformance = self.conformance(table, failures);
        self.check_ranges(table, &mut issues);
        self.check_periods(table, &mut issues);
        let duplicate_count = duplicates(table, &mut issues);
        coercion_issues(failures, &mut issues);

        let uniqueness = 1.0 - duplicate_count as f64 / rows as f64;
        let measurements = Measurements {
            row_count: rows,
            completeness,
            duplicate_count,
            conformance,
            uniqueness,
        };

        let score = self.overall(&measurements);
        QualityReport::new(measurements, score, self.config.min_score, issues)
    }

    fn overall(&self, m: &Measurements) -> f64 {
        let w = &self.config.weights;
        // Scale by the largest weight so huge weights cannot overflow the sum.
        let largest = w.completeness.max(w.conformance).max(w.uniqueness);
        if !largest.is_finite() || largest <= 0.0 {
            return 0.0;
        }
        let (c, f, u) = (
            w.completeness / largest,
            w.conformance / largest,
            w.uniqueness / largest,
        );
        let total = c + f + u;
        let score = 100.0 * (c * m.completeness + f * m.conformance + u * m.uniqueness) / total;
        if score.is_finite() {
            score.clamp(0.0, 100.0)
        } else {
            0.0
        }
    }

    /// Non-null cells over `rows × required fields`; absent fields count
    /// as all-null.
    fn completeness(&self, table: &DataTable, issues: &mut Vec<QualityIssue>) -> f64 {
        let required = &self.config.required_fields;
        let expected = table.row_count() * required.len();
        if expected == 0 {
            return 0.0;
        }

        let mut non_null = 0;
        for field in required {
            let Some(idx) = table.column_index(field.name()) else {
                issues.push(
                    QualityIssue::new(
                        IssueKind::MissingRequiredField,
                        Severity::Error,
                        format!("Required field '{}' is missing", field),
                    )
                    .with_column(field.name()),
                );
                continue;
            };

            let null_rows: Vec<usize> = table
                .column_values(idx)
                .enumerate()
                .filter(|(_, v)| v.is_null())
                .map(|(row, _)| row)
                .collect();
            non_null += table.row_count() - null_rows.len();

            if !null_rows.is_empty() {
                issues.push(
                    QualityIssue::new(
                        IssueKind::NullValues,
                        Severity::Warning,
                        format!(
                            "{} of {} values in '{}' are missing",
                            null_rows.len(),
                            table.row_count(),
                            field
                        ),
                    )
                    .with_column(field.name())
                    .with_occurrences(null_rows.len())
                    .with_sample_rows(null_rows),
                );
            }
        }

        non_null as f64 / expected as f64
    }

    /// Required fields present with no coercion failures and every value of
    /// the field's type, over required fields.
    fn conformance(&self, table: &DataTable, failures: &[CoercionFailure]) -> f64 {
        let required = &self.config.required_fields;
        if required.is_empty() {
            return 0.0;
        }

        let conforming = required
            .iter()
            .filter(|field| {
                let Some(idx) = table.column_index(field.name()) else {
                    return false;
                };
                let expected = field.column_type();
                !failures.iter().any(|f| f.field == **field)
                    && table.column_values(idx).all(|v| expected.accepts(v))
            })
            .count();

        conforming as f64 / required.len() as f64
    }

    fn check_ranges(&self, table: &DataTable, issues: &mut Vec<QualityIssue>) {
        for (field, range) in &self.config.ranges {
            let Some(idx) = table.column_index(field.name()) else {
                continue;
            };
            let offending: Vec<usize> = table
                .column_values(idx)
                .enumerate()
                .filter(|(_, v)| v.as_number().is_some_and(|n| !range.contains(n)))
                .map(|(row, _)| row)
                .collect();

            if !offending.is_empty() {
                issues.push(
                    QualityIssue::new(
                        IssueKind::OutOfRange,
                        Severity::Warning,
                        format!(
                            "{} value(s) in '{}' outside {}",
                            offending.len(),
                            field,
                            describe_range(range)
                        ),
                    )
                    .with_column(field.name())
                    .with_occurrences(offending.len())
                    .with_sample_rows(offending),
                );
            }
        }
    }

    fn check_periods(&self, table: &DataTable, issues: &mut Vec<QualityIssue>) {
        let Some(window) = &self.config.period_range else {
            return;
        };
        let Some(idx) = table.column_index(CanonicalField::Period.name()) else {
            return;
        };

        let offending: Vec<usize> = table
            .column_values(idx)
            .enumerate()
            .filter(|(_, v)| v.as_date().is_some_and(|d| !window.contains(d)))
            .map(|(row, _)| row)
            .collect();

        if !offending.is_empty() {
            issues.push(
                QualityIssue::new(
                    IssueKind::PeriodOutOfRange,
                    Severity::Warning,
                    format!(
                        "{} period(s) outside {} to {}",
                        offending.len(),
                        window.start,
                        window.end
                    ),
                )
                .with_column(CanonicalField::Period.name())
                .with_occurrences(offending.len())
                .with_sample_rows(offending),
            );
        }
    }
}

impl Default for QualityScorer {
    fn default() -> Self {
        Self::new()
    }
}

/// Count rows whose canonical tuple repeats an earlier row, adding one issue
/// per duplicate group.
///
/// The tuple is every canonical field present; tables with no canonical
/// fields are compared on all columns.
fn duplicates(table: &DataTable, issues: &mut Vec<QualityIssue>) -> usize {
    let mut key_columns: Vec<usize> = CanonicalField::ALL
        .iter()
        .filter_map(|f| table.column_index(f.name()))
        .collect();
    if key_columns.is_empty() {
        key_columns = (0..table.column_count()).collect();
    }

    let mut groups: IndexMap<Vec<String>, Vec<usize>> = IndexMap::new();
    for (row_idx, row) in table.rows.iter().enumerate() {
        let key: Vec<String> = key_columns.iter().map(|&c| cell(row, c).group_key()).collect();
        groups.entry(key).or_default().push(row_idx);
    }

    let key_names: Vec<&str> = key_columns
        .iter()
        .map(|&c| table.columns[c].name.as_str())
        .collect();

    let mut duplicate_count = 0;
    let mut reported = 0;
    let mut unreported = 0;

    for rows in groups.values().filter(|rows| rows.len() > 1) {
        duplicate_count += rows.len() - 1;

        if reported == MAX_DUPLICATE_GROUP_ISSUES {
            unreported += 1;
            continue;
        }
        reported += 1;

        let first = rows[0];
        let tuple: Vec<String> = key_columns
            .iter()
            .map(|&c| cell(&table.rows[first], c).to_string())
            .collect();
        issues.push(
            QualityIssue::new(
                IssueKind::DuplicateGroup,
                Severity::Warning,
                format!(
                    "{} rows share ({}) = ({})",
                    rows.len(),
                    key_names.join(", "),
                    tuple.join(", ")
                ),
            )
            .with_occurrences(rows.len())
            .with_sample_rows(rows.clone()),
        );
    }

    if unreported > 0 {
        issues.push(
            QualityIssue::new(
                IssueKind::DuplicateGroup,
                Severity::Warning,
                format!("{} more duplicate group(s) not listed", unreported),
            )
            .with_occurrences(unreported),
        );
    }

    duplicate_count
}

/// One issue per field with coercion failures.
fn coercion_issues(failures: &[CoercionFailure], issues: &mut Vec<QualityIssue>) {
    let mut by_field: IndexMap<CanonicalField, Vec<&CoercionFailure>> = IndexMap::new();
    for failure in failures {
        by_field.entry(failure.field).or_default().push(failure);
    }

    for (field, failed) in by_field {
        let examples: Vec<String> = failed
            .iter()
            .take(3)
            .map(|f| format!("'{}'", f.value))
            .collect();
        issues.push(
            QualityIssue::new(
                IssueKind::TypeCoercion,
                Severity::Warning,
                format!(
                    "{} value(s) in '{}' are not {}: {}",
                    failed.len(),
                    field,
                    field.column_type(),
                    examples.join(", ")
                ),
            )
            .with_column(field.name())
            .with_occurrences(failed.len())
            .with_sample_rows(failed.iter().map(|f| f.row).collect()),
        );
    }
}

fn describe_range(range: &ValueRange) -> String {
    match (range.min, range.max) {
        (Some(min), Some(max)) => format!("[{}, {}]", min, max),
        (Some(min), None) => format!(">= {}", min),
        (None, Some(max)) => format!("<= {}", max),
        (None, None) => "any".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AliasTable, SchemaNormalizer};
    use crate::table::Value;

    fn table(headers: &[&str], rows: Vec<Vec<Value>>) -> DataTable {
        DataTable::from_rows(headers.iter().map(|h| h.to_string()).collect(), rows)
    }

    fn row(market: &str, product: &str, sales: f64) -> Vec<Value> {
        vec![Value::text(market), Value::text(product), Value::Number(sales)]
    }

    #[test]
    fn test_clean_table_scores_100() {
        let t = table(
            &["market", "product", "sales"],
            vec![row("RX", "A", 1.0), row("RX", "B", 2.0), row("Retail", "A", 3.0)],
        );
        let report = QualityScorer::new().score(&t);

        assert_eq!(report.completeness(), 1.0);
        assert_eq!(report.conformance(), 1.0);
        assert_eq!(report.duplicate_count(), 0);
        assert_eq!(report.score(), 100.0);
        assert!(report.issues().is_empty());
        assert!(!report.below_threshold());
    }

    #[test]
    fn test_empty_table_scores_zero() {
        let t = table(&["market"], Vec::new());
        let report = QualityScorer::new().score(&t);

        assert_eq!(report.score(), 0.0);
        assert!(report.below_threshold());
        assert_eq!(report.issues()[0].message, "empty dataset");
        assert_eq!(report.issues()[0].kind, IssueKind::EmptyDataset);
    }

    #[test]
    fn test_missing_required_field() {
        let t = table(&["market", "sales"], vec![vec![Value::text("RX"), Value::Number(1.0)]]);
        let report = QualityScorer::new().score(&t);

        // product is absent: 2 of 3 expected cells present, 2 of 3 fields conform
        assert!((report.completeness() - 2.0 / 3.0).abs() < 1e-9);
        assert!((report.conformance() - 2.0 / 3.0).abs() < 1e-9);
        let issue = &report.issues()[0];
        assert_eq!(issue.kind, IssueKind::MissingRequiredField);
        assert_eq!(issue.severity, Severity::Error);
        assert_eq!(issue.column.as_deref(), Some("product"));
    }

    #[test]
    fn test_null_values_reduce_completeness() {
        let t = table(
            &["market", "product", "sales"],
            vec![
                row("RX", "A", 1.0),
                vec![Value::text("RX"), Value::Null, Value::Number(2.0)],
            ],
        );
        let report = QualityScorer::new().score(&t);

        assert!((report.completeness() - 5.0 / 6.0).abs() < 1e-9);
        let issue = report
            .issues()
            .iter()
            .find(|i| i.kind == IssueKind::NullValues)
            .unwrap();
        assert_eq!(issue.sample_rows, vec![1]);
    }

    #[test]
    fn test_duplicate_groups() {
        let t = table(
            &["market", "product", "sales"],
            vec![
                row("RX", "A", 1.0),
                row("RX", "A", 1.0),
                row("RX", "A", 1.0),
                row("Retail", "B", 5.0),
                row("Retail", "B", 5.0),
                row("Retail", "B", 6.0),
            ],
        );
        let report = QualityScorer::new().score(&t);

        assert_eq!(report.duplicate_count(), 3);
        assert!((report.uniqueness() - 0.5).abs() < 1e-9);
        let groups: Vec<_> = report
            .issues()
            .iter()
            .filter(|i| i.kind == IssueKind::DuplicateGroup)
            .collect();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].occurrences, 3);
        // 0.4 + 0.4 + 0.2 * 0.5
        assert!((report.score() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_out_of_range_sales() {
        let t = table(
            &["market", "product", "sales"],
            vec![row("RX", "A", -5.0), row("RX", "B", 10.0)],
        );
        let report = QualityScorer::new().score(&t);

        let issue = report
            .issues()
            .iter()
            .find(|i| i.kind == IssueKind::OutOfRange)
            .unwrap();
        assert_eq!(issue.occurrences, 1);
        assert_eq!(issue.sample_rows, vec![0]);
        // Range findings are advisory and do not move the score.
        assert_eq!(report.score(), 100.0);
    }

    #[test]
    fn test_period_window() {
        let config = QualityConfig {
            period_range: Some(PeriodRange {
                start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
            }),
            ..QualityConfig::default()
        };
        let t = table(
            &["market", "product", "sales", "period"],
            vec![
                vec![
                    Value::text("RX"),
                    Value::text("A"),
                    Value::Number(1.0),
                    Value::Date(NaiveDate::from_ymd_opt(2019, 6, 1).unwrap()),
                ],
                vec![
                    Value::text("RX"),
                    Value::text("B"),
                    Value::Number(1.0),
                    Value::Date(NaiveDate::from_ymd_opt(2021, 6, 1).unwrap()),
                ],
            ],
        );
        let report = QualityScorer::with_config(config).unwrap().score(&t);
        assert!(
            report
                .issues()
                .iter()
                .any(|i| i.kind == IssueKind::PeriodOutOfRange && i.occurrences == 1)
        );
    }

    #[test]
    fn test_coercion_failures_break_conformance() {
        let raw = table(
            &["市场", "产品", "销售额"],
            vec![
                vec![Value::text("RX"), Value::text("A"), Value::text("100")],
                vec![Value::text("RX"), Value::text("B"), Value::text("n/a!")],
            ],
        );
        let normalized = SchemaNormalizer::new(&AliasTable::default())
            .unwrap()
            .normalize(&raw)
            .unwrap();
        let report = QualityScorer::new().score_normalized(&normalized);

        assert!((report.conformance() - 2.0 / 3.0).abs() < 1e-9);
        assert!(
            report
                .issues()
                .iter()
                .any(|i| i.kind == IssueKind::TypeCoercion && i.sample_rows == vec![1])
        );
    }

    #[test]
    fn test_untyped_values_break_conformance() {
        let t = table(
            &["market", "product", "sales"],
            vec![vec![Value::text("RX"), Value::text("A"), Value::text("100")]],
        );
        let report = QualityScorer::new().score(&t);
        assert!((report.conformance() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_canonical_fields_compares_all_columns() {
        let t = table(
            &["a", "b"],
            vec![
                vec![Value::text("x"), Value::text("y")],
                vec![Value::text("x"), Value::text("y")],
            ],
        );
        let report = QualityScorer::new().score(&t);
        assert_eq!(report.duplicate_count(), 1);
        assert_eq!(report.conformance(), 0.0);
    }

    #[test]
    fn test_config_validation() {
        assert!(QualityConfig::default().validate().is_ok());

        let mut config = QualityConfig::default();
        config.weights.uniqueness = -0.1;
        assert!(config.validate().is_err());

        let mut config = QualityConfig::default();
        config.weights = ScoringWeights {
            completeness: 0.0,
            conformance: 0.0,
            uniqueness: 0.0,
        };
        assert!(config.validate().is_err());

        let mut config = QualityConfig::default();
        config.min_score = 120.0;
        assert!(config.validate().is_err());

        let mut config = QualityConfig::default();
        config.ranges.insert(
            CanonicalField::Sales,
            ValueRange {
                min: Some(10.0),
                max: Some(1.0),
            },
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_custom_weights() {
        let config = QualityConfig {
            weights: ScoringWeights {
                completeness: 1.0,
                conformance: 0.0,
                uniqueness: 0.0,
            },
            ..QualityConfig::default()
        };
        let t = table(
            &["market", "product", "sales"],
            vec![vec![Value::text("RX"), Value::Null, Value::Number(1.0)]],
        );
        let report = QualityScorer::with_config(config).unwrap().score(&t);
        assert!((report.score() - 200.0 / 3.0).abs() < 1e-9);
        assert!(report.below_threshold());
    }

    #[test]
    fn test_with_config_rejects_invalid_weights() {
        for weights in [
            ScoringWeights {
                completeness: f64::INFINITY,
                ..ScoringWeights::default()
            },
            ScoringWeights {
                conformance: f64::NAN,
                ..ScoringWeights::default()
            },
        ] {
            let config = QualityConfig {
                weights,
                ..QualityConfig::default()
            };
            assert!(matches!(
                QualityScorer::with_config(config),
                Err(MedallionError::Config(_))
            ));
        }

        let config = QualityConfig {
            min_score: f64::NAN,
            ..QualityConfig::default()
        };
        assert!(QualityScorer::with_config(config).is_err());
    }

    #[test]
    fn test_huge_weights_stay_in_bounds() {
        let config = QualityConfig {
            weights: ScoringWeights {
                completeness: f64::MAX,
                conformance: f64::MAX,
                uniqueness: f64::MAX,
            },
            ..QualityConfig::default()
        };
        let t = table(
            &["market", "product", "sales"],
            vec![vec![Value::text("RX"), Value::text("A"), Value::Number(1.0)]],
        );
        let report = QualityScorer::with_config(config).unwrap().score(&t);
        assert!((report.score() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_ragged_rows_do_not_panic() {
        let t = DataTable {
            columns: table(&["market", "product", "sales"], Vec::new()).columns,
            rows: vec![
                vec![Value::text("RX"), Value::text("A"), Value::Number(1.0)],
                vec![Value::text("RX")],
            ],
        };
        let report = QualityScorer::new().score(&t);

        assert_eq!(report.row_count(), 2);
        assert!(report.completeness() < 1.0);
        assert!((0.0..=100.0).contains(&report.score()));
    }
}
