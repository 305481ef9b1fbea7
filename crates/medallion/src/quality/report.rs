//! Quality report types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity level of a quality issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Potential issue that should be reviewed.
    Warning,
    /// Definite issue that should be addressed.
    Error,
}

impl Severity {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Warning => "Warning",
            Severity::Error => "Error",
        }
    }
}

/// Which quality rule an issue violates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// The table has no rows.
    EmptyDataset,
    /// A required canonical field is absent.
    MissingRequiredField,
    /// A required field has null cells.
    NullValues,
    /// Numeric values outside the configured range.
    OutOfRange,
    /// Period values outside the configured date window.
    PeriodOutOfRange,
    /// Rows repeating the same canonical tuple.
    DuplicateGroup,
    /// Cells that could not be coerced to the field's type.
    TypeCoercion,
}

impl IssueKind {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            IssueKind::EmptyDataset => "Empty Dataset",
            IssueKind::MissingRequiredField => "Missing Required Field",
            IssueKind::NullValues => "Null Values",
            IssueKind::OutOfRange => "Out of Range",
            IssueKind::PeriodOutOfRange => "Period Out of Range",
            IssueKind::DuplicateGroup => "Duplicate Group",
            IssueKind::TypeCoercion => "Type Coercion Failure",
        }
    }
}

/// One human-readable finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityIssue {
    /// Rule violated.
    pub kind: IssueKind,
    /// Severity level.
    pub severity: Severity,
    /// Affected column, when the rule is column-scoped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    /// Human-readable description.
    pub message: String,
    /// Number of affected cells or rows.
    pub occurrences: usize,
    /// Up to five affected row indices.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sample_rows: Vec<usize>,
}

impl QualityIssue {
    /// Create a new issue.
    pub fn new(kind: IssueKind, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            column: None,
            message: message.into(),
            occurrences: 0,
            sample_rows: Vec::new(),
        }
    }

    /// Set the affected column.
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// Set the occurrence count.
    pub fn with_occurrences(mut self, count: usize) -> Self {
        self.occurrences = count;
        self
    }

    /// Set sample rows (truncated to five).
    pub fn with_sample_rows(mut self, mut rows: Vec<usize>) -> Self {
        rows.truncate(5);
        self.sample_rows = rows;
        self
    }
}

/// Ratios a report is built from, each in [0, 1] except the counts.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub(crate) struct Measurements {
    pub row_count: usize,
    pub completeness: f64,
    pub duplicate_count: usize,
    pub conformance: f64,
    pub uniqueness: f64,
}

/// Data-quality assessment of one table snapshot.
///
/// Created only by the scorer; read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    row_count: usize,
    completeness: f64,
    duplicate_count: usize,
    conformance: f64,
    uniqueness: f64,
    score: f64,
    below_threshold: bool,
    issues: Vec<QualityIssue>,
    assessed_at: DateTime<Utc>,
}

impl QualityReport {
    pub(crate) fn new(
        measurements: Measurements,
        score: f64,
        min_score: f64,
        issues: Vec<QualityIssue>,
    ) -> Self {
        Self {
            row_count: measurements.row_count,
            completeness: measurements.completeness,
            duplicate_count: measurements.duplicate_count,
            conformance: measurements.conformance,
            uniqueness: measurements.uniqueness,
            score,
            below_threshold: score < min_score,
            issues,
            assessed_at: Utc::now(),
        }
    }

    /// Rows assessed.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Non-null required cells over expected required cells.
    pub fn completeness(&self) -> f64 {
        self.completeness
    }

    /// Rows repeating an earlier row's canonical tuple.
    pub fn duplicate_count(&self) -> usize {
        self.duplicate_count
    }

    /// Required fields present and correctly typed over required fields.
    pub fn conformance(&self) -> f64 {
        self.conformance
    }

    /// Share of rows that are not duplicates.
    pub fn uniqueness(&self) -> f64 {
        self.uniqueness
    }

    /// Overall score in [0, 100].
    pub fn score(&self) -> f64 {
        self.score
    }

    /// True when the score is under the configured minimum.
    pub fn below_threshold(&self) -> bool {
        self.below_threshold
    }

    /// Findings in detection order.
    pub fn issues(&self) -> &[QualityIssue] {
        &self.issues
    }

    /// When the assessment ran.
    pub fn assessed_at(&self) -> DateTime<Utc> {
        self.assessed_at
    }

    /// Count issues of a severity.
    pub fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    /// Returns true if any issue has error severity.
    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0
    }

    /// Human-readable next step.
    pub fn recommendation(&self) -> String {
        let errors = self.count(Severity::Error);
        let warnings = self.count(Severity::Warning);

        if errors > 0 {
            format!(
                "Address {} error-level issues before relying on downstream layers.",
                errors
            )
        } else if warnings > 5 {
            format!(
                "Review {} warnings to improve data quality (score: {:.0}).",
                warnings, self.score
            )
        } else if self.score >= 90.0 {
            "Data quality is good.".to_string()
        } else if !self.below_threshold {
            "Data quality is acceptable. Consider addressing warnings.".to_string()
        } else {
            "Data quality needs attention. Review all issues.".to_string()
        }
    }
}
