//! Data-quality measurement.
//!
//! The scorer measures completeness, conformance and uniqueness of a table
//! snapshot, combines them into a weighted 0-100 score, and lists the
//! findings behind the numbers.

mod report;
mod scorer;

pub use report::{IssueKind, QualityIssue, QualityReport, Severity};
pub use scorer::{PeriodRange, QualityConfig, QualityScorer, ScoringWeights, ValueRange};
