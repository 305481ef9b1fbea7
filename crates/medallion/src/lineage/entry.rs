//! Lineage entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MedallionError, Result};
use crate::quality::QualityReport;
use crate::store::Layer;

/// One recorded layer transition.
///
/// Built with the `with_*` methods, then handed to a recorder, which
/// assigns the sequence number. Read-only once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageEntry {
    sequence: u64,
    dataset: String,
    source: Option<Layer>,
    target: Layer,
    timestamp: DateTime<Utc>,
    description: String,
    rows_before: usize,
    rows_after: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    quality: Option<QualityReport>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    steps: Vec<String>,
}

impl LineageEntry {
    /// Create an entry timestamped now.
    pub fn new(
        dataset: impl Into<String>,
        source: Option<Layer>,
        target: Layer,
        description: impl Into<String>,
    ) -> Self {
        Self {
            sequence: 0,
            dataset: dataset.into(),
            source,
            target,
            timestamp: Utc::now(),
            description: description.into(),
            rows_before: 0,
            rows_after: 0,
            quality: None,
            steps: Vec::new(),
        }
    }

    /// Set row counts before and after the transition.
    pub fn with_rows(mut self, before: usize, after: usize) -> Self {
        self.rows_before = before;
        self.rows_after = after;
        self
    }

    /// Attach the quality report of the produced table.
    pub fn with_quality(mut self, report: QualityReport) -> Self {
        self.quality = Some(report);
        self
    }

    /// Add one applied step.
    pub fn with_step(mut self, step: impl Into<String>) -> Self {
        self.steps.push(step.into());
        self
    }

    /// Override the timestamp.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Set the sequence number. Recorders call this on append.
    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    /// Position in the log, starting at 1.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    /// Layer read from; `None` for ingestion.
    pub fn source(&self) -> Option<Layer> {
        self.source
    }

    pub fn target(&self) -> Layer {
        self.target
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn rows_before(&self) -> usize {
        self.rows_before
    }

    pub fn rows_after(&self) -> usize {
        self.rows_after
    }

    /// Quality report attached by the clean stage.
    pub fn quality(&self) -> Option<&QualityReport> {
        self.quality.as_ref()
    }

    /// Steps applied, such as column renames or rule names.
    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    /// Check the dataset name and the layer transition.
    ///
    /// A transition must move exactly one layer forward; an entry without a
    /// source layer must target bronze.
    pub fn validate(&self) -> Result<()> {
        if self.dataset.trim().is_empty() {
            return Err(MedallionError::MalformedInput(
                "lineage entry has a blank dataset name".to_string(),
            ));
        }

        let expected = match self.source {
            None => Some(Layer::Bronze),
            Some(source) => source.next(),
        };
        if expected != Some(self.target) {
            return Err(MedallionError::InvalidTransition {
                dataset: self.dataset.clone(),
                from: self.source,
                to: self.target,
            });
        }
        Ok(())
    }
}
