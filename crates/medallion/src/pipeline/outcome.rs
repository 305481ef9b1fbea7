//! Values returned by pipeline stages.

use serde::{Deserialize, Serialize};

use crate::lineage::LineageEntry;
use crate::quality::QualityReport;
use crate::schema::{CoercionFailure, ColumnMapping, ColumnRename};
use crate::store::Layer;

/// Result of the clean stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanOutcome {
    /// Quality of the Silver table (also attached to the lineage entry).
    pub report: QualityReport,
    /// Columns renamed to canonical fields.
    pub mappings: Vec<ColumnMapping>,
    /// Headers that matched no alias.
    pub unmapped_columns: Vec<String>,
    /// Passed-through columns renamed to keep column names unique.
    pub renamed_columns: Vec<ColumnRename>,
    /// Cells nulled because they could not be coerced.
    pub coercion_failures: Vec<CoercionFailure>,
    /// All-null rows removed.
    pub dropped_rows: usize,
    /// All-null unmapped columns removed.
    pub dropped_columns: Vec<String>,
    /// The recorded lineage entry.
    pub lineage: LineageEntry,
}

/// Result of a full ingest, clean and enrich run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub ingest: LineageEntry,
    pub clean: CleanOutcome,
    pub enrich: LineageEntry,
}

/// How far a dataset has progressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineState {
    /// No layer stored.
    Absent,
    Bronze,
    Silver,
    Gold,
}

impl PipelineState {
    /// State implied by the most refined layer present.
    pub fn from_layer(layer: Option<Layer>) -> Self {
        match layer {
            None => PipelineState::Absent,
            Some(Layer::Bronze) => PipelineState::Bronze,
            Some(Layer::Silver) => PipelineState::Silver,
            Some(Layer::Gold) => PipelineState::Gold,
        }
    }

    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            PipelineState::Absent => "absent",
            PipelineState::Bronze => "bronze",
            PipelineState::Silver => "silver",
            PipelineState::Gold => "gold",
        }
    }
}

/// Layer-existence flags for one dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetStatus {
    pub dataset: String,
    pub bronze: bool,
    pub silver: bool,
    pub gold: bool,
    pub state: PipelineState,
}

impl DatasetStatus {
    /// Returns true if the given layer is stored.
    pub fn has(&self, layer: Layer) -> bool {
        match layer {
            Layer::Bronze => self.bronze,
            Layer::Silver => self.silver,
            Layer::Gold => self.gold,
        }
    }
}
