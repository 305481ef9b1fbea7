//! Error types for the Medallion library.

use std::path::PathBuf;
use thiserror::Error;

use crate::store::Layer;

/// Boxed cause carried by a failed business rule.
pub type RuleError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for Medallion operations.
///
/// Data-quality findings (nulls, duplicates, low scores) are never reported
/// through this type; they end up in a [`crate::QualityReport`].
#[derive(Debug, Error)]
pub enum MedallionError {
    /// Raw table with no rows or no columns, or an otherwise unusable record.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Read of a layer that has not been written.
    #[error("Dataset '{dataset}' has no {layer} layer")]
    NotFound { dataset: String, layer: Layer },

    /// A stage was invoked before the layer it reads from exists.
    #[error("Cannot run {stage} on '{dataset}': {required} layer is missing")]
    MissingPrerequisite {
        dataset: String,
        stage: &'static str,
        required: Layer,
    },

    /// A lineage entry would break the bronze < silver < gold ordering.
    #[error("Invalid lineage transition for '{dataset}': {} -> {to}", layer_label(.from))]
    InvalidTransition {
        dataset: String,
        from: Option<Layer>,
        to: Layer,
    },

    /// A business rule raised during enrichment.
    #[error("Business rule '{rule}' failed: {source}")]
    TransformFailed {
        rule: String,
        #[source]
        source: RuleError,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error saving or loading persisted layers or lineage.
    #[error("Persistence error: {0}")]
    Persistence(String),
}

fn layer_label(layer: &Option<Layer>) -> String {
    match layer {
        Some(layer) => layer.to_string(),
        None => "(none)".to_string(),
    }
}

/// Result type alias for Medallion operations.
pub type Result<T> = std::result::Result<T, MedallionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_message() {
        let err = MedallionError::InvalidTransition {
            dataset: "sales".to_string(),
            from: Some(Layer::Gold),
            to: Layer::Silver,
        };
        assert_eq!(
            err.to_string(),
            "Invalid lineage transition for 'sales': gold -> silver"
        );

        let err = MedallionError::InvalidTransition {
            dataset: "sales".to_string(),
            from: None,
            to: Layer::Gold,
        };
        assert!(err.to_string().contains("(none) -> gold"));
    }

    #[test]
    fn test_transform_failed_keeps_cause() {
        use std::error::Error as _;

        let err = MedallionError::TransformFailed {
            rule: "sum_sales_by_market".to_string(),
            source: "column 'market' not found".into(),
        };
        assert!(err.to_string().contains("sum_sales_by_market"));
        assert_eq!(
            err.source().map(|s| s.to_string()),
            Some("column 'market' not found".to_string())
        );
    }
}
