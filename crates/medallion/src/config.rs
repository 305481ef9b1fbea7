//! Pipeline configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MedallionError, Result};
use crate::quality::QualityConfig;
use crate::rules::RuleSettings;
use crate::schema::AliasTable;

/// Everything the orchestrator needs besides the data itself.
///
/// Deserialized from JSON; missing fields take their defaults.
///
/// ```json
/// {
///   "aliases": { "market": ["市场", "channel"] },
///   "quality": { "min_score": 80, "required_fields": ["market", "sales"] },
///   "business_rules": ["null_below_min_sales", "sum_sales_by_market", "market_share"],
///   "rule_settings": { "min_sales": 1 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Header aliases per canonical field.
    pub aliases: AliasTable,
    /// Scoring configuration.
    pub quality: QualityConfig,
    /// Rule names applied by the enrich stage, in order.
    pub business_rules: Vec<String>,
    /// Parameters of the built-in rules.
    pub rule_settings: RuleSettings,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            aliases: AliasTable::default(),
            quality: QualityConfig::default(),
            business_rules: vec!["sum_sales_by_market".to_string()],
            rule_settings: RuleSettings::default(),
        }
    }
}

impl PipelineConfig {
    /// Load and validate a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| MedallionError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json_str(&text).map_err(|e| match e {
            MedallionError::Json(inner) => MedallionError::Config(format!(
                "Failed to parse '{}': {}",
                path.display(),
                inner
            )),
            other => other,
        })
    }

    /// Parse and validate a configuration document.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject ambiguous aliases, unusable weights or thresholds, and blank
    /// rule names.
    pub fn validate(&self) -> Result<()> {
        self.aliases.validate()?;
        self.quality.validate()?;
        self.rule_settings.validate()?;
        if self.business_rules.iter().any(|r| r.trim().is_empty()) {
            return Err(MedallionError::Config(
                "Business rule names must not be blank".to_string(),
            ));
        }
        Ok(())
    }
}
