//! The three refinement tiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MedallionError;

/// Refinement tier of a dataset snapshot.
///
/// Totally ordered: `Bronze < Silver < Gold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    /// Raw data exactly as ingested.
    Bronze,
    /// Normalized and validated.
    Silver,
    /// Business-ready, after rules are applied.
    Gold,
}

impl Layer {
    /// All layers in refinement order.
    pub const ALL: [Layer; 3] = [Layer::Bronze, Layer::Silver, Layer::Gold];

    /// Lowercase name, also used as the persisted file stem.
    pub fn name(&self) -> &'static str {
        match self {
            Layer::Bronze => "bronze",
            Layer::Silver => "silver",
            Layer::Gold => "gold",
        }
    }

    /// The layer derived from this one, if any.
    pub fn next(&self) -> Option<Layer> {
        match self {
            Layer::Bronze => Some(Layer::Silver),
            Layer::Silver => Some(Layer::Gold),
            Layer::Gold => None,
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Layer {
    type Err = MedallionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bronze" => Ok(Layer::Bronze),
            "silver" => Ok(Layer::Silver),
            "gold" => Ok(Layer::Gold),
            other => Err(MedallionError::Config(format!("Unknown layer '{}'", other))),
        }
    }
}
