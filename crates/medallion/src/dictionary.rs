//! Per-layer column profiles of a dataset.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{MedallionError, Result};
use crate::store::{Layer, LayerStore};
use crate::table::{ColumnType, DataTable};

const MAX_SAMPLES: usize = 3;

/// Profile of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub non_null: usize,
    pub null: usize,
    /// Distinct non-null values.
    pub distinct: usize,
    /// Up to three distinct non-null values in first-seen order.
    pub samples: Vec<String>,
}

/// Profile of one stored layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerProfile {
    pub layer: Layer,
    pub row_count: usize,
    pub columns: Vec<ColumnProfile>,
}

/// Column profiles for every stored layer of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataDictionary {
    pub dataset: String,
    pub layers: Vec<LayerProfile>,
}

impl DataDictionary {
    /// Profile of one layer, if stored.
    pub fn layer(&self, layer: Layer) -> Option<&LayerProfile> {
        self.layers.iter().find(|p| p.layer == layer)
    }
}

/// Build the data dictionary for a dataset.
///
/// Fails with `NotFound` (on bronze) when no layer is stored.
pub fn data_dictionary(store: &dyn LayerStore, dataset: &str) -> Result<DataDictionary> {
    let mut layers = Vec::new();
    for layer in Layer::ALL {
        if store.exists(dataset, layer) {
            let table = store.get(dataset, layer)?;
            layers.push(profile_layer(layer, &table));
        }
    }

    if layers.is_empty() {
        return Err(MedallionError::NotFound {
            dataset: dataset.to_string(),
            layer: Layer::Bronze,
        });
    }

    Ok(DataDictionary {
        dataset: dataset.to_string(),
        layers,
    })
}

fn profile_layer(layer: Layer, table: &DataTable) -> LayerProfile {
    let columns = table
        .columns
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let mut seen = HashSet::new();
            let mut samples = Vec::new();
            let mut non_null = 0;

            for value in table.column_values(idx).filter(|v| !v.is_null()) {
                non_null += 1;
                if seen.insert(value.group_key()) && samples.len() < MAX_SAMPLES {
                    samples.push(value.to_string());
                }
            }

            ColumnProfile {
                name: column.name.clone(),
                column_type: column.column_type,
                non_null,
                null: table.row_count() - non_null,
                distinct: seen.len(),
                samples,
            }
        })
        .collect();

    LayerProfile {
        layer,
        row_count: table.row_count(),
        columns,
    }
}
