//! In-memory layer store.

use std::collections::BTreeMap;

use crate::error::{MedallionError, Result};
use crate::table::DataTable;

use super::{Layer, LayerStore};

/// Layer store backed by a map, for tests and one-shot runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    datasets: BTreeMap<String, BTreeMap<Layer, DataTable>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl LayerStore for MemoryStore {
    fn put(&mut self, dataset: &str, layer: Layer, table: DataTable) -> Result<()> {
        self.datasets
            .entry(dataset.to_string())
            .or_default()
            .insert(layer, table);
        Ok(())
    }

    fn get(&self, dataset: &str, layer: Layer) -> Result<DataTable> {
        self.datasets
            .get(dataset)
            .and_then(|layers| layers.get(&layer))
            .cloned()
            .ok_or_else(|| MedallionError::NotFound {
                dataset: dataset.to_string(),
                layer,
            })
    }

    fn exists(&self, dataset: &str, layer: Layer) -> bool {
        self.datasets
            .get(dataset)
            .is_some_and(|layers| layers.contains_key(&layer))
    }

    fn purge(&mut self, dataset: &str) -> Result<()> {
        self.datasets.remove(dataset);
        Ok(())
    }

    fn datasets(&self) -> Result<Vec<String>> {
        Ok(self
            .datasets
            .iter()
            .filter(|(_, layers)| !layers.is_empty())
            .map(|(name, _)| name.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;

    fn table(value: &str) -> DataTable {
        DataTable::from_rows(vec!["market".into()], vec![vec![Value::text(value)]])
    }

    #[test]
    fn test_put_replaces() {
        let mut store = MemoryStore::new();
        store.put("sales", Layer::Bronze, table("RX")).unwrap();
        store.put("sales", Layer::Bronze, table("Retail")).unwrap();

        let got = store.get("sales", Layer::Bronze).unwrap();
        assert_eq!(got.get(0, 0), Some(&Value::text("Retail")));
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.get("sales", Layer::Gold),
            Err(MedallionError::NotFound { layer: Layer::Gold, .. })
        ));
    }

    #[test]
    fn test_purge_removes_every_layer() {
        let mut store = MemoryStore::new();
        for layer in Layer::ALL {
            store.put("sales", layer, table("RX")).unwrap();
        }
        store.put("other", Layer::Bronze, table("RX")).unwrap();

        store.purge("sales").unwrap();

        assert!(Layer::ALL.iter().all(|l| !store.exists("sales", *l)));
        assert!(store.exists("other", Layer::Bronze));
        assert_eq!(store.datasets().unwrap(), vec!["other".to_string()]);
    }
}
