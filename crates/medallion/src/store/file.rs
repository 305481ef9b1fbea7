//! JSON-file layer store.
//!
//! Layout under the lake root:
//!
//! ```text
//! <lake>/tables/
//! └── <sha256 of dataset name>/
//!     ├── name          # dataset name as given
//!     ├── bronze.json
//!     ├── silver.json
//!     └── gold.json
//! ```

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{MedallionError, Result};
use crate::table::DataTable;

use super::{Layer, LayerStore};

const TABLES_DIR: &str = "tables";
const NAME_FILE: &str = "name";
const TOMBSTONE_SUFFIX: &str = ".purged";

/// Layer store persisting one JSON document per layer.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    /// Open a store under a lake directory, creating it if needed.
    pub fn open(lake: impl AsRef<Path>) -> Result<Self> {
        let root = lake.as_ref().join(TABLES_DIR);
        fs::create_dir_all(&root).map_err(|e| {
            MedallionError::Persistence(format!(
                "Failed to create directory '{}': {}",
                root.display(),
                e
            ))
        })?;
        Ok(Self { root })
    }

    /// Directory holding the tables.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for one dataset. Names are hashed so any string is safe.
    fn dataset_dir(&self, dataset: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(dataset.as_bytes());
        self.root.join(format!("{:x}", hasher.finalize()))
    }

    fn layer_path(&self, dataset: &str, layer: Layer) -> PathBuf {
        self.dataset_dir(dataset).join(format!("{}.json", layer.name()))
    }
}

impl LayerStore for JsonFileStore {
    fn put(&mut self, dataset: &str, layer: Layer, table: DataTable) -> Result<()> {
        let dir = self.dataset_dir(dataset);
        fs::create_dir_all(&dir).map_err(|e| {
            MedallionError::Persistence(format!(
                "Failed to create directory '{}': {}",
                dir.display(),
                e
            ))
        })?;

        let name_path = dir.join(NAME_FILE);
        if !name_path.exists() {
            fs::write(&name_path, dataset).map_err(|e| MedallionError::Io {
                path: name_path.clone(),
                source: e,
            })?;
        }

        // Write beside the target and rename so readers never see a partial file.
        let path = self.layer_path(dataset, layer);
        let staging = path.with_extension("json.tmp");
        let file = File::create(&staging).map_err(|e| {
            MedallionError::Persistence(format!(
                "Failed to create file '{}': {}",
                staging.display(),
                e
            ))
        })?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &table).map_err(|e| {
            MedallionError::Persistence(format!(
                "Failed to serialize {} layer of '{}': {}",
                layer, dataset, e
            ))
        })?;
        writer.flush().map_err(|e| MedallionError::Io {
            path: staging.clone(),
            source: e,
        })?;
        drop(writer);
        fs::rename(&staging, &path).map_err(|e| MedallionError::Io {
            path: path.clone(),
            source: e,
        })?;

        debug!(dataset, %layer, rows = table.row_count(), path = %path.display(), "Wrote layer");
        Ok(())
    }

    fn get(&self, dataset: &str, layer: Layer) -> Result<DataTable> {
        let path = self.layer_path(dataset, layer);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(MedallionError::NotFound {
                    dataset: dataset.to_string(),
                    layer,
                });
            }
            Err(e) => return Err(MedallionError::Io { path, source: e }),
        };

        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            MedallionError::Persistence(format!(
                "Failed to parse {} layer '{}': {}",
                layer,
                path.display(),
                e
            ))
        })
    }

    fn exists(&self, dataset: &str, layer: Layer) -> bool {
        self.layer_path(dataset, layer).is_file()
    }

    fn purge(&mut self, dataset: &str) -> Result<()> {
        let dir = self.dataset_dir(dataset);
        if !dir.exists() {
            return Ok(());
        }

        // The rename is the commit point: after it no layer is visible.
        let mut tombstone = dir.clone().into_os_string();
        tombstone.push(TOMBSTONE_SUFFIX);
        let tombstone = PathBuf::from(tombstone);
        if tombstone.exists() {
            fs::remove_dir_all(&tombstone).map_err(|e| MedallionError::Io {
                path: tombstone.clone(),
                source: e,
            })?;
        }
        fs::rename(&dir, &tombstone).map_err(|e| MedallionError::Io {
            path: dir.clone(),
            source: e,
        })?;
        fs::remove_dir_all(&tombstone).map_err(|e| MedallionError::Io {
            path: tombstone.clone(),
            source: e,
        })?;

        debug!(dataset, "Purged dataset directory");
        Ok(())
    }

    fn datasets(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.root).map_err(|e| {
            MedallionError::Persistence(format!(
                "Failed to read directory '{}': {}",
                self.root.display(),
                e
            ))
        })?;

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir() && path.extension().is_none())
            .filter(|path| {
                Layer::ALL
                    .iter()
                    .any(|l| path.join(format!("{}.json", l.name())).is_file())
            })
            .filter_map(|path| fs::read_to_string(path.join(NAME_FILE)).ok())
            .collect();

        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;
    use tempfile::TempDir;

    fn table() -> DataTable {
        DataTable::from_rows(
            vec!["market".into(), "sales".into()],
            vec![vec![Value::text("RX"), Value::Number(12.5)]],
        )
    }

    #[test]
    fn test_round_trip_through_disk() {
        let lake = TempDir::new().unwrap();
        let mut store = JsonFileStore::open(lake.path()).unwrap();

        store.put("电商 sales", Layer::Silver, table()).unwrap();

        let reopened = JsonFileStore::open(lake.path()).unwrap();
        assert_eq!(reopened.get("电商 sales", Layer::Silver).unwrap(), table());
        assert!(reopened.exists("电商 sales", Layer::Silver));
        assert!(!reopened.exists("电商 sales", Layer::Gold));
        assert_eq!(reopened.datasets().unwrap(), vec!["电商 sales".to_string()]);
    }

    #[test]
    fn test_missing_layer_is_not_found() {
        let lake = TempDir::new().unwrap();
        let store = JsonFileStore::open(lake.path()).unwrap();
        assert!(matches!(
            store.get("sales", Layer::Bronze),
            Err(MedallionError::NotFound { .. })
        ));
    }

    #[test]
    fn test_purge_removes_directory() {
        let lake = TempDir::new().unwrap();
        let mut store = JsonFileStore::open(lake.path()).unwrap();
        store.put("sales", Layer::Bronze, table()).unwrap();
        store.put("sales", Layer::Silver, table()).unwrap();

        store.purge("sales").unwrap();

        assert!(!store.exists("sales", Layer::Bronze));
        assert!(store.datasets().unwrap().is_empty());
        assert_eq!(fs::read_dir(store.root()).unwrap().count(), 0);
        // Purging again is a no-op.
        store.purge("sales").unwrap();
    }
}
