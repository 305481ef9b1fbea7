//! Append-only JSON-lines lineage log.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::error::{MedallionError, Result};

use super::{LineageEntry, LineageRecorder};

const LINEAGE_FILE: &str = "lineage.jsonl";

/// Lineage recorder writing one JSON object per line to
/// `<lake>/lineage.jsonl`. Existing lines are never rewritten.
#[derive(Debug, Clone)]
pub struct JsonLinesLineage {
    path: PathBuf,
    next_sequence: u64,
}

impl JsonLinesLineage {
    /// Open the log under a lake directory, creating the directory if needed.
    pub fn open(lake: impl AsRef<Path>) -> Result<Self> {
        let lake = lake.as_ref();
        fs::create_dir_all(lake).map_err(|e| {
            MedallionError::Persistence(format!(
                "Failed to create directory '{}': {}",
                lake.display(),
                e
            ))
        })?;

        let path = lake.join(LINEAGE_FILE);
        let last = read_entries(&path)?
            .iter()
            .map(LineageEntry::sequence)
            .max()
            .unwrap_or(0);

        Ok(Self {
            path,
            next_sequence: last + 1,
        })
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LineageRecorder for JsonLinesLineage {
    fn record(&mut self, entry: LineageEntry) -> Result<LineageEntry> {
        entry.validate()?;
        let entry = entry.with_sequence(self.next_sequence);

        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| MedallionError::Io {
                path: self.path.clone(),
                source: e,
            })?;
        file.write_all(line.as_bytes())
            .map_err(|e| MedallionError::Io {
                path: self.path.clone(),
                source: e,
            })?;

        self.next_sequence += 1;
        Ok(entry)
    }

    fn history(&self, dataset: &str) -> Result<Vec<LineageEntry>> {
        Ok(read_entries(&self.path)?
            .into_iter()
            .filter(|e| e.dataset() == dataset)
            .collect())
    }
}

fn read_entries(path: &Path) -> Result<Vec<LineageEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path).map_err(|e| MedallionError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut entries = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| MedallionError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let entry = serde_json::from_str(&line).map_err(|e| {
            MedallionError::Persistence(format!(
                "Failed to parse lineage entry at {}:{}: {}",
                path.display(),
                idx + 1,
                e
            ))
        })?;
        entries.push(entry);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Layer;
    use tempfile::TempDir;

    #[test]
    fn test_entries_survive_reopen() {
        let lake = TempDir::new().unwrap();
        {
            let mut log = JsonLinesLineage::open(lake.path()).unwrap();
            log.record(LineageEntry::new("sales", None, Layer::Bronze, "ingest").with_rows(3, 3))
                .unwrap();
        }

        let mut log = JsonLinesLineage::open(lake.path()).unwrap();
        let entry = log
            .record(LineageEntry::new("sales", Some(Layer::Bronze), Layer::Silver, "clean"))
            .unwrap();
        assert_eq!(entry.sequence(), 2);

        let history = log.history("sales").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].rows_after(), 3);
        assert_eq!(history[1].source(), Some(Layer::Bronze));
    }

    #[test]
    fn test_invalid_entry_leaves_file_untouched() {
        let lake = TempDir::new().unwrap();
        let mut log = JsonLinesLineage::open(lake.path()).unwrap();

        assert!(log.record(LineageEntry::new("sales", None, Layer::Gold, "x")).is_err());
        assert!(!log.path().exists());
    }

    #[test]
    fn test_corrupt_line_is_reported() {
        let lake = TempDir::new().unwrap();
        fs::write(lake.path().join(LINEAGE_FILE), "{not json}\n").unwrap();

        let err = JsonLinesLineage::open(lake.path()).unwrap_err();
        assert!(err.to_string().contains("lineage.jsonl:1"));
    }
}
