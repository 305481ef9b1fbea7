//! In-memory lineage log.

use crate::error::Result;

use super::{LineageEntry, LineageRecorder};

/// Lineage recorder holding entries in a vector.
#[derive(Debug, Clone, Default)]
pub struct MemoryLineage {
    entries: Vec<LineageEntry>,
}

impl MemoryLineage {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of entries across all datasets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl LineageRecorder for MemoryLineage {
    fn record(&mut self, entry: LineageEntry) -> Result<LineageEntry> {
        entry.validate()?;
        let entry = entry.with_sequence(self.entries.len() as u64 + 1);
        self.entries.push(entry.clone());
        Ok(entry)
    }

    fn history(&self, dataset: &str) -> Result<Vec<LineageEntry>> {
        Ok(self
            .entries
            .iter()
            .filter(|e| e.dataset() == dataset)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MedallionError;
    use crate::store::Layer;

    #[test]
    fn test_history_is_per_dataset_and_ordered() {
        let mut log = MemoryLineage::new();
        log.record(LineageEntry::new("a", None, Layer::Bronze, "ingest")).unwrap();
        log.record(LineageEntry::new("b", None, Layer::Bronze, "ingest")).unwrap();
        log.record(LineageEntry::new("a", Some(Layer::Bronze), Layer::Silver, "clean"))
            .unwrap();

        let history = log.history("a").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].target(), Layer::Bronze);
        assert_eq!(history[1].target(), Layer::Silver);
        assert_eq!(history[0].sequence(), 1);
        assert_eq!(history[1].sequence(), 3);
        assert!(log.history("missing").unwrap().is_empty());
    }

    #[test]
    fn test_rejected_entries_are_not_appended() {
        let mut log = MemoryLineage::new();
        let result = log.record(LineageEntry::new("a", Some(Layer::Gold), Layer::Silver, "x"));
        assert!(matches!(result, Err(MedallionError::InvalidTransition { .. })));
        assert!(log.is_empty());
    }
}
