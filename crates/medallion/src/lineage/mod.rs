//! Lineage recording.
//!
//! Every layer write is paired with a [`LineageEntry`]. Recorders only
//! append: entries are never edited or removed, and purging a dataset
//! leaves its history in place.

mod entry;
mod jsonl;
mod memory;

pub use entry::LineageEntry;
pub use jsonl::JsonLinesLineage;
pub use memory::MemoryLineage;

use crate::error::Result;

/// Append-only audit log of layer transitions.
pub trait LineageRecorder {
    /// Validate and append an entry, returning it with its sequence number.
    fn record(&mut self, entry: LineageEntry) -> Result<LineageEntry>;

    /// Entries for one dataset, oldest first.
    fn history(&self, dataset: &str) -> Result<Vec<LineageEntry>>;
}
