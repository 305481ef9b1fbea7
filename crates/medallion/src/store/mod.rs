//! Layer storage.
//!
//! A [`LayerStore`] holds at most one table per (dataset, layer) key.
//! Writes replace the previous snapshot; purge removes all three layers of
//! a dataset at once and never touches lineage.

mod file;
mod layer;
mod memory;

pub use file::JsonFileStore;
pub use layer::Layer;
pub use memory::MemoryStore;

use crate::error::Result;
use crate::table::DataTable;

/// Addressable table store keyed by dataset name and layer.
pub trait LayerStore {
    /// Store a table, replacing any previous snapshot for the key.
    fn put(&mut self, dataset: &str, layer: Layer, table: DataTable) -> Result<()>;

    /// Fetch a table. Fails with `NotFound` if the key was never written.
    fn get(&self, dataset: &str, layer: Layer) -> Result<DataTable>;

    /// Returns true if the key holds a table.
    fn exists(&self, dataset: &str, layer: Layer) -> bool;

    /// Remove every layer of a dataset. Missing datasets are not an error.
    fn purge(&mut self, dataset: &str) -> Result<()>;

    /// Names of datasets with at least one stored layer, sorted.
    fn datasets(&self) -> Result<Vec<String>>;
}
