//! Medallion: layered ETL engine for spreadsheet market data.
//!
//! Raw tables move through three tiers. Bronze holds data exactly as
//! ingested, Silver holds it mapped onto a canonical schema and scored for
//! quality, and Gold holds the output of business rules. Every transition is
//! written to an append-only lineage log.
//!
//! # Core Principles
//!
//! - **Non-destructive**: Bronze is never modified after ingestion
//! - **Advisory quality**: a low score is reported, never fatal
//! - **Full provenance**: every layer write has a lineage entry
//!
//! # Example
//!
//! ```
//! use medallion::{DataTable, Layer, LayerStore, MemoryLineage, MemoryStore, Pipeline, Value};
//!
//! let raw = DataTable::from_rows(
//!     vec!["市场".into(), "产品".into(), "销售额".into()],
//!     vec![
//!         vec![Value::text("RX"), Value::text("A"), Value::text("100")],
//!         vec![Value::text("Retail"), Value::text("B"), Value::text("50")],
//!     ],
//! );
//!
//! let pipeline = Pipeline::new().unwrap();
//! let mut store = MemoryStore::new();
//! let mut lineage = MemoryLineage::new();
//! let summary = pipeline.run(&mut store, &mut lineage, "sales", raw).unwrap();
//!
//! assert_eq!(summary.clean.report.score(), 100.0);
//! let gold = store.get("sales", Layer::Gold).unwrap();
//! assert_eq!(gold.column_names(), vec!["market", "total_sales"]);
//! ```

pub mod config;
pub mod dictionary;
pub mod error;
pub mod input;
pub mod lineage;
pub mod pipeline;
pub mod quality;
pub mod rules;
pub mod schema;
pub mod store;
pub mod table;

pub use config::PipelineConfig;
pub use dictionary::{DataDictionary, data_dictionary};
pub use error::{MedallionError, Result, RuleError};
pub use input::{Parser, ParserConfig, SourceMetadata};
pub use lineage::{JsonLinesLineage, LineageEntry, LineageRecorder, MemoryLineage};
pub use pipeline::{CleanOutcome, DatasetStatus, Pipeline, PipelineState, RunSummary};
pub use quality::{IssueKind, QualityConfig, QualityIssue, QualityReport, QualityScorer, Severity};
pub use rules::{BusinessRule, RuleRegistry};
pub use schema::{AliasTable, CanonicalField, NormalizedTable, SchemaNormalizer};
pub use store::{JsonFileStore, Layer, LayerStore, MemoryStore};
pub use table::{Column, ColumnType, DataTable, Value};
