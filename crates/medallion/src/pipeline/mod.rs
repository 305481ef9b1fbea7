//! Stage orchestration.
//!
//! ```text
//! raw table ── ingest ──▶ Bronze ── clean ──▶ Silver ── enrich ──▶ Gold
//!                           │                   │                    │
//!                           └──── lineage ──────┴──── lineage ───────┘
//! ```

mod orchestrator;
mod outcome;

pub use orchestrator::Pipeline;
pub use outcome::{CleanOutcome, DatasetStatus, PipelineState, RunSummary};
