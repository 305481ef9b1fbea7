//! The pipeline orchestrator.

use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::error::{MedallionError, Result};
use crate::lineage::{LineageEntry, LineageRecorder};
use crate::quality::{QualityReport, QualityScorer};
use crate::rules::{BusinessRule, RuleRegistry};
use crate::schema::{NormalizedTable, SchemaNormalizer};
use crate::store::{Layer, LayerStore};
use crate::table::DataTable;

use super::outcome::{CleanOutcome, DatasetStatus, PipelineState, RunSummary};

/// Drives datasets from Bronze through Silver to Gold.
///
/// Holds configuration only. Tables live in the [`LayerStore`] and the
/// audit trail in the [`LineageRecorder`] passed to each stage.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    normalizer: SchemaNormalizer,
    scorer: QualityScorer,
    rules: RuleRegistry,
}

impl Pipeline {
    /// Create a pipeline with default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(PipelineConfig::default())
    }

    /// Create a pipeline with custom configuration.
    ///
    /// Fails if the configuration does not validate.
    pub fn with_config(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let normalizer = SchemaNormalizer::new(&config.aliases)?;
        let scorer = QualityScorer::with_config(config.quality.clone())?;
        let rules =
            RuleRegistry::with_builtins(&config.quality.required_fields, &config.rule_settings);

        Ok(Self {
            config,
            normalizer,
            scorer,
            rules,
        })
    }

    /// Register an additional rule, addressable from `business_rules`.
    pub fn with_rule(mut self, rule: BusinessRule) -> Self {
        self.rules.register(rule);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn rules(&self) -> &RuleRegistry {
        &self.rules
    }

    /// Store a raw table as the Bronze layer, unchanged.
    ///
    /// Re-ingesting replaces Bronze and appends a new lineage entry.
    pub fn ingest(
        &self,
        store: &mut dyn LayerStore,
        lineage: &mut dyn LineageRecorder,
        dataset: &str,
        raw: DataTable,
    ) -> Result<LineageEntry> {
        if raw.column_count() == 0 || raw.is_empty() {
            return Err(MedallionError::MalformedInput(format!(
                "raw table for '{}' has {} rows and {} columns",
                dataset,
                raw.row_count(),
                raw.column_count()
            )));
        }

        let rows = raw.row_count();
        let entry = LineageEntry::new(dataset, None, Layer::Bronze, "Ingested raw table")
            .with_rows(rows, rows)
            .with_step(format!("{} columns", raw.column_count()));
        entry.validate()?;

        store.put(dataset, Layer::Bronze, raw)?;
        let entry = lineage.record(entry)?;

        info!(dataset, rows, "Ingested into bronze");
        Ok(entry)
    }

    /// Normalize and score Bronze into Silver.
    ///
    /// Silver is written whatever the score; a low score is only reported.
    pub fn clean(
        &self,
        store: &mut dyn LayerStore,
        lineage: &mut dyn LineageRecorder,
        dataset: &str,
    ) -> Result<CleanOutcome> {
        let bronze = require(store, dataset, "clean", Layer::Bronze)?;
        let normalized = self.normalizer.normalize(&bronze)?;
        let report = self.scorer.score_normalized(&normalized);

        if !normalized.unmapped_columns.is_empty() {
            warn!(
                dataset,
                columns = ?normalized.unmapped_columns,
                "Columns did not match any canonical field"
            );
        }
        if report.below_threshold() {
            warn!(
                dataset,
                score = report.score(),
                min_score = self.config.quality.min_score,
                "Silver quality is below threshold"
            );
        }

        let entry = clean_steps(&normalized)
            .into_iter()
            .fold(
                LineageEntry::new(
                    dataset,
                    Some(Layer::Bronze),
                    Layer::Silver,
                    "Normalized schema and scored quality",
                )
                .with_rows(bronze.row_count(), normalized.table.row_count()),
                |entry, step| entry.with_step(step),
            )
            .with_quality(report.clone());
        entry.validate()?;

        let NormalizedTable {
            table,
            mappings,
            unmapped_columns,
            renamed_columns,
            coercion_failures,
            dropped_rows,
            dropped_columns,
        } = normalized;

        let silver_rows = table.row_count();
        store.put(dataset, Layer::Silver, table)?;
        let entry = lineage.record(entry)?;

        info!(
            dataset,
            rows = silver_rows,
            score = report.score(),
            "Cleaned into silver"
        );

        Ok(CleanOutcome {
            report,
            mappings,
            unmapped_columns,
            renamed_columns,
            coercion_failures,
            dropped_rows,
            dropped_columns,
            lineage: entry,
        })
    }

    /// Apply business rules in order to Silver and store the result as Gold.
    ///
    /// Stops at the first failing rule; Gold is left untouched in that case.
    pub fn enrich(
        &self,
        store: &mut dyn LayerStore,
        lineage: &mut dyn LineageRecorder,
        dataset: &str,
        rules: &[BusinessRule],
    ) -> Result<LineageEntry> {
        let silver = require(store, dataset, "enrich", Layer::Silver)?;
        let rows_before = silver.row_count();

        let mut table = silver;
        for rule in rules {
            table = rule
                .apply(&table)
                .map_err(|source| MedallionError::TransformFailed {
                    rule: rule.name().to_string(),
                    source,
                })?;
            table.pad_rows();
            debug!(dataset, rule = rule.name(), rows = table.row_count(), "Applied rule");
        }

        let entry = rules.iter().fold(
            LineageEntry::new(
                dataset,
                Some(Layer::Silver),
                Layer::Gold,
                format!("Applied {} business rule(s)", rules.len()),
            )
            .with_rows(rows_before, table.row_count()),
            |entry, rule| entry.with_step(rule.name()),
        );
        entry.validate()?;

        let gold_rows = table.row_count();
        store.put(dataset, Layer::Gold, table)?;
        let entry = lineage.record(entry)?;

        info!(dataset, rows = gold_rows, rules = rules.len(), "Enriched into gold");
        Ok(entry)
    }

    /// Enrich with the rules named in the configuration.
    pub fn enrich_configured(
        &self,
        store: &mut dyn LayerStore,
        lineage: &mut dyn LineageRecorder,
        dataset: &str,
    ) -> Result<LineageEntry> {
        let rules = self.rules.resolve(&self.config.business_rules)?;
        self.enrich(store, lineage, dataset, &rules)
    }

    /// Ingest, clean and enrich in one call.
    pub fn run(
        &self,
        store: &mut dyn LayerStore,
        lineage: &mut dyn LineageRecorder,
        dataset: &str,
        raw: DataTable,
    ) -> Result<RunSummary> {
        // Resolve rules first so a bad rule name fails before anything is written.
        let rules = self.rules.resolve(&self.config.business_rules)?;

        let ingest = self.ingest(store, lineage, dataset, raw)?;
        let clean = self.clean(store, lineage, dataset)?;
        let enrich = self.enrich(store, lineage, dataset, &rules)?;

        Ok(RunSummary {
            ingest,
            clean,
            enrich,
        })
    }

    /// Which layers exist for a dataset.
    pub fn status(&self, store: &dyn LayerStore, dataset: &str) -> DatasetStatus {
        let bronze = store.exists(dataset, Layer::Bronze);
        let silver = store.exists(dataset, Layer::Silver);
        let gold = store.exists(dataset, Layer::Gold);
        let highest = Layer::ALL
            .into_iter()
            .rev()
            .find(|layer| store.exists(dataset, *layer));

        DatasetStatus {
            dataset: dataset.to_string(),
            bronze,
            silver,
            gold,
            state: PipelineState::from_layer(highest),
        }
    }

    /// Report attached to the most recent clean of a dataset, if any.
    pub fn latest_quality_report(
        &self,
        lineage: &dyn LineageRecorder,
        dataset: &str,
    ) -> Result<Option<QualityReport>> {
        Ok(lineage
            .history(dataset)?
            .into_iter()
            .rev()
            .find(|entry| entry.target() == Layer::Silver && entry.quality().is_some())
            .and_then(|entry| entry.quality().cloned()))
    }

    /// Remove every layer of a dataset. Lineage history is kept.
    pub fn purge(&self, store: &mut dyn LayerStore, dataset: &str) -> Result<()> {
        store.purge(dataset)?;
        info!(dataset, "Purged all layers");
        Ok(())
    }
}

/// Fetch the layer a stage reads from, mapping absence to a prerequisite error.
fn require(
    store: &dyn LayerStore,
    dataset: &str,
    stage: &'static str,
    layer: Layer,
) -> Result<DataTable> {
    if !store.exists(dataset, layer) {
        return Err(MedallionError::MissingPrerequisite {
            dataset: dataset.to_string(),
            stage,
            required: layer,
        });
    }
    store.get(dataset, layer)
}

/// Human-readable list of what normalization did.
fn clean_steps(normalized: &NormalizedTable) -> Vec<String> {
    let mut steps: Vec<String> = normalized
        .mappings
        .iter()
        .filter(|m| m.source != m.field.name())
        .map(|m| format!("renamed '{}' to {}", m.source, m.field))
        .collect();

    for rename in &normalized.renamed_columns {
        steps.push(format!("kept duplicate '{}' as '{}'", rename.source, rename.name));
    }
    if !normalized.coercion_failures.is_empty() {
        steps.push(format!(
            "nulled {} uncoercible cell(s)",
            normalized.coercion_failures.len()
        ));
    }
    if normalized.dropped_rows > 0 {
        steps.push(format!("dropped {} empty row(s)", normalized.dropped_rows));
    }
    for column in &normalized.dropped_columns {
        steps.push(format!("dropped empty column '{}'", column));
    }
    steps
}
