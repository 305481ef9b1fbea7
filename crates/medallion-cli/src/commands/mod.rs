//! CLI command implementations.

pub mod clean;
pub mod dictionary;
pub mod enrich;
pub mod history;
pub mod ingest;
pub mod purge;
pub mod report;
pub mod run;
pub mod show;
pub mod status;

use std::path::{Path, PathBuf};

use colored::Colorize;
use medallion::{
    DataTable, JsonFileStore, JsonLinesLineage, ParserConfig, Pipeline, PipelineConfig,
    QualityReport, Severity, SourceMetadata,
};
use tracing::debug;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Global options locating the lake and its configuration.
pub struct LakeArgs {
    pub root: PathBuf,
    pub config: Option<PathBuf>,
}

/// An opened lake: the pipeline plus its file-backed store and lineage log.
pub struct Lake {
    pub pipeline: Pipeline,
    pub store: JsonFileStore,
    pub lineage: JsonLinesLineage,
}

impl Lake {
    pub fn open(args: &LakeArgs) -> Result<Self, Box<dyn std::error::Error>> {
        let config = match &args.config {
            Some(path) => PipelineConfig::from_file(path)?,
            None => PipelineConfig::default(),
        };
        debug!(lake = %args.root.display(), rules = ?config.business_rules, "Opening lake");

        Ok(Self {
            pipeline: Pipeline::with_config(config)?,
            store: JsonFileStore::open(&args.root)?,
            lineage: JsonLinesLineage::open(&args.root)?,
        })
    }
}

/// Parse a delimited file into a raw table.
pub fn read_table(
    file: &Path,
    delimiter: Option<char>,
) -> Result<(DataTable, SourceMetadata), Box<dyn std::error::Error>> {
    let delimiter = match delimiter {
        Some(c) if c.is_ascii() => Some(c as u8),
        Some(c) => return Err(format!("Delimiter must be an ASCII character, got '{}'", c).into()),
        None => None,
    };
    let parser = medallion::Parser::with_config(ParserConfig {
        delimiter,
        ..ParserConfig::default()
    });
    Ok(parser.parse_file(file)?)
}

/// Dataset name from the flag, else from the source file stem.
pub fn dataset_name(name: Option<String>, source: &SourceMetadata) -> String {
    name.filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| source.dataset_name())
}

/// Print a quality report in human-readable form.
pub fn print_report(report: &QualityReport) {
    let score = report.score();
    let score_text = format!("{:.1}", score);
    let score_color = if score >= 90.0 {
        score_text.green()
    } else if !report.below_threshold() {
        score_text.yellow()
    } else {
        score_text.red()
    };

    println!("{}", "Quality:".yellow().bold());
    println!("  Score:        {}", score_color.bold());
    println!("  Rows:         {}", report.row_count());
    println!("  Completeness: {:.1}%", report.completeness() * 100.0);
    println!("  Conformance:  {:.1}%", report.conformance() * 100.0);
    println!("  Uniqueness:   {:.1}%", report.uniqueness() * 100.0);
    println!("  Duplicates:   {}", report.duplicate_count());

    if !report.issues().is_empty() {
        println!();
        println!("{}", "Issues:".yellow().bold());
        for issue in report.issues() {
            let label = match issue.severity {
                Severity::Error => issue.severity.label().red().bold(),
                Severity::Warning => issue.severity.label().yellow(),
            };
            println!("  [{}] {}: {}", label, issue.kind.label(), issue.message);
        }
    }

    println!();
    println!("{} {}", "→".cyan(), report.recommendation());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_table_and_default_name() {
        let mut file = NamedTempFile::with_suffix(".tsv").unwrap();
        file.write_all("市场\t销售额\nRX\t1\n".as_bytes()).unwrap();

        let (table, source) = read_table(file.path(), None).unwrap();
        assert_eq!(table.row_count(), 1);
        assert_eq!(source.format, "tsv");

        let stem = file.path().file_stem().unwrap().to_string_lossy().into_owned();
        assert_eq!(dataset_name(None, &source), stem);
        assert_eq!(dataset_name(Some("q1".into()), &source), "q1");
        assert_eq!(dataset_name(Some(" ".into()), &source), stem);
    }

    #[test]
    fn test_non_ascii_delimiter_rejected() {
        let file = NamedTempFile::new().unwrap();
        assert!(read_table(file.path(), Some('，')).is_err());
    }
}
