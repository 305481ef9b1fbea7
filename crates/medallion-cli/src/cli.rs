//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Medallion: layered bronze/silver/gold ETL for market spreadsheets
#[derive(Parser)]
#[command(name = "medallion")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Lake directory holding layer tables and the lineage log
    #[arg(long, global = true, default_value = ".medallion", env = "MEDALLION_LAKE")]
    pub lake: PathBuf,

    /// Pipeline configuration file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read a CSV/TSV file into the bronze layer
    Ingest {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Dataset name (default: file stem)
        #[arg(short, long)]
        name: Option<String>,

        /// Field delimiter (default: auto-detect)
        #[arg(short, long)]
        delimiter: Option<char>,
    },

    /// Normalize and score bronze into silver
    Clean {
        /// Dataset name
        #[arg(value_name = "DATASET")]
        dataset: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Apply business rules to silver to produce gold
    Enrich {
        /// Dataset name
        #[arg(value_name = "DATASET")]
        dataset: String,

        /// Rule to apply, in order (default: rules from configuration)
        #[arg(short, long = "rule", value_name = "RULE")]
        rules: Vec<String>,
    },

    /// Ingest, clean and enrich a file in one go
    Run {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Dataset name (default: file stem)
        #[arg(short, long)]
        name: Option<String>,

        /// Field delimiter (default: auto-detect)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show which layers exist (all datasets when none is given)
    Status {
        /// Dataset name
        #[arg(value_name = "DATASET")]
        dataset: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the lineage history of a dataset
    History {
        /// Dataset name
        #[arg(value_name = "DATASET")]
        dataset: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the latest quality report of a dataset
    Report {
        /// Dataset name
        #[arg(value_name = "DATASET")]
        dataset: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print rows of a stored layer
    Show {
        /// Dataset name
        #[arg(value_name = "DATASET")]
        dataset: String,

        /// Layer to print
        #[arg(short, long, default_value = "gold")]
        layer: LayerChoice,

        /// Maximum rows to print
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Profile the columns of every stored layer
    Dictionary {
        /// Dataset name
        #[arg(value_name = "DATASET")]
        dataset: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete all layers of a dataset (lineage is kept)
    Purge {
        /// Dataset name
        #[arg(value_name = "DATASET")]
        dataset: String,
    },
}

/// Layer selection for `show`.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LayerChoice {
    Bronze,
    Silver,
    Gold,
}

impl From<LayerChoice> for medallion::Layer {
    fn from(choice: LayerChoice) -> Self {
        match choice {
            LayerChoice::Bronze => medallion::Layer::Bronze,
            LayerChoice::Silver => medallion::Layer::Silver,
            LayerChoice::Gold => medallion::Layer::Gold,
        }
    }
}
