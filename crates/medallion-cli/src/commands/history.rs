//! History command - print the lineage log of a dataset.

use chrono::Local;
use colored::Colorize;
use medallion::LineageRecorder;

use super::{CommandResult, Lake, LakeArgs};

pub fn run(args: &LakeArgs, dataset: &str, json_output: bool) -> CommandResult {
    let lake = Lake::open(args)?;
    let entries = lake.lineage.history(dataset)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        return Err(format!(
            "No lineage recorded for '{}'\nRun 'medallion ingest <FILE> --name {}' first.",
            dataset, dataset
        )
        .into());
    }

    println!("{} {}", "Lineage for".cyan().bold(), dataset.white().bold());
    println!();

    for entry in &entries {
        let source = entry
            .source()
            .map(|layer| layer.to_string())
            .unwrap_or_else(|| "raw".to_string());
        let timestamp = entry.timestamp().with_timezone(&Local);

        println!(
            "  {} {}  {} → {}  {} -> {} rows",
            format!("#{}", entry.sequence()).dimmed(),
            timestamp.format("%Y-%m-%d %H:%M:%S"),
            source,
            entry.target().to_string().cyan(),
            entry.rows_before(),
            entry.rows_after()
        );
        println!("     {}", entry.description());
        for step in entry.steps() {
            println!("       - {}", step);
        }
        if let Some(report) = entry.quality() {
            println!("       quality score {:.1}", report.score());
        }
    }

    Ok(())
}
