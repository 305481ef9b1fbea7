//! Run command - ingest, clean and enrich a file in one go.

use std::path::PathBuf;

use colored::Colorize;

use super::{CommandResult, Lake, LakeArgs, dataset_name, print_report, read_table};

pub fn run(
    args: &LakeArgs,
    file: PathBuf,
    name: Option<String>,
    delimiter: Option<char>,
    json_output: bool,
) -> CommandResult {
    let mut lake = Lake::open(args)?;
    let (raw, source) = read_table(&file, delimiter)?;
    let dataset = dataset_name(name, &source);

    let summary = lake
        .pipeline
        .run(&mut lake.store, &mut lake.lineage, &dataset, raw)?;

    if json_output {
        let output = serde_json::json!({
            "dataset": dataset,
            "source": source,
            "summary": summary,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{} {}", "Pipeline run for".cyan().bold(), dataset.white().bold());
    println!();
    for entry in [&summary.ingest, &summary.clean.lineage, &summary.enrich] {
        println!(
            "  {} {:<7} {} -> {} rows",
            "✓".green(),
            entry.target().to_string(),
            entry.rows_before(),
            entry.rows_after()
        );
    }
    if !summary.clean.unmapped_columns.is_empty() {
        println!(
            "  Unmapped columns: {}",
            summary.clean.unmapped_columns.join(", ").dimmed()
        );
    }
    println!();

    print_report(&summary.clean.report);
    Ok(())
}
