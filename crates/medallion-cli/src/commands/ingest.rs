//! Ingest command - read a file into the bronze layer.

use std::path::PathBuf;

use colored::Colorize;

use super::{CommandResult, Lake, LakeArgs, dataset_name, read_table};

pub fn run(
    args: &LakeArgs,
    file: PathBuf,
    name: Option<String>,
    delimiter: Option<char>,
) -> CommandResult {
    let mut lake = Lake::open(args)?;
    let (raw, source) = read_table(&file, delimiter)?;
    let dataset = dataset_name(name, &source);

    let entry = lake
        .pipeline
        .ingest(&mut lake.store, &mut lake.lineage, &dataset, raw)?;

    println!(
        "{} Ingested {} into {} ({} rows, {} columns)",
        "✓".green().bold(),
        dataset.white().bold(),
        "bronze".cyan(),
        entry.rows_after(),
        source.column_count
    );
    println!("  Source: {} ({}, {})", source.file, source.format, source.hash);
    println!();
    println!("Next: medallion clean {}", dataset);

    Ok(())
}
