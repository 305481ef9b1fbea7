//! Clean command - normalize bronze into silver and score it.

use colored::Colorize;

use super::{CommandResult, Lake, LakeArgs, print_report};

pub fn run(args: &LakeArgs, dataset: &str, json_output: bool) -> CommandResult {
    let mut lake = Lake::open(args)?;
    let outcome = lake
        .pipeline
        .clean(&mut lake.store, &mut lake.lineage, dataset)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    println!(
        "{} Cleaned {} into {} ({} -> {} rows)",
        "✓".green().bold(),
        dataset.white().bold(),
        "silver".cyan(),
        outcome.lineage.rows_before(),
        outcome.lineage.rows_after()
    );
    println!();

    if !outcome.mappings.is_empty() {
        println!("{}", "Columns:".yellow().bold());
        for mapping in &outcome.mappings {
            println!("  {} → {}", mapping.source, mapping.field.to_string().green());
        }
    }
    for column in &outcome.unmapped_columns {
        println!("  {} {}", column, "(unmapped)".dimmed());
    }
    for rename in &outcome.renamed_columns {
        println!("  {} → {} {}", rename.source, rename.name, "(duplicate header)".dimmed());
    }
    for column in &outcome.dropped_columns {
        println!("  {} {}", column, "(dropped, empty)".dimmed());
    }
    if outcome.dropped_rows > 0 {
        println!("  Dropped {} empty row(s)", outcome.dropped_rows);
    }
    if !outcome.coercion_failures.is_empty() {
        println!(
            "  {} cell(s) could not be converted and were set to null",
            outcome.coercion_failures.len().to_string().yellow()
        );
    }
    println!();

    print_report(&outcome.report);
    Ok(())
}
