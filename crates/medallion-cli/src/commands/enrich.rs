//! Enrich command - apply business rules to silver to produce gold.

use colored::Colorize;

use super::{CommandResult, Lake, LakeArgs};

pub fn run(args: &LakeArgs, dataset: &str, rules: Vec<String>) -> CommandResult {
    let mut lake = Lake::open(args)?;

    let entry = if rules.is_empty() {
        lake.pipeline
            .enrich_configured(&mut lake.store, &mut lake.lineage, dataset)?
    } else {
        let resolved = lake.pipeline.rules().resolve(&rules)?;
        lake.pipeline
            .enrich(&mut lake.store, &mut lake.lineage, dataset, &resolved)?
    };

    println!(
        "{} Enriched {} into {} ({} -> {} rows)",
        "✓".green().bold(),
        dataset.white().bold(),
        "gold".cyan(),
        entry.rows_before(),
        entry.rows_after()
    );
    if entry.steps().is_empty() {
        println!("  No rules applied; gold is a copy of silver");
    }
    for (i, rule) in entry.steps().iter().enumerate() {
        println!("  {}. {}", i + 1, rule);
    }

    Ok(())
}
