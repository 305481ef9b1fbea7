//! Report command - show the latest quality report of a dataset.

use colored::Colorize;

use super::{CommandResult, Lake, LakeArgs, print_report};

pub fn run(args: &LakeArgs, dataset: &str, json_output: bool) -> CommandResult {
    let lake = Lake::open(args)?;

    let Some(report) = lake.pipeline.latest_quality_report(&lake.lineage, dataset)? else {
        return Err(format!(
            "No quality report for '{}'\nRun 'medallion clean {}' first.",
            dataset, dataset
        )
        .into());
    };

    if json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{} {} {}",
        "Quality report for".cyan().bold(),
        dataset.white().bold(),
        format!("({})", report.assessed_at().format("%Y-%m-%d %H:%M UTC")).dimmed()
    );
    println!();
    print_report(&report);
    Ok(())
}
