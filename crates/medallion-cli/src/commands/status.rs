//! Status command - show which layers exist per dataset.

use colored::{ColoredString, Colorize};
use medallion::{DatasetStatus, Layer, LayerStore, PipelineState};

use super::{CommandResult, Lake, LakeArgs};

pub fn run(args: &LakeArgs, dataset: Option<String>, json_output: bool) -> CommandResult {
    let lake = Lake::open(args)?;

    let names = match dataset {
        Some(name) => vec![name],
        None => lake.store.datasets()?,
    };
    let statuses: Vec<DatasetStatus> = names
        .iter()
        .map(|name| lake.pipeline.status(&lake.store, name))
        .collect();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&statuses)?);
        return Ok(());
    }

    if statuses.is_empty() {
        println!("No datasets in {}", args.root.display());
        return Ok(());
    }

    println!("{} {}", "Lake".cyan().bold(), args.root.display().to_string().white());
    println!();
    println!(
        "  {:<24} {:<8} {:<8} {:<8} {}",
        "DATASET", "BRONZE", "SILVER", "GOLD", "STATE"
    );
    for status in &statuses {
        println!(
            "  {:<24} {:<8} {:<8} {:<8} {}",
            status.dataset,
            mark(status, Layer::Bronze),
            mark(status, Layer::Silver),
            mark(status, Layer::Gold),
            state_label(status.state)
        );
    }

    Ok(())
}

fn mark(status: &DatasetStatus, layer: Layer) -> ColoredString {
    if status.has(layer) {
        "✓".green()
    } else {
        "·".dimmed()
    }
}

fn state_label(state: PipelineState) -> ColoredString {
    match state {
        PipelineState::Absent => state.label().dimmed(),
        PipelineState::Bronze => state.label().yellow(),
        PipelineState::Silver => state.label().white(),
        PipelineState::Gold => state.label().green().bold(),
    }
}
