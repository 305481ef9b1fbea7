//! Purge command - delete every layer of a dataset.

use colored::Colorize;

use super::{CommandResult, Lake, LakeArgs};

pub fn run(args: &LakeArgs, dataset: &str) -> CommandResult {
    let mut lake = Lake::open(args)?;

    let status = lake.pipeline.status(&lake.store, dataset);
    if status.state == medallion::PipelineState::Absent {
        return Err(format!("Dataset '{}' has no stored layers", dataset).into());
    }

    lake.pipeline.purge(&mut lake.store, dataset)?;

    println!(
        "{} Purged {} (lineage history kept)",
        "✓".green().bold(),
        dataset.white().bold()
    );
    Ok(())
}
