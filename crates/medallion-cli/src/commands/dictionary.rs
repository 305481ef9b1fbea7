//! Dictionary command - profile the columns of every stored layer.

use colored::Colorize;

use super::{CommandResult, Lake, LakeArgs};

pub fn run(args: &LakeArgs, dataset: &str, json_output: bool) -> CommandResult {
    let lake = Lake::open(args)?;
    let dictionary = medallion::data_dictionary(&lake.store, dataset)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&dictionary)?);
        return Ok(());
    }

    println!("{} {}", "Data dictionary for".cyan().bold(), dataset.white().bold());

    for profile in &dictionary.layers {
        println!();
        println!(
            "{} {}",
            format!("{}:", profile.layer).yellow().bold(),
            format!("{} rows", profile.row_count).dimmed()
        );
        for column in &profile.columns {
            println!(
                "  {:<24} {:<8} {:>6} non-null {:>6} null {:>6} distinct  {}",
                column.name,
                column.column_type.to_string(),
                column.non_null,
                column.null,
                column.distinct,
                column.samples.join(", ").dimmed()
            );
        }
    }

    Ok(())
}
