//! Show command - print rows of a stored layer.

use colored::Colorize;
use medallion::{DataTable, Layer, LayerStore};
use serde::Serialize;

use super::{CommandResult, Lake, LakeArgs};

/// JSON shape of `show --json`.
#[derive(Serialize)]
struct LayerPreview<'a> {
    dataset: &'a str,
    layer: Layer,
    total_rows: usize,
    columns: Vec<&'a str>,
    rows: &'a [Vec<medallion::Value>],
}

pub fn run(
    args: &LakeArgs,
    dataset: &str,
    layer: Layer,
    limit: usize,
    json_output: bool,
) -> CommandResult {
    let lake = Lake::open(args)?;
    let table = lake.store.get(dataset, layer)?;
    let shown = limit.min(table.row_count());

    if json_output {
        let preview = LayerPreview {
            dataset,
            layer,
            total_rows: table.row_count(),
            columns: table.column_names(),
            rows: &table.rows[..shown],
        };
        println!("{}", serde_json::to_string_pretty(&preview)?);
        return Ok(());
    }

    println!(
        "{} {} {}",
        dataset.white().bold(),
        layer.to_string().cyan(),
        format!("({} rows, {} columns)", table.row_count(), table.column_count()).dimmed()
    );
    println!();

    let widths = column_widths(&table, shown);
    let header: Vec<String> = table
        .columns
        .iter()
        .zip(&widths)
        .map(|(column, width)| pad(&column.name, *width))
        .collect();
    println!("  {}", header.join("  ").yellow().bold());

    for row in &table.rows[..shown] {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(value, width)| pad(&value.to_string(), *width))
            .collect();
        println!("  {}", cells.join("  "));
    }

    if table.row_count() > shown {
        println!();
        println!("  ... {} more row(s)", table.row_count() - shown);
    }

    Ok(())
}

/// Display width per column over the header and the printed rows.
fn column_widths(table: &DataTable, shown: usize) -> Vec<usize> {
    table
        .columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            table.rows[..shown]
                .iter()
                .filter_map(|row| row.get(i))
                .map(|value| value.to_string().chars().count())
                .chain(std::iter::once(column.name.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect()
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    format!("{}{}", text, " ".repeat(width.saturating_sub(len)))
}
