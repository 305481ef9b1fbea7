//! Medallion CLI - layered ETL over a local lake directory.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let lake = commands::LakeArgs {
        root: cli.lake,
        config: cli.config,
    };

    let result = match cli.command {
        Commands::Ingest {
            file,
            name,
            delimiter,
        } => commands::ingest::run(&lake, file, name, delimiter),

        Commands::Clean { dataset, json } => commands::clean::run(&lake, &dataset, json),

        Commands::Enrich { dataset, rules } => commands::enrich::run(&lake, &dataset, rules),

        Commands::Run {
            file,
            name,
            delimiter,
            json,
        } => commands::run::run(&lake, file, name, delimiter, json),

        Commands::Status { dataset, json } => commands::status::run(&lake, dataset, json),

        Commands::History { dataset, json } => commands::history::run(&lake, &dataset, json),

        Commands::Report { dataset, json } => commands::report::run(&lake, &dataset, json),

        Commands::Show {
            dataset,
            layer,
            limit,
            json,
        } => commands::show::run(&lake, &dataset, layer.into(), limit, json),

        Commands::Dictionary { dataset, json } => {
            commands::dictionary::run(&lake, &dataset, json)
        }

        Commands::Purge { dataset } => commands::purge::run(&lake, &dataset),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
