mod cli;
mod dates;
mod download;
mod mtbs;
mod openmeteo;
mod parquet;
mod series;
mod states;
mod style;
#[cfg(test)]
mod test_server;

use std::path::PathBuf;

use anyhow::{Error, Result};
use clap::Parser;
use cli::{command, Cli, Commands};
use env_logger::Env;

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let output_dir = cli.output_dir.as_deref();
    let source = &cli.source;

    let result = match &cli.command {
        Commands::Boundaries { bbox, start, end } => {
            command::boundaries(source, output_dir, bbox, start, end).await
        }
        Commands::Event { event_id } => command::event(source, output_dir, event_id).await,
        Commands::Search { name, date } => {
            command::search(source, output_dir, name, date.as_deref()).await
        }
        Commands::Seasons {
            bbox,
            start,
            end,
            unit,
        } => command::seasons(source, output_dir, bbox, start, end, *unit).await,
        Commands::Weather(args) => command::weather(args, output_dir).await,
        Commands::Fetch {
            dataset,
            file_name,
            data_dir,
            endpoint,
            region,
        } => {
            command::fetch(
                *dataset,
                file_name,
                data_dir.as_deref(),
                endpoint.as_deref(),
                region,
            )
            .await
        }
        Commands::States { parquet } => command::states(source, output_dir, parquet),
    };

    report(result);

    Ok(())
}

fn report(result: Result<Vec<PathBuf>>) {
    match result {
        Ok(paths) => {
            for path in paths {
                println!("File saved to `{}`", path.display());
            }
        }
        Err(e) => eprintln!("Error: {}", e),
    }
}
