use std::path::{Path, PathBuf};

use anyhow::Result;
use log::{info, warn};

use crate::{
    cli::{create_spinner, WeatherArgs, WindowKind},
    dates::{event_window, month_window, DateWindow},
    openmeteo::{default_cache_dir, OpenMeteo, WeatherRequest},
    parquet,
};

use super::make_output_file_name;

/// Saves the daily weather at the location over the requested window.
pub async fn weather(args: &WeatherArgs, output_dir: Option<&Path>) -> Result<Vec<PathBuf>> {
    let request = WeatherRequest {
        latitude: args.lat,
        longitude: args.lon,
        window: window(args)?,
        variables: args.variables.clone(),
        timezone: args.timezone.clone(),
        model: Some(args.model.clone()),
    };
    let cache_dir = if args.no_cache {
        None
    } else {
        default_cache_dir()
    };

    let bar = create_spinner(format!("Fetching weather {}...", request.window));
    let client = OpenMeteo::new(cache_dir);
    let weather = client.fetch_daily(&request).await?;
    bar.finish_with_message(format!("{} days of weather", weather.len()));
    if weather.is_empty() {
        warn!("Open-Meteo returned no days for {}", request.window);
    }
    info!(
        "Weather at ({}, {}) for {}",
        request.latitude, request.longitude, request.window
    );

    let file_path = make_output_file_name(output_dir, "weather", "parquet")?;
    parquet::save_weather(&weather, &file_path)?;

    Ok(vec![file_path])
}

fn window(args: &WeatherArgs) -> Result<DateWindow> {
    let window = match (&args.start, &args.end, &args.around) {
        (Some(start), Some(end), _) => DateWindow::parse(start, end)?,
        (_, _, Some(around)) => match args.window {
            WindowKind::Event => event_window(around, args.days)?,
            WindowKind::Month => month_window(around)?,
        },
        _ => anyhow::bail!("Give either --start and --end, or --around"),
    };
    Ok(window)
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::{Cli, Commands};

    fn weather_args(extra: &[&str]) -> WeatherArgs {
        let mut argv = vec!["mtbs", "weather", "--lat", "39.8", "--lon", "-121.4"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Weather(args) => args,
            _ => panic!("expected weather"),
        }
    }

    #[test]
    fn should_use_explicit_window() {
        let args = weather_args(&["--start", "2021-07-01", "--end", "2021-07-31"]);
        assert_eq!(window(&args).unwrap().to_string(), "2021-07-01 to 2021-07-31");
    }

    #[test]
    fn should_derive_event_window() {
        let args = weather_args(&["--around", "2021-07-13 00:00:00", "--days", "5"]);
        assert_eq!(window(&args).unwrap().to_string(), "2021-07-08 to 2021-07-18");
    }

    #[test]
    fn should_derive_month_window() {
        let args = weather_args(&["--around", "2024-02-15 12:00:00", "--window", "month"]);
        assert_eq!(window(&args).unwrap().to_string(), "2024-02-01 to 2024-02-29");
    }
}
