//! Command line interface.

pub mod command;

use std::{path::PathBuf, time::Duration};

use clap::{command, Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    download::Dataset,
    mtbs::{BoundingBox, Schema},
    openmeteo::{DEFAULT_MODEL, DEFAULT_TIMEZONE},
    series::AreaUnit,
};

#[derive(Parser)]
#[command(version, about, long_about = None)]
/// Contains the commands
pub struct Cli {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Directory results are saved to [default: home directory]
    #[arg(long, global = true, env = "MTBS_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone)]
/// Where burned area boundaries are queried.
pub struct SourceArgs {
    /// GeoJSON export of the boundaries collection, queried instead of Earth Engine
    #[arg(long, global = true)]
    pub geojson: Option<PathBuf>,

    /// Earth Engine cloud project
    #[arg(long, global = true, env = "EE_PROJECT")]
    pub project: Option<String>,

    /// Earth Engine credentials file [default: ~/.config/earthengine/credentials]
    #[arg(long, global = true, env = "EE_CREDENTIALS")]
    pub credentials: Option<PathBuf>,

    /// OAuth access token, used instead of the credentials file
    #[arg(long, global = true, env = "EE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Property names of the boundary records
    #[arg(long, global = true, value_enum, default_value_t = Schema::Mtbs)]
    pub schema: Schema,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Get burned area boundaries in a region and date range as GeoJSON
    Boundaries {
        /// min_lon,min_lat,max_lon,max_lat
        #[arg(long, allow_hyphen_values = true)]
        bbox: BoundingBox,
        /// First ignition date, YYYY-MM-DD
        #[arg(long)]
        start: String,
        /// Last ignition date, YYYY-MM-DD
        #[arg(long)]
        end: String,
    },
    /// Get a single fire by its event identifier
    Event {
        event_id: String,
    },
    /// Find fires by incident name, or by name or ignition date
    Search {
        /// Exact incident name
        #[arg(long)]
        name: String,
        /// Ignition date, YYYY-MM-DD HH:MM:SS; matches fires with this name OR this date
        #[arg(long)]
        date: Option<String>,
    },
    /// Get burned area per ignition date and its seasonal summary
    Seasons {
        /// min_lon,min_lat,max_lon,max_lat
        #[arg(long, allow_hyphen_values = true)]
        bbox: BoundingBox,
        /// First ignition date, YYYY-MM-DD
        #[arg(long)]
        start: String,
        /// Last ignition date, YYYY-MM-DD
        #[arg(long)]
        end: String,
        /// Unit of the summed burned area
        #[arg(long, value_enum, default_value_t = AreaUnit::Acres)]
        unit: AreaUnit,
    },
    /// Get daily weather at a location
    Weather(WeatherArgs),
    /// Download MTBS or USGS fire files from object storage
    Fetch {
        #[arg(value_enum)]
        dataset: Dataset,
        /// File name, or file name prefix, under the dataset prefix
        file_name: String,
        /// Local cache directory [default: ./data]
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// S3 compatible endpoint [default: AWS]
        #[arg(long, env = "MTBS_S3_ENDPOINT")]
        endpoint: Option<String>,
        #[arg(long, env = "MTBS_S3_REGION", default_value = "us-east-1")]
        region: String,
    },
    /// Count wildfires per state from an MTBS parquet table
    States {
        parquet: PathBuf,
    },
}

#[derive(Args, Debug, Clone)]
pub struct WeatherArgs {
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,
    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,
    /// First day, YYYY-MM-DD
    #[arg(long, requires = "end", conflicts_with = "around")]
    pub start: Option<String>,
    /// Last day, YYYY-MM-DD
    #[arg(long, requires = "start")]
    pub end: Option<String>,
    /// Event date, YYYY-MM-DD HH:MM:SS, to derive the window from
    #[arg(long, required_unless_present = "start")]
    pub around: Option<String>,
    /// Window derived from `--around`
    #[arg(long, value_enum, default_value_t = WindowKind::Event)]
    pub window: WindowKind,
    /// Days either side of the event for `--window event`
    #[arg(long, default_value_t = 10)]
    pub days: i64,
    /// Daily variables
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "temperature_2m_max,temperature_2m_min,precipitation_sum,wind_speed_10m_max"
    )]
    pub variables: Vec<String>,
    #[arg(long, default_value = DEFAULT_TIMEZONE)]
    pub timezone: String,
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,
    /// Always query the API instead of the response cache
    #[arg(long)]
    pub no_cache: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WindowKind {
    /// `--days` either side of the event
    Event,
    /// The calendar month of the event
    Month,
}

/// Creates a spinner.
pub fn create_spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner().with_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));

    bar
}

/// Creates a progress bar.
pub fn create_progress_bar(size: u64, message: String) -> ProgressBar {
    ProgressBar::new(size).with_message(message).with_style(
        ProgressStyle::with_template("[{eta_precise}] {bar:40.cyan/blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    )
}

// -- Tests -------------------------------------------------------------------
