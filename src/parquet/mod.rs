//! Handles serialising tables to, and reading fire events from, the _parquet_ file
//! format.

pub mod events;
pub mod seasons;
pub mod timeseries;
pub mod weather;

use std::{fs::File, path::Path};

use anyhow::Result;
use arrow::array::{ArrayRef, RecordBatch};
use chrono::{Datelike, NaiveDate};
use parquet::{
    arrow::ArrowWriter,
    basic::{Compression, ZstdLevel},
    file::properties::WriterProperties,
};

pub use events::read_events;
pub use seasons::save_seasons;
pub use timeseries::save_time_series;
pub use weather::save_weather;

// `NaiveDate::num_days_from_ce` of 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Days since the Unix epoch, the physical value of an arrow `Date32`.
pub fn date32(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

/// Writes the columns as a single record batch.
fn write_columns(columns: Vec<(&str, ArrayRef)>, file_path: &Path) -> Result<()> {
    let batch = RecordBatch::try_from_iter(columns)?;

    let file = File::create(file_path)?;
    let props = WriterProperties::builder()
        .set_compression(Compression::ZSTD(ZstdLevel::default()))
        .build();

    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    Ok(())
}

// -- Tests -------------------------------------------------------------------
