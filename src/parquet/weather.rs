use std::{path::Path, sync::Arc};

use anyhow::Result;
use arrow::array::{ArrayRef, Date32Array, Float64Array};

use crate::openmeteo::DailyWeather;

use super::{date32, write_columns};

/// Saves a `date` column and one nullable Float64 column per weather variable.
pub fn save_weather(weather: &DailyWeather, file_path: &Path) -> Result<()> {
    let dates: Vec<i32> = weather.dates.iter().map(|d| date32(*d)).collect();

    let mut columns: Vec<(&str, ArrayRef)> = vec![("date", Arc::new(Date32Array::from(dates)) as ArrayRef)];
    for (variable, values) in &weather.variables {
        columns.push((
            variable.as_str(),
            Arc::new(Float64Array::from(values.clone())) as ArrayRef,
        ));
    }

    write_columns(columns, file_path)
}

// -- Tests -------------------------------------------------------------------
