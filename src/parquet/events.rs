//! Reads MTBS fire event tables exported to parquet. Columns are looked up by the
//! names of a [`FieldMap`] and cast, so ignition dates may be stored as dates,
//! timestamps, millisecond integers or ISO strings.

use std::{fs::File, path::Path};

use anyhow::{anyhow, Result};
use arrow::{
    array::{Array, ArrayRef, AsArray, RecordBatch},
    compute::cast,
    datatypes::{DataType, Float64Type, TimeUnit, TimestampMillisecondType},
};
use log::{info, warn};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::{Map, Value};

use crate::{
    cli::create_progress_bar,
    mtbs::{Feature, FieldMap, FireEvent},
};

pub fn read_events(file_path: &Path, fields: &FieldMap) -> Result<Vec<FireEvent>> {
    let file = File::open(file_path)
        .map_err(|e| anyhow!("Cannot open `{}`: {}", file_path.display(), e))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let total_rows = builder.metadata().file_metadata().num_rows().max(0) as u64;
    let reader = builder.build()?;

    let pb = create_progress_bar(total_rows, "Reading events".to_string());
    let mut events = Vec::with_capacity(total_rows as usize);
    for batch in reader {
        let batch = batch?;
        events.extend(batch_events(&batch, fields)?);
        pb.inc(batch.num_rows() as u64);
    }
    pb.finish_with_message("Events read");

    info!("Read {} events from {}", events.len(), file_path.display());
    Ok(events)
}

fn batch_events(batch: &RecordBatch, fields: &FieldMap) -> Result<Vec<FireEvent>> {
    let timestamp = DataType::Timestamp(TimeUnit::Millisecond, None);

    let ids = column(batch, fields.event_id, &DataType::Utf8)?
        .ok_or_else(|| anyhow!("Missing column `{}`", fields.event_id))?;
    let dates = column(batch, fields.ignition_date, &timestamp)?
        .ok_or_else(|| anyhow!("Missing column `{}`", fields.ignition_date))?;
    let names = column(batch, fields.name, &DataType::Utf8)?;
    let types = column(batch, fields.incident_type, &DataType::Utf8)?;
    let areas = column(batch, fields.area, &DataType::Float64)?;

    let ids = ids.as_string::<i32>();
    let dates = dates.as_primitive::<TimestampMillisecondType>();
    let names = names.as_ref().map(|a| a.as_string::<i32>());
    let types = types.as_ref().map(|a| a.as_string::<i32>());
    let areas = areas.as_ref().map(|a| a.as_primitive::<Float64Type>());

    let mut events = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        let mut properties = Map::new();
        if ids.is_valid(row) {
            properties.insert(fields.event_id.to_string(), ids.value(row).into());
        }
        if dates.is_valid(row) {
            properties.insert(fields.ignition_date.to_string(), dates.value(row).into());
        }
        if let Some(names) = names.filter(|a| a.is_valid(row)) {
            properties.insert(fields.name.to_string(), names.value(row).into());
        }
        if let Some(types) = types.filter(|a| a.is_valid(row)) {
            properties.insert(fields.incident_type.to_string(), types.value(row).into());
        }
        if let Some(areas) = areas.filter(|a| a.is_valid(row)) {
            properties.insert(fields.area.to_string(), Value::from(areas.value(row)));
        }

        let feature = Feature {
            geometry: None,
            properties,
        };
        match FireEvent::from_feature(&feature, fields) {
            Ok(event) => events.push(event),
            Err(e) => warn!("Skipping row {}: {}", row, e),
        }
    }

    Ok(events)
}

/// The named column cast to `data_type`, or `None` when the batch has no such column.
fn column(batch: &RecordBatch, name: &str, data_type: &DataType) -> Result<Option<ArrayRef>> {
    match batch.column_by_name(name) {
        Some(array) => Ok(Some(cast(array, data_type).map_err(|e| {
            anyhow!("Column `{}` cannot be read as {}: {}", name, data_type, e)
        })?)),
        None => Ok(None),
    }
}

// -- Tests -------------------------------------------------------------------
