//! Burned area per ignition date.

use anyhow::Result;
use chrono::NaiveDate;
use log::warn;

use crate::{
    dates::DateWindow,
    mtbs::{query_by_region_and_date, BoundingBox, FeatureSource, FieldMap, FireEvent},
};

#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesRow {
    pub date: NaiveDate,
    pub burned_area_acres: f64,
}

impl TimeSeriesRow {
    pub fn from_event(event: &FireEvent) -> Result<Self> {
        Ok(TimeSeriesRow {
            date: event.ignition_date()?,
            burned_area_acres: event.area_acres.max(0.0),
        })
    }
}

/// Ignition date and burned area of every event in `bbox` and `window`, oldest first.
/// Events igniting on the same day keep the order the query returned them in.
pub async fn build_time_series<S: FeatureSource>(
    source: &S,
    fields: &FieldMap,
    bbox: &BoundingBox,
    window: &DateWindow,
) -> Result<Vec<TimeSeriesRow>> {
    let events = query_by_region_and_date(source, fields, bbox, window).await?;
    Ok(to_rows(&events))
}

fn to_rows(events: &[FireEvent]) -> Vec<TimeSeriesRow> {
    let mut rows: Vec<TimeSeriesRow> = events
        .iter()
        .filter_map(|event| match TimeSeriesRow::from_event(event) {
            Ok(row) => Some(row),
            Err(e) => {
                warn!("Skipping {}: {}", event.event_id, e);
                None
            }
        })
        .collect();

    rows.sort_by_key(|row| row.date);
    rows
}

// -- Tests -------------------------------------------------------------------
