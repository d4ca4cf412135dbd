use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::{
    cli::{create_spinner, SourceArgs},
    dates::{unix_to_date, DateWindow},
    mtbs::{
        query_by_event_id, query_by_name, query_by_name_or_window, query_by_region_and_date,
        BoundingBox, FireEvent,
    },
    style::{boundary_layer, Style},
};

use super::{field_map, make_output_file_name, open_source, save_json};

const REGION_WIDTH: f64 = 1.0;
const EVENT_WIDTH: f64 = 2.0;

/// Saves the boundaries in `bbox` igniting between `start` and `end` as GeoJSON.
pub async fn boundaries(
    args: &SourceArgs,
    output_dir: Option<&Path>,
    bbox: &BoundingBox,
    start: &str,
    end: &str,
) -> Result<Vec<PathBuf>> {
    let window = DateWindow::parse(start, end)?;
    let source = open_source(args).await?;

    let bar = create_spinner(format!("Querying burned areas {}...", window));
    let events = query_by_region_and_date(&source, &field_map(args), bbox, &window).await?;
    bar.finish_with_message(format!("{} burned areas found", events.len()));

    let file_path = make_output_file_name(output_dir, "boundaries", "geojson")?;
    let layer = boundary_layer(
        &format!("Burned areas {}", window),
        &events,
        &Style::boundary(REGION_WIDTH),
    )?;
    save_json(&layer, &file_path)?;

    Ok(vec![file_path])
}

/// Prints the fire with `event_id` and saves its boundary. Nothing is saved when it
/// does not exist.
pub async fn event(args: &SourceArgs, output_dir: Option<&Path>, event_id: &str) -> Result<Vec<PathBuf>> {
    let source = open_source(args).await?;

    let Some(event) = query_by_event_id(&source, &field_map(args), event_id).await? else {
        return Ok(vec![]);
    };
    print_event(&event);

    save_events(output_dir, &format!("event-{}", event.event_id), &[event])
}

/// Prints and saves the fire named `name`, or when `date` is given every fire named
/// `name` or igniting at `date`.
pub async fn search(
    args: &SourceArgs,
    output_dir: Option<&Path>,
    name: &str,
    date: Option<&str>,
) -> Result<Vec<PathBuf>> {
    let source = open_source(args).await?;
    let fields = field_map(args);

    let events = match date {
        Some(date) => query_by_name_or_window(&source, &fields, name, date).await?,
        None => query_by_name(&source, &fields, name).await?.into_iter().collect(),
    };
    if events.is_empty() {
        return Ok(vec![]);
    }

    for event in &events {
        print_event(event);
    }

    save_events(output_dir, "search", &events)
}

fn save_events(output_dir: Option<&Path>, kind: &str, events: &[FireEvent]) -> Result<Vec<PathBuf>> {
    let file_path = make_output_file_name(output_dir, kind, "geojson")?;
    let layer = boundary_layer(kind, events, &Style::boundary(EVENT_WIDTH))?;
    save_json(&layer, &file_path)?;

    Ok(vec![file_path])
}

fn print_event(event: &FireEvent) {
    let ignition = unix_to_date(event.ignition_ms).unwrap_or_else(|_| event.ignition_ms.to_string());
    println!(
        "{}  {}  {}  {}  {:.1} acres",
        event.event_id,
        event.name.as_deref().unwrap_or("-"),
        event.incident_type.as_deref().unwrap_or("-"),
        ignition,
        event.area_acres
    );
}

// -- Tests -------------------------------------------------------------------
