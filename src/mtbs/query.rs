//! Read-only queries over the burned-area boundary collection.

use anyhow::Result;
use log::{info, warn};

use super::{BoundingBox, FeatureSource, FieldMap, Filter, FireEvent, BOUNDARIES_COLLECTION};
use crate::dates::{datetime_to_unix, DateWindow};

/// Events intersecting `bbox` whose ignition date lies in the closed window.
pub async fn query_by_region_and_date<S: FeatureSource>(
    source: &S,
    fields: &FieldMap,
    bbox: &BoundingBox,
    window: &DateWindow,
) -> Result<Vec<FireEvent>> {
    let (start_ms, end_ms) = window.millis();
    let filter = Filter::And(vec![
        Filter::Bounds(*bbox),
        Filter::range_contains(fields.ignition_date, start_ms, end_ms),
    ]);

    let events = run(source, fields, &filter).await?;
    info!(
        "Found {} burned area boundaries in {} ({})",
        events.len(),
        bbox,
        window
    );

    Ok(events)
}

/// The event with this identifier, or `None` when nothing matches.
pub async fn query_by_event_id<S: FeatureSource>(
    source: &S,
    fields: &FieldMap,
    event_id: &str,
) -> Result<Option<FireEvent>> {
    let filter = Filter::equals(fields.event_id, event_id);
    let event = run(source, fields, &filter).await?.into_iter().next();

    match &event {
        Some(_) => info!("Found feature with {}: {}", fields.event_id, event_id),
        None => info!("No feature found with {}: {}", fields.event_id, event_id),
    }

    Ok(event)
}

/// The first event with this incident name, or `None` when nothing matches.
pub async fn query_by_name<S: FeatureSource>(
    source: &S,
    fields: &FieldMap,
    name: &str,
) -> Result<Option<FireEvent>> {
    let filter = Filter::equals(fields.name, name);
    let event = run(source, fields, &filter).await?.into_iter().next();

    if event.is_none() {
        info!("No feature found with {}: {}", fields.name, name);
    }

    Ok(event)
}

/// Events matching the incident name OR igniting at exactly `event_date`
/// (`YYYY-MM-DD HH:MM:SS`). Unrelated fires sharing the timestamp also match.
pub async fn query_by_name_or_window<S: FeatureSource>(
    source: &S,
    fields: &FieldMap,
    name: &str,
    event_date: &str,
) -> Result<Vec<FireEvent>> {
    let ignition_ms = datetime_to_unix(event_date)?;
    let filter = Filter::Or(vec![
        Filter::equals(fields.name, name),
        Filter::equals(fields.ignition_date, ignition_ms),
    ]);

    let events = run(source, fields, &filter).await?;
    let unrelated = events
        .iter()
        .filter(|e| e.name.as_deref() != Some(name))
        .count();
    if unrelated > 0 {
        warn!(
            "{} of the matches share only the ignition time with `{}`",
            unrelated, name
        );
    }

    if events.is_empty() {
        info!(
            "No feature found with {}: {} or {}: {}",
            fields.name, name, fields.ignition_date, ignition_ms
        );
    } else {
        info!(
            "Found {} features with {}: {} or {}: {}",
            events.len(),
            fields.name,
            name,
            fields.ignition_date,
            ignition_ms
        );
    }

    Ok(events)
}

async fn run<S: FeatureSource>(source: &S, fields: &FieldMap, filter: &Filter) -> Result<Vec<FireEvent>> {
    let features = source.features(BOUNDARIES_COLLECTION, filter).await?;

    let mut events = Vec::with_capacity(features.len());
    for feature in &features {
        match FireEvent::from_feature(feature, fields) {
            Ok(event) => events.push(event),
            Err(e) => warn!("Skipping feature: {}", e),
        }
    }

    Ok(events)
}

// -- Tests -------------------------------------------------------------------
