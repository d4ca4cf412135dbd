//! MTBS burned-area boundary records and the queries run against them.

pub mod earthengine;
pub mod filter;
pub mod query;
pub mod source;

use std::{fmt, str::FromStr};

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use clap::ValueEnum;
use geo::{coord, BoundingRect, Geometry, Intersects, Rect};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::dates::{date_to_unix, unix_to_naive_date};

pub use filter::Filter;
pub use query::{query_by_event_id, query_by_name, query_by_name_or_window, query_by_region_and_date};
pub use source::{FeatureSource, LocalFeatures, Source};

/// Earth Engine asset holding the burned-area boundary features.
pub const BOUNDARIES_COLLECTION: &str = "USFS/GTAC/MTBS/burned_area_boundaries/v1";

#[derive(Error, Debug, PartialEq)]
pub enum GeometryError {
    #[error("expected 4 comma separated values, found {0}")]
    Arity(usize),

    #[error("cannot parse `{0}` as a coordinate")]
    Coordinate(String),

    #[error("minimum exceeds maximum on the {0} axis")]
    Inverted(&'static str),

    #[error("coordinate {0} is not a finite number")]
    NotFinite(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// Query rectangle as `min_lon, min_lat, max_lon, max_lat`.
pub struct BoundingBox {
    rect: Rect<f64>,
}

impl BoundingBox {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Result<Self, GeometryError> {
        if let Some(v) = [min_lon, min_lat, max_lon, max_lat].into_iter().find(|v| !v.is_finite()) {
            return Err(GeometryError::NotFinite(v.to_string()));
        }
        if min_lon > max_lon {
            return Err(GeometryError::Inverted("longitude"));
        }
        if min_lat > max_lat {
            return Err(GeometryError::Inverted("latitude"));
        }
        Ok(BoundingBox {
            rect: Rect::new(coord! { x: min_lon, y: min_lat }, coord! { x: max_lon, y: max_lat }),
        })
    }

    pub fn min_lon(&self) -> f64 {
        self.rect.min().x
    }

    pub fn min_lat(&self) -> f64 {
        self.rect.min().y
    }

    pub fn max_lon(&self) -> f64 {
        self.rect.max().x
    }

    pub fn max_lat(&self) -> f64 {
        self.rect.max().y
    }

    pub fn rect(&self) -> &Rect<f64> {
        &self.rect
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.rect.intersects(&other.rect)
    }

    /// Closed polygon ring, counter-clockwise from the south-west corner.
    pub fn ring(&self) -> Vec<[f64; 2]> {
        let (min, max) = (self.rect.min(), self.rect.max());
        vec![
            [min.x, min.y],
            [max.x, min.y],
            [max.x, max.y],
            [min.x, max.y],
            [min.x, min.y],
        ]
    }

    /// Bounding rectangle of a geometry, `None` when it has no coordinates.
    pub fn envelope(geometry: &Geometry<f64>) -> Option<BoundingBox> {
        geometry.bounding_rect().map(BoundingBox::from)
    }
}

impl From<Rect<f64>> for BoundingBox {
    fn from(rect: Rect<f64>) -> Self {
        BoundingBox { rect }
    }
}

impl FromStr for BoundingBox {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(GeometryError::Arity(parts.len()));
        }
        let mut values = [0.0; 4];
        for (value, part) in values.iter_mut().zip(&parts) {
            *value = part
                .parse()
                .map_err(|_| GeometryError::Coordinate(part.to_string()))?;
        }
        BoundingBox::new(values[0], values[1], values[2], values[3])
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.min_lon(),
            self.min_lat(),
            self.max_lon(),
            self.max_lat()
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Schema {
    /// Current MTBS property names (`Event_ID`, `Incid_Name`, `Ig_Date`)
    Mtbs,
    /// Older exports (`EventID`, `FireName`, `BurnDate`)
    Legacy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Names of the properties carrying each fire event attribute.
pub struct FieldMap {
    pub event_id: &'static str,
    pub name: &'static str,
    pub incident_type: &'static str,
    pub ignition_date: &'static str,
    pub area: &'static str,
}

impl FieldMap {
    pub const MTBS: FieldMap = FieldMap {
        event_id: "Event_ID",
        name: "Incid_Name",
        incident_type: "Incid_Type",
        ignition_date: "Ig_Date",
        area: "BurnBndAc",
    };

    pub const LEGACY: FieldMap = FieldMap {
        event_id: "EventID",
        name: "FireName",
        incident_type: "Incid_Type",
        ignition_date: "BurnDate",
        area: "BurnBndAc",
    };
}

impl From<Schema> for FieldMap {
    fn from(schema: Schema) -> Self {
        match schema {
            Schema::Mtbs => FieldMap::MTBS,
            Schema::Legacy => FieldMap::LEGACY,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
/// A GeoJSON feature as returned by the remote service.
pub struct Feature {
    #[serde(default)]
    pub geometry: Option<Value>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Feature {
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name).filter(|v| !v.is_null())
    }

    /// The geometry as a `geo` geometry, `None` when absent or malformed.
    pub fn shape(&self) -> Option<Geometry<f64>> {
        let geometry = geojson::Geometry::from_json_value(self.geometry.clone()?).ok()?;
        Geometry::try_from(geometry).ok()
    }

    /// Whether the geometry intersects `bbox`. The envelope is tested first.
    pub fn intersects(&self, bbox: &BoundingBox) -> bool {
        let Some(shape) = self.shape() else {
            return false;
        };
        match BoundingBox::envelope(&shape) {
            Some(envelope) if envelope.intersects(bbox) => shape.intersects(bbox.rect()),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FireEvent {
    pub event_id: String,
    pub name: Option<String>,
    pub incident_type: Option<String>,
    /// Ignition date in milliseconds since the epoch.
    pub ignition_ms: i64,
    pub area_acres: f64,
    /// The feature the event was read from, with every property and the geometry.
    pub feature: Feature,
}

impl FireEvent {
    pub fn from_feature(feature: &Feature, fields: &FieldMap) -> Result<Self> {
        let event_id = feature
            .property(fields.event_id)
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("feature has no `{}`", fields.event_id))?
            .to_string();
        let ignition_ms = feature
            .property(fields.ignition_date)
            .and_then(timestamp_millis)
            .ok_or_else(|| anyhow!("{} has no usable `{}`", event_id, fields.ignition_date))?;
        let area_acres = feature
            .property(fields.area)
            .and_then(Value::as_f64)
            .unwrap_or_default();

        Ok(FireEvent {
            event_id,
            name: string_property(feature, fields.name),
            incident_type: string_property(feature, fields.incident_type),
            ignition_ms,
            area_acres,
            feature: feature.clone(),
        })
    }

    pub fn ignition_date(&self) -> Result<NaiveDate> {
        Ok(unix_to_naive_date(self.ignition_ms)?)
    }

    /// Two letter state code prefixing the event identifier.
    pub fn state(&self) -> Option<&str> {
        self.event_id.get(..2)
    }
}

fn string_property(feature: &Feature, name: &str) -> Option<String> {
    feature.property(name).and_then(Value::as_str).map(str::to_string)
}

// Ignition dates are millisecond numbers in Earth Engine, date strings in some exports.
fn timestamp_millis(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.get(..10).and_then(|d| date_to_unix(d).ok()),
        _ => None,
    }
}

// -- Tests -------------------------------------------------------------------
