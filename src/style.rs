//! Declarative styling handed to map renderers, and GeoJSON layers carrying it.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::{dates::unix_to_date, mtbs::FireEvent};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    pub fill_color: &'static str,
    pub color: &'static str,
    pub weight: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_opacity: Option<f64>,
}

impl Style {
    /// Burned area outline for region queries (`width` 1) or single events (`width` 2).
    pub fn boundary(width: f64) -> Style {
        Style {
            fill_color: "#ff8a50",
            color: "#ff5722",
            weight: width,
            fill_opacity: None,
        }
    }

    pub fn filled(fill_color: &'static str) -> Style {
        Style {
            fill_color,
            color: "black",
            weight: 1.0,
            fill_opacity: Some(0.7),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub title: &'static str,
    pub entries: Vec<(&'static str, &'static str)>,
}

impl Legend {
    /// Wildfire count classes of the per-state summary.
    pub fn wildfire_severity() -> Legend {
        Legend {
            title: "Wildfire Severity by State",
            entries: vec![("Low", "#ffffb2"), ("Medium", "#fd8d3c"), ("High", "#bd0026")],
        }
    }

    pub fn color_of(&self, label: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, color)| *color)
    }
}

/// GeoJSON FeatureCollection of the events, each feature carrying `style` and a
/// readable ignition date next to its original properties.
pub fn boundary_layer(name: &str, events: &[FireEvent], style: &Style) -> serde_json::Result<Value> {
    let style = serde_json::to_value(style)?;
    let features: Vec<Value> = events
        .iter()
        .map(|event| {
            let mut properties: Map<String, Value> = event.feature.properties.clone();
            if let Ok(date) = unix_to_date(event.ignition_ms) {
                properties.insert("ignition_date".to_string(), Value::String(date));
            }
            properties.insert("style".to_string(), style.clone());
            json!({
                "type": "Feature",
                "geometry": event.feature.geometry.clone().unwrap_or(Value::Null),
                "properties": properties,
            })
        })
        .collect();

    Ok(json!({
        "type": "FeatureCollection",
        "name": name,
        "features": features,
    }))
}

// -- Tests -------------------------------------------------------------------
