//! Wildfire counts per US state, classified for a choropleth.

use std::{collections::BTreeMap, fmt};

use log::info;

use crate::{
    mtbs::FireEvent,
    style::{Legend, Style},
};

pub const WILDFIRE: &str = "Wildfire";

/// Postal codes of the 50 states and DC, as they prefix MTBS event identifiers.
pub const STATE_CODES: [&str; 51] = [
    "AK", "AL", "AR", "AZ", "CA", "CO", "CT", "DC", "DE", "FL", "GA", "HI", "IA", "ID", "IL",
    "IN", "KS", "KY", "LA", "MA", "MD", "ME", "MI", "MN", "MO", "MS", "MT", "NC", "ND", "NE",
    "NH", "NJ", "NM", "NV", "NY", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT",
    "VA", "VT", "WA", "WI", "WV", "WY",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn classify(count: usize) -> Self {
        match count {
            0..=49 => Severity::Low,
            50..=199 => Severity::Medium,
            _ => Severity::High,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
        }
    }

    pub fn style(self) -> Style {
        let color = Legend::wildfire_severity()
            .color_of(self.label())
            .unwrap_or("#ffffff");
        Style::filled(color)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateSummary {
    pub count: usize,
    pub severity: Severity,
}

impl StateSummary {
    fn new(count: usize) -> Self {
        StateSummary {
            count,
            severity: Severity::classify(count),
        }
    }
}

/// Counts wildfires per state. Every state is present, those without wildfires at
/// zero. Codes outside [`STATE_CODES`] (e.g. territories) are kept as found.
pub fn wildfires_by_state(events: &[FireEvent]) -> BTreeMap<String, StateSummary> {
    let mut counts: BTreeMap<String, usize> =
        STATE_CODES.iter().map(|code| (code.to_string(), 0)).collect();

    let wildfires = events
        .iter()
        .filter(|e| e.incident_type.as_deref() == Some(WILDFIRE));
    for event in wildfires {
        if let Some(state) = event.state() {
            *counts.entry(state.to_uppercase()).or_insert(0) += 1;
        }
    }

    let total: usize = counts.values().sum();
    info!("{} wildfires across {} states", total, counts.len());

    counts
        .into_iter()
        .map(|(state, count)| (state, StateSummary::new(count)))
        .collect()
}

// -- Tests -------------------------------------------------------------------
