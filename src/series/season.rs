//! Burned area summed per year and meteorological season.

use std::{collections::BTreeMap, fmt};

use chrono::Datelike;
use clap::ValueEnum;
use log::info;

use super::TimeSeriesRow;

const ACRES_TO_HECTARES: f64 = 0.404686;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Winter, Season::Spring, Season::Summer, Season::Autumn];

    pub fn from_month(month: u32) -> Self {
        match month {
            12 | 1 | 2 => Season::Winter,
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            _ => Season::Autumn,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Season::Winter => "Winter",
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Autumn => "Autumn",
        };
        f.pad(name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum AreaUnit {
    #[default]
    /// Acres, as recorded in `BurnBndAc`
    Acres,
    /// Thousands of hectares
    KiloHectares,
}

impl AreaUnit {
    pub fn convert(self, acres: f64) -> f64 {
        match self {
            AreaUnit::Acres => acres,
            AreaUnit::KiloHectares => acres * ACRES_TO_HECTARES / 1000.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AreaUnit::Acres => "Burned Area (Acres)",
            AreaUnit::KiloHectares => "Burned Area (Thousands of Hectares)",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Year by season pivot. Cells never filled are zero.
pub struct SeasonalSummary {
    unit: AreaUnit,
    years: BTreeMap<i32, [f64; 4]>,
}

impl SeasonalSummary {
    pub fn unit(&self) -> AreaUnit {
        self.unit
    }

    pub fn get(&self, year: i32, season: Season) -> f64 {
        self.years
            .get(&year)
            .map(|row| row[season.index()])
            .unwrap_or(0.0)
    }

    /// Rows in ascending year order, columns in [`Season::ALL`] order.
    pub fn rows(&self) -> impl Iterator<Item = (i32, &[f64; 4])> {
        self.years.iter().map(|(year, row)| (*year, row))
    }

    pub fn years(&self) -> usize {
        self.years.len()
    }

    pub fn total(&self) -> f64 {
        self.years.values().flat_map(|row| row.iter()).sum()
    }
}

impl fmt::Display for SeasonalSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.unit.label())?;
        write!(f, "{:>6}", "Year")?;
        for season in Season::ALL {
            write!(f, " {:>14}", season)?;
        }
        writeln!(f)?;

        for (year, row) in self.rows() {
            write!(f, "{:>6}", year)?;
            for value in row {
                write!(f, " {:>14.3}", value)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Sums burned area by year and season. Returns `None` when there are no rows.
pub fn aggregate_by_season(rows: &[TimeSeriesRow], unit: AreaUnit) -> Option<SeasonalSummary> {
    if rows.is_empty() {
        info!("No data available to plot.");
        return None;
    }

    let mut years: BTreeMap<i32, [f64; 4]> = BTreeMap::new();
    for row in rows {
        let season = Season::from_month(row.date.month());
        let cell = &mut years.entry(row.date.year()).or_insert([0.0; 4])[season.index()];
        *cell += unit.convert(row.burned_area_acres);
    }

    Some(SeasonalSummary { unit, years })
}

// -- Tests -------------------------------------------------------------------
