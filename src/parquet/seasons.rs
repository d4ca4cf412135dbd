use std::{path::Path, sync::Arc};

use anyhow::Result;
use arrow::array::{ArrayRef, Float64Array, Int32Array};

use crate::series::{Season, SeasonalSummary};

use super::write_columns;

/// Saves the pivot as a `year` column followed by one column per season, in the
/// summary's area unit.
pub fn save_seasons(summary: &SeasonalSummary, file_path: &Path) -> Result<()> {
    let years: Vec<i32> = summary.rows().map(|(year, _)| year).collect();
    let mut columns: Vec<(&str, ArrayRef)> =
        vec![("year", Arc::new(Int32Array::from(years.clone())) as ArrayRef)];

    for season in Season::ALL {
        let values: Vec<f64> = years.iter().map(|&year| summary.get(year, season)).collect();
        columns.push((column_name(season), Arc::new(Float64Array::from(values)) as ArrayRef));
    }

    write_columns(columns, file_path)
}

fn column_name(season: Season) -> &'static str {
    match season {
        Season::Winter => "winter",
        Season::Spring => "spring",
        Season::Summer => "summer",
        Season::Autumn => "autumn",
    }
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use arrow::array::AsArray;
    use arrow::datatypes::{Float64Type, Int32Type};
    use chrono::NaiveDate;
    use tempfile::NamedTempFile;

    use super::*;
    use crate::{
        parquet::tests::read_batches,
        series::{aggregate_by_season, AreaUnit, TimeSeriesRow},
    };

    #[test]
    fn should_save_pivot_table() {
        let rows: Vec<TimeSeriesRow> = [(2020, 1, 100.0), (2020, 7, 50.0), (2021, 1, 30.0)]
            .iter()
            .map(|&(y, m, acres)| TimeSeriesRow {
                date: NaiveDate::from_ymd_opt(y, m, 1).unwrap(),
                burned_area_acres: acres,
            })
            .collect();
        let summary = aggregate_by_season(&rows, AreaUnit::Acres).unwrap();
        let file = NamedTempFile::new().unwrap();

        save_seasons(&summary, file.path()).unwrap();

        let batch = &read_batches(file.path())[0];
        let names: Vec<&str> = batch
            .schema_ref()
            .fields()
            .iter()
            .map(|f| f.name().as_str())
            .collect();
        assert_eq!(names, vec!["year", "winter", "spring", "summer", "autumn"]);
        assert_eq!(batch.num_rows(), 2);

        let years = batch.column(0).as_primitive::<Int32Type>();
        let winter = batch.column(1).as_primitive::<Float64Type>();
        let summer = batch.column(3).as_primitive::<Float64Type>();
        assert_eq!(years.value(1), 2021);
        assert_eq!(winter.value(0), 100.0);
        assert_eq!(winter.value(1), 30.0);
        assert_eq!(summer.value(0), 50.0);
        assert_eq!(summer.value(1), 0.0);
    }
}
