use std::{path::Path, sync::Arc};

use anyhow::Result;
use arrow::array::{ArrayRef, Date32Array, Float64Array};

use crate::series::TimeSeriesRow;

use super::{date32, write_columns};

/// Saves the series as `date` (Date32) and `burned_area_acres` (Float64) columns.
pub fn save_time_series(rows: &[TimeSeriesRow], file_path: &Path) -> Result<()> {
    let dates: Vec<i32> = rows.iter().map(|r| date32(r.date)).collect();
    let areas: Vec<f64> = rows.iter().map(|r| r.burned_area_acres).collect();

    write_columns(
        vec![
            ("date", Arc::new(Date32Array::from(dates)) as ArrayRef),
            ("burned_area_acres", Arc::new(Float64Array::from(areas)) as ArrayRef),
        ],
        file_path,
    )
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use arrow::array::{Array, AsArray};
    use arrow::datatypes::{DataType, Date32Type, Float64Type};
    use chrono::NaiveDate;
    use tempfile::NamedTempFile;

    use super::*;
    use crate::parquet::tests::read_batches;

    #[test]
    fn should_save_series() {
        let rows = vec![
            TimeSeriesRow {
                date: NaiveDate::from_ymd_opt(2021, 7, 13).unwrap(),
                burned_area_acres: 963309.0,
            },
            TimeSeriesRow {
                date: NaiveDate::from_ymd_opt(2021, 8, 14).unwrap(),
                burned_area_acres: 221835.0,
            },
        ];
        let file = NamedTempFile::new().unwrap();

        save_time_series(&rows, file.path()).unwrap();

        let batches = read_batches(file.path());
        let batch = &batches[0];
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.schema().field(0).name(), "date");
        assert_eq!(batch.schema().field(0).data_type(), &DataType::Date32);
        assert_eq!(batch.column(0).as_primitive::<Date32Type>().value(0), 18_821);
        assert_eq!(batch.column(1).as_primitive::<Float64Type>().value(1), 221835.0);
        assert_eq!(batch.column(1).null_count(), 0);
    }

    #[test]
    fn should_save_empty_series() {
        let file = NamedTempFile::new().unwrap();

        save_time_series(&[], file.path()).unwrap();

        let rows: usize = read_batches(file.path()).iter().map(|b| b.num_rows()).sum();
        assert_eq!(rows, 0);
    }
}
