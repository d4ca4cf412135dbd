use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use anyhow::Result;
use serde_json::{json, Value};

use crate::{
    cli::SourceArgs,
    parquet,
    states::{wildfires_by_state, StateSummary},
    style::Legend,
};

use super::{field_map, make_output_file_name, save_json};

/// Prints the wildfire count and severity of every state read from an MTBS parquet
/// table, and saves them with their fill styles and the legend as JSON.
pub fn states(args: &SourceArgs, output_dir: Option<&Path>, table: &Path) -> Result<Vec<PathBuf>> {
    let events = parquet::read_events(table, &field_map(args))?;
    let summary = wildfires_by_state(&events);

    for (state, s) in &summary {
        println!("{}  {:>5}  {}", state, s.count, s.severity);
    }

    let file_path = make_output_file_name(output_dir, "states", "json")?;
    save_json(&summary_json(&summary), &file_path)?;

    Ok(vec![file_path])
}

fn summary_json(summary: &BTreeMap<String, StateSummary>) -> Value {
    let states: serde_json::Map<String, Value> = summary
        .iter()
        .map(|(state, s)| {
            let value = json!({
                "count": s.count,
                "severity": s.severity.label(),
                "style": s.severity.style(),
            });
            (state.clone(), value)
        })
        .collect();

    json!({
        "legend": Legend::wildfire_severity(),
        "states": states,
    })
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::{fs, sync::Arc};

    use arrow::array::{ArrayRef, Date32Array, RecordBatch, StringArray};
    use ::parquet::{arrow::ArrowWriter, file::properties::WriterProperties};
    use tempfile::TempDir;

    use super::*;
    use crate::mtbs::Schema;

    fn write_table(path: &Path) {
        let batch = RecordBatch::try_from_iter(vec![
            (
                "Event_ID",
                Arc::new(StringArray::from(vec!["CA1", "CA2", "WA1"])) as ArrayRef,
            ),
            (
                "Incid_Type",
                Arc::new(StringArray::from(vec!["Wildfire", "Wildfire", "Prescribed Fire"])) as ArrayRef,
            ),
            ("Ig_Date", Arc::new(Date32Array::from(vec![18_821, 18_822, 18_823])) as ArrayRef),
        ])
        .unwrap();
        let file = fs::File::create(path).unwrap();
        let mut writer =
            ArrowWriter::try_new(file, batch.schema(), Some(WriterProperties::default())).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
    }

    #[test]
    fn should_save_state_summary_with_legend() {
        let dir = TempDir::new().unwrap();
        let table = dir.path().join("mtbs.parquet");
        write_table(&table);
        let args = SourceArgs {
            geojson: None,
            project: None,
            credentials: None,
            token: None,
            schema: Schema::Mtbs,
        };

        let paths = states(&args, Some(dir.path()), &table).unwrap();

        let saved: Value = serde_json::from_str(&fs::read_to_string(&paths[0]).unwrap()).unwrap();
        assert_eq!(saved["states"]["CA"]["count"], 2);
        assert_eq!(saved["states"]["WA"]["count"], 0);
        assert_eq!(saved["states"]["CA"]["severity"], "Low");
        assert_eq!(saved["states"]["CA"]["style"]["fillColor"], "#ffffb2");
        assert_eq!(saved["legend"]["title"], "Wildfire Severity by State");
    }
}
