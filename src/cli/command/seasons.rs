use std::path::{Path, PathBuf};

use anyhow::Result;
use log::info;

use crate::{
    cli::{create_spinner, SourceArgs},
    dates::DateWindow,
    mtbs::BoundingBox,
    parquet,
    series::{aggregate_by_season, build_time_series, AreaUnit},
};

use super::{field_map, make_output_file_name, open_source};

/// Saves the burned area time series of the region and, when it has rows, its
/// seasonal summary, which is also printed.
pub async fn seasons(
    args: &SourceArgs,
    output_dir: Option<&Path>,
    bbox: &BoundingBox,
    start: &str,
    end: &str,
    unit: AreaUnit,
) -> Result<Vec<PathBuf>> {
    let window = DateWindow::parse(start, end)?;
    let source = open_source(args).await?;

    let bar = create_spinner(format!("Querying burned areas {}...", window));
    let rows = build_time_series(&source, &field_map(args), bbox, &window).await?;
    bar.finish_with_message(format!("{} ignition dates", rows.len()));

    let series_path = make_output_file_name(output_dir, "timeseries", "parquet")?;
    parquet::save_time_series(&rows, &series_path)?;
    let mut paths = vec![series_path];

    if let Some(summary) = aggregate_by_season(&rows, unit) {
        println!("{}", summary);
        info!(
            "{:.3} in total over {} years ({})",
            summary.total(),
            summary.years(),
            summary.unit().label()
        );

        let summary_path = make_output_file_name(output_dir, "seasons", "parquet")?;
        parquet::save_seasons(&summary, &summary_path)?;
        paths.push(summary_path);
    }

    Ok(paths)
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::{json, Value};
    use tempfile::TempDir;

    use super::*;
    use crate::mtbs::{tests::feature, Schema};

    fn source_args(dir: &Path, features: Vec<Value>) -> SourceArgs {
        let path = dir.join("perims.geojson");
        fs::write(
            &path,
            json!({"type": "FeatureCollection", "features": features}).to_string(),
        )
        .unwrap();

        SourceArgs {
            geojson: Some(path),
            project: None,
            credentials: None,
            token: None,
            schema: Schema::Mtbs,
        }
    }

    #[tokio::test]
    async fn should_save_series_and_summary() {
        let dir = TempDir::new().unwrap();
        let f = feature("CA1", "DIXIE", "2021-07-13", 963309.0, -121.4, 40.0);
        let args = source_args(
            dir.path(),
            vec![json!({"type": "Feature", "geometry": f.geometry, "properties": f.properties})],
        );
        let bbox: BoundingBox = "-125,32,-114,42".parse().unwrap();

        let paths = seasons(&args, Some(dir.path()), &bbox, "2021-01-01", "2021-12-31", AreaUnit::Acres)
            .await
            .unwrap();

        assert_eq!(paths.len(), 2);
        assert!(paths.iter().all(|p| p.exists()));
    }

    #[tokio::test]
    async fn should_skip_summary_without_data() {
        let dir = TempDir::new().unwrap();
        let args = source_args(dir.path(), vec![]);
        let bbox: BoundingBox = "-125,32,-114,42".parse().unwrap();

        let paths = seasons(&args, Some(dir.path()), &bbox, "2021-01-01", "2021-12-31", AreaUnit::Acres)
            .await
            .unwrap();

        assert_eq!(paths.len(), 1);
    }
}
