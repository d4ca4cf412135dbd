pub mod boundaries;
pub mod fetch;
pub mod seasons;
pub mod states;
pub mod weather;

use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Result};
use chrono::{Datelike, Local, NaiveDate};
use log::info;
use serde_json::Value;

pub use boundaries::{boundaries, event, search};
pub use fetch::fetch;
pub use seasons::seasons;
pub use states::states;
pub use weather::weather;

use crate::mtbs::{
    earthengine::{RefreshTokenFlow, Session, StaticToken},
    FieldMap, LocalFeatures, Source,
};

use super::SourceArgs;

/// Opens the GeoJSON file when one is given, otherwise an Earth Engine session
/// authenticated with the token or the stored credentials.
pub async fn open_source(args: &SourceArgs) -> Result<Source> {
    if let Some(path) = &args.geojson {
        let local = LocalFeatures::from_geojson(path)?;
        info!("Loaded {} features from {}", local.len(), path.display());
        return Ok(Source::Local(local));
    }

    let project = args
        .project
        .as_deref()
        .ok_or_else(|| anyhow!("An Earth Engine project is required (--project or EE_PROJECT)"))?;

    let session = match &args.token {
        Some(token) => Session::initialize(project, &StaticToken(token.clone())).await?,
        None => {
            let flow = RefreshTokenFlow::new(args.credentials.clone())?;
            Session::initialize(project, &flow).await?
        }
    };

    Ok(Source::EarthEngine(session))
}

pub fn field_map(args: &SourceArgs) -> FieldMap {
    FieldMap::from(args.schema)
}

/// `mtbs-<kind>-<yyyy>-<mm>-<dd>.<extension>` in the output directory, the home
/// directory when none is set.
pub fn make_output_file_name(output_dir: Option<&Path>, kind: &str, extension: &str) -> Result<PathBuf> {
    let dir = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => dirs::home_dir().ok_or_else(|| anyhow!("Cannot locate the home directory"))?,
    };

    Ok(dir.join(output_file_name(kind, extension, Local::now().date_naive())))
}

fn output_file_name(kind: &str, extension: &str, today: NaiveDate) -> String {
    format!(
        "mtbs-{}-{}-{:02}-{:02}.{}",
        kind,
        today.year(),
        today.month(),
        today.day(),
        extension
    )
}

pub fn save_json(value: &Value, file_path: &Path) -> Result<()> {
    let writer = BufWriter::new(File::create(file_path)?);
    serde_json::to_writer_pretty(writer, value)?;
    Ok(())
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::mtbs::Schema;

    fn source_args(geojson: Option<PathBuf>) -> SourceArgs {
        SourceArgs {
            geojson,
            project: None,
            credentials: None,
            token: None,
            schema: Schema::Mtbs,
        }
    }

    #[test]
    fn should_make_date_stamped_file_name() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(
            output_file_name("seasons", "parquet", today),
            "mtbs-seasons-2024-03-05.parquet"
        );
    }

    #[test]
    fn should_place_output_in_given_directory() {
        let dir = TempDir::new().unwrap();
        let path = make_output_file_name(Some(dir.path()), "boundaries", "geojson").unwrap();

        assert_eq!(path.parent(), Some(dir.path()));
        assert!(path.to_string_lossy().ends_with(".geojson"));
    }

    #[test]
    fn should_save_pretty_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.json");

        save_json(&json!({"a": 1}), &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"a\": 1"));
    }

    #[tokio::test]
    async fn should_open_local_source() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("perims.geojson");
        fs::write(&path, r#"{"type": "FeatureCollection", "features": []}"#).unwrap();

        let source = open_source(&source_args(Some(path))).await.unwrap();

        assert!(matches!(source, Source::Local(_)));
    }

    #[tokio::test]
    async fn should_require_project_for_earth_engine() {
        assert!(open_source(&source_args(None)).await.is_err());
    }
}
