use std::path::{Path, PathBuf};

use anyhow::Result;
use log::info;

use crate::download::{fetch_dataset, Dataset, S3Store, BUCKET};

const DEFAULT_DATA_DIR: &str = "data";

/// Downloads the objects under `<dataset prefix><file_name>` that are not yet in
/// the data directory.
pub async fn fetch(
    dataset: Dataset,
    file_name: &str,
    data_dir: Option<&Path>,
    endpoint: Option<&str>,
    region: &str,
) -> Result<Vec<PathBuf>> {
    let data_dir = data_dir.unwrap_or_else(|| Path::new(DEFAULT_DATA_DIR));
    let store = S3Store::connect(BUCKET, region, endpoint).await;

    let paths = fetch_dataset(&store, dataset, file_name, data_dir).await?;
    info!("{} files available in {}", paths.len(), data_dir.display());

    Ok(paths)
}
