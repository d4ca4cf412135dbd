//! Downloads MTBS and USGS fire datasets from object storage into a local cache
//! directory. A key is fetched only if its file is not already present.

use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Result};
use aws_config::{meta::region::RegionProviderChain, BehaviorVersion, Region};
use aws_sdk_s3::Client;
use clap::ValueEnum;
use log::{error, info};

use crate::cli::create_spinner;

pub const BUCKET: &str = "cboettig";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Dataset {
    /// USGS fire parquet files under `fire/`
    Usgs,
    /// MTBS perimeter shapefile parts under `fire/USGS-MTBS/`
    MtbsShapefile,
}

impl Dataset {
    pub fn prefix(&self) -> &'static str {
        match self {
            Dataset::Usgs => "fire/",
            Dataset::MtbsShapefile => "fire/USGS-MTBS/",
        }
    }

    pub fn key_prefix(&self, file_name: &str) -> String {
        format!("{}{}", self.prefix(), file_name)
    }
}

/// Listing and download of objects in one bucket.
pub trait ObjectStore {
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>>;
    async fn download(&self, key: &str, file_path: &Path) -> Result<()>;
}

pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    /// Anonymous client for a public bucket, optionally on an S3 compatible endpoint.
    pub async fn connect(bucket: &str, region: &str, endpoint: Option<&str>) -> S3Store {
        let region_provider = RegionProviderChain::first_try(Region::new(region.to_string()));
        let config = aws_config::defaults(BehaviorVersion::latest())
            .no_credentials()
            .region(region_provider)
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&config);
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        S3Store {
            client: Client::from_conf(builder.build()),
            bucket: bucket.to_string(),
        }
    }
}

impl ObjectStore for S3Store {
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix);
            if let Some(token) = &continuation {
                request = request.continuation_token(token);
            }
            let response = request.send().await?;

            keys.extend(
                response
                    .contents()
                    .iter()
                    .filter_map(|o| o.key().map(str::to_string)),
            );

            match response.next_continuation_token() {
                Some(token) if response.is_truncated() == Some(true) => {
                    continuation = Some(token.to_string())
                }
                _ => break,
            }
        }

        Ok(keys)
    }

    async fn download(&self, key: &str, file_path: &Path) -> Result<()> {
        let mut object = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await?;

        let mut file = File::create(file_path)?;
        while let Some(bytes) = object.body.try_next().await? {
            file.write_all(&bytes)?;
        }

        Ok(())
    }
}

/// Last path segment of an object key.
pub fn key_file_name(key: &str) -> Option<&str> {
    key.rsplit('/').next().filter(|name| !name.is_empty())
}

/// Makes sure every object under `<dataset prefix><file_name>` exists in
/// `local_dir` and returns the local paths. Failed downloads are logged and left
/// out of the result.
pub async fn fetch_dataset<S: ObjectStore>(
    store: &S,
    dataset: Dataset,
    file_name: &str,
    local_dir: &Path,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(local_dir)?;

    let prefix = dataset.key_prefix(file_name);
    let keys = store.list_keys(&prefix).await?;
    if keys.is_empty() {
        return Err(anyhow!("No objects found under `{}/{}`", BUCKET, prefix));
    }

    let mut paths = Vec::with_capacity(keys.len());
    for key in &keys {
        let Some(name) = key_file_name(key) else {
            continue;
        };
        let file_path = local_dir.join(name);

        if file_path.exists() {
            info!("{} already exists locally. No download needed.", name);
            paths.push(file_path);
            continue;
        }

        let bar = create_spinner(format!("Downloading {}...", key));
        match store.download(key, &file_path).await {
            Ok(()) => {
                bar.finish_with_message(format!("{} downloaded", name));
                paths.push(file_path);
            }
            Err(e) => {
                bar.abandon_with_message(format!("{} failed", name));
                error!("Download of {} failed: {}", key, e);
                // a partial file would pass the presence check next time
                let _ = fs::remove_file(&file_path);
            }
        }
    }

    Ok(paths)
}

// -- Tests -------------------------------------------------------------------
