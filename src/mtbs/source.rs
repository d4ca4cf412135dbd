//! Where boundary features come from: the Earth Engine session or a local GeoJSON
//! export of the same collection.

use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Deserialize;

use super::{earthengine::Session, Feature, Filter};

pub trait FeatureSource {
    async fn features(&self, collection: &str, filter: &Filter) -> Result<Vec<Feature>>;
}

impl FeatureSource for Session {
    async fn features(&self, collection: &str, filter: &Filter) -> Result<Vec<Feature>> {
        Ok(self.compute_features(collection, filter).await?)
    }
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Default)]
/// Features held in memory and filtered locally.
pub struct LocalFeatures {
    features: Vec<Feature>,
}

impl LocalFeatures {
    pub fn new(features: Vec<Feature>) -> Self {
        LocalFeatures { features }
    }

    pub fn from_geojson(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Cannot read `{}`: {}", path.display(), e))?;
        let collection: FeatureCollection = serde_json::from_str(&text)?;
        Ok(LocalFeatures::new(collection.features))
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }
}

impl FeatureSource for LocalFeatures {
    async fn features(&self, _collection: &str, filter: &Filter) -> Result<Vec<Feature>> {
        Ok(self
            .features
            .iter()
            .filter(|f| filter.matches(f))
            .cloned()
            .collect())
    }
}

/// The source chosen on the command line.
pub enum Source {
    EarthEngine(Session),
    Local(LocalFeatures),
}

impl FeatureSource for Source {
    async fn features(&self, collection: &str, filter: &Filter) -> Result<Vec<Feature>> {
        match self {
            Source::EarthEngine(session) => session.features(collection, filter).await,
            Source::Local(local) => local.features(collection, filter).await,
        }
    }
}

// -- Tests -------------------------------------------------------------------
