//! Sketch datasets and their on-disk formats: JSON for hand-edited files,
//! bincode for everything else.

use std::fs;
use std::ops::Deref;
use std::path::Path;

use rand::Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{KnnError, Result};
use crate::point::Sketch;

/// Encoding of a dataset file, chosen from its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Json,
    Bincode,
}

impl DatasetFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DatasetFormat::Json,
            _ => DatasetFormat::Bincode,
        }
    }
}

/// An ordered collection of labelled sketches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset<L> {
    sketches: Vec<Sketch<L>>,
}

impl<L> Dataset<L> {
    /// Build a dataset; every sketch must have at least one point.
    pub fn new(sketches: Vec<Sketch<L>>) -> Result<Self> {
        let dataset = Self { sketches };
        dataset.validate()?;
        Ok(dataset)
    }

    pub fn sketches(&self) -> &[Sketch<L>] {
        &self.sketches
    }

    pub fn into_sketches(self) -> Vec<Sketch<L>> {
        self.sketches
    }

    /// Position of the sketch to use as a query.
    ///
    /// A requested index wraps around the dataset size; without one a
    /// position is drawn from `rng`.
    pub fn query_index<R: Rng>(&self, requested: Option<usize>, rng: &mut R) -> Result<usize> {
        if self.sketches.is_empty() {
            return Err(KnnError::EmptyDataset);
        }
        Ok(match requested {
            Some(i) => i % self.sketches.len(),
            None => rng.gen_range(0..self.sketches.len()),
        })
    }

    fn validate(&self) -> Result<()> {
        match self.sketches.iter().position(|s| s.is_empty()) {
            Some(index) => Err(KnnError::EmptySketch { index }),
            None => Ok(()),
        }
    }
}

impl<L> Deref for Dataset<L> {
    type Target = [Sketch<L>];

    fn deref(&self) -> &[Sketch<L>] {
        &self.sketches
    }
}

impl<L: DeserializeOwned> Dataset<L> {
    /// Load and validate a dataset file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;

        let dataset: Dataset<L> = match DatasetFormat::from_path(path) {
            DatasetFormat::Json => serde_json::from_slice(&bytes)
                .map_err(|e| KnnError::SerializationError(e.to_string()))?,
            DatasetFormat::Bincode => bincode::deserialize(&bytes)
                .map_err(|e| KnnError::SerializationError(e.to_string()))?,
        };
        dataset.validate()?;

        debug!("Loaded {} sketches from {}", dataset.len(), path.display());
        Ok(dataset)
    }
}

impl<L: Serialize> Dataset<L> {
    /// Write the dataset in the format implied by the file extension
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = match DatasetFormat::from_path(path) {
            DatasetFormat::Json => serde_json::to_vec_pretty(self)
                .map_err(|e| KnnError::SerializationError(e.to_string()))?,
            DatasetFormat::Bincode => bincode::serialize(self)
                .map_err(|e| KnnError::SerializationError(e.to_string()))?,
        };
        fs::write(path, bytes)?;

        debug!("Saved {} sketches to {}", self.len(), path.display());
        Ok(())
    }
}
