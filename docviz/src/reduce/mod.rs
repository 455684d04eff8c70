//! Dimensionality reduction
//!
//! The pipeline hands a batch of equal-length vectors to a [`Reducer`] and
//! gets back one 2D coordinate per input, index-aligned.

mod http;

pub use http::HttpReducer;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

pub const DEFAULT_N_NEIGHBORS: usize = 15;
pub const DEFAULT_MIN_DIST: f64 = 0.1;
pub const DEFAULT_SPREAD: f64 = 1.0;

/// UMAP parameters for one fit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReductionParams {
    pub n_components: usize,
    pub n_neighbors: usize,
    pub min_dist: f64,
    pub spread: f64,
}

impl ReductionParams {
    /// Parameters for a batch of `n_points` records.
    ///
    /// Neighbors are capped at half the batch so small collections never ask
    /// for more neighbors than exist, and floored at 1.
    pub fn for_points(n_points: usize) -> Self {
        Self {
            n_components: 2,
            n_neighbors: DEFAULT_N_NEIGHBORS.min(n_points / 2).max(1),
            min_dist: DEFAULT_MIN_DIST,
            spread: DEFAULT_SPREAD,
        }
    }
}

/// Fits a 2D embedding for a batch of vectors
#[async_trait]
pub trait Reducer: Send + Sync {
    /// Returns exactly one `[x, y]` per input vector, in input order.
    async fn fit(&self, params: &ReductionParams, vectors: Vec<Vec<f32>>) -> Result<Vec<[f64; 2]>>;

    /// Method name recorded in result metadata
    fn method(&self) -> &str {
        "umap"
    }
}
