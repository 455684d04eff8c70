//! Reduction over an HTTP fit service

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{ReductionParams, Reducer};
use crate::{Error, Result};

/// Client for a reduction service exposing `POST /fit`
pub struct HttpReducer {
    client: Client,
    url: String,
}

#[derive(Serialize)]
struct FitRequest<'a> {
    embeddings: &'a [Vec<f32>],
    method: &'a str,
    n_components: usize,
    n_neighbors: usize,
    min_dist: f64,
    spread: f64,
}

#[derive(Deserialize)]
struct FitResponse {
    projections: Vec<[f64; 2]>,
    #[serde(default)]
    fit_ms: Option<u64>,
}

impl HttpReducer {
    pub fn new(url: &str) -> Self {
        Self {
            client: Client::new(),
            url: url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Reducer for HttpReducer {
    async fn fit(&self, params: &ReductionParams, vectors: Vec<Vec<f32>>) -> Result<Vec<[f64; 2]>> {
        let request = FitRequest {
            embeddings: &vectors,
            method: self.method(),
            n_components: params.n_components,
            n_neighbors: params.n_neighbors,
            min_dist: params.min_dist,
            spread: params.spread,
        };

        let response = self
            .client
            .post(format!("{}/fit", self.url))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Reduction(format!("Reducer unreachable: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Reduction(format!("Fit failed ({}): {}", status, body)));
        }

        let fit: FitResponse = response
            .json()
            .await
            .map_err(|e| Error::Reduction(format!("Malformed fit response: {}", e)))?;

        if fit.projections.len() != vectors.len() {
            return Err(Error::Reduction(format!(
                "Reducer returned {} projections for {} vectors",
                fit.projections.len(),
                vectors.len()
            )));
        }

        if let Some(ms) = fit.fit_ms {
            tracing::debug!("Remote fit reported {}ms for {} points", ms, vectors.len());
        }
        Ok(fit.projections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_request_shape() {
        let vectors = vec![vec![0.0f32, 1.0], vec![1.0, 0.0]];
        let params = ReductionParams::for_points(2);
        let request = FitRequest {
            embeddings: &vectors,
            method: "umap",
            n_components: params.n_components,
            n_neighbors: params.n_neighbors,
            min_dist: params.min_dist,
            spread: params.spread,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["embeddings"][1][0], 1.0);
        assert_eq!(json["n_neighbors"], 1);
        assert_eq!(json["n_components"], 2);
        assert_eq!(json["method"], "umap");
    }

    #[tokio::test]
    async fn test_unreachable_reducer_is_reduction_error() {
        let reducer = HttpReducer::new("http://127.0.0.1:1");
        let err = reducer
            .fit(&ReductionParams::for_points(2), vec![vec![0.0], vec![1.0]])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Reduction(_)));
    }
}
