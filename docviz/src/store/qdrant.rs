//! Qdrant REST client

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{CollectionInfo, ScrollRecord, ScrollRequest, ScrollResponse, VectorStore};
use crate::{Error, Result};

/// Qdrant vector store over HTTP
pub struct QdrantStore {
    client: Client,
    url: String,
    api_key: Option<String>,
}

/// Qdrant wraps every response body in `{"result": ..., "status": ..., "time": ...}`
#[derive(Deserialize)]
struct Envelope<T> {
    result: T,
}

#[derive(Deserialize)]
struct CollectionResult {
    #[serde(default)]
    points_count: Option<u64>,
}

#[derive(Deserialize)]
struct ScrollResult {
    #[serde(default)]
    points: Vec<ScrollRecord>,
}

impl QdrantStore {
    pub fn new(url: &str, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("api-key", key),
            None => request,
        }
    }

    async fn read<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Store(format!(
                "Qdrant {} failed ({}): {}",
                what, status, body
            )));
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| Error::Store(format!("Malformed Qdrant {} response: {}", what, e)))?;
        Ok(envelope.result)
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn collection_info(&self, collection: &str) -> Result<CollectionInfo> {
        let request = self
            .client
            .get(format!("{}/collections/{}", self.url, collection));
        let response = self.authorize(request).send().await?;

        let result: CollectionResult = Self::read(response, "collection info").await?;
        Ok(CollectionInfo {
            points_count: result.points_count.unwrap_or(0),
        })
    }

    async fn scroll(&self, collection: &str, request: ScrollRequest) -> Result<ScrollResponse> {
        let http = self
            .client
            .post(format!("{}/collections/{}/points/scroll", self.url, collection))
            .json(&request);
        let response = self.authorize(http).send().await?;

        let result: ScrollResult = Self::read(response, "scroll").await?;
        Ok(ScrollResponse {
            points: result.points,
        })
    }
}
