//! Vector store access
//!
//! The pipeline reads collection size and a bounded batch of records through
//! [`VectorStore`]. [`QdrantStore`] talks to Qdrant's REST API.

mod qdrant;

pub use qdrant::QdrantStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Result;

/// Point identifier: Qdrant accepts unsigned integers and UUID strings
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointId {
    Num(u64),
    Uuid(String),
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(n) => write!(f, "{}", n),
            Self::Uuid(s) => f.write_str(s),
        }
    }
}

impl From<u64> for PointId {
    fn from(n: u64) -> Self {
        Self::Num(n)
    }
}

impl From<&str> for PointId {
    fn from(s: &str) -> Self {
        Self::Uuid(s.to_string())
    }
}

/// Subset of collection info the pipeline needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionInfo {
    #[serde(default)]
    pub points_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollRequest {
    pub limit: usize,
    pub with_payload: bool,
    pub with_vector: bool,
}

impl ScrollRequest {
    /// Payload and vectors for up to `limit` points
    pub fn full(limit: usize) -> Self {
        Self {
            limit,
            with_payload: true,
            with_vector: true,
        }
    }
}

/// One record returned by a scroll.
///
/// `vector` is kept as raw JSON: collections may hold a plain vector or a map
/// of named vectors, and the pipeline decides how to resolve it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollRecord {
    pub id: PointId,
    #[serde(default)]
    pub vector: Option<serde_json::Value>,
    #[serde(default)]
    pub payload: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScrollResponse {
    #[serde(default)]
    pub points: Vec<ScrollRecord>,
}

/// Read access to a vector collection
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn collection_info(&self, collection: &str) -> Result<CollectionInfo>;

    /// Single bounded page; no cursor continuation
    async fn scroll(&self, collection: &str, request: ScrollRequest) -> Result<ScrollResponse>;
}
