//! Stub collaborators shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use docviz::reduce::{ReductionParams, Reducer};
use docviz::store::{CollectionInfo, ScrollRecord, ScrollRequest, ScrollResponse, VectorStore};
use docviz::{Error, Result};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory vector store returning a fixed record set
#[derive(Default)]
pub struct StubStore {
    pub points_count: u64,
    pub records: Vec<ScrollRecord>,
    pub fail: bool,
    pub info_calls: AtomicUsize,
    pub scroll_calls: AtomicUsize,
    pub last_request: Mutex<Option<ScrollRequest>>,
}

impl StubStore {
    pub fn with_records(records: Vec<ScrollRecord>) -> Self {
        Self {
            points_count: records.len() as u64,
            records,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            points_count: 10,
            fail: true,
            ..Default::default()
        }
    }

    pub fn scrolls(&self) -> usize {
        self.scroll_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VectorStore for StubStore {
    async fn collection_info(&self, _collection: &str) -> Result<CollectionInfo> {
        self.info_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::Store("connection refused".to_string()));
        }
        Ok(CollectionInfo {
            points_count: self.points_count,
        })
    }

    async fn scroll(&self, _collection: &str, request: ScrollRequest) -> Result<ScrollResponse> {
        self.scroll_calls.fetch_add(1, Ordering::SeqCst);
        let limit = request.limit;
        *self.last_request.lock() = Some(request);
        Ok(ScrollResponse {
            points: self.records.iter().take(limit).cloned().collect(),
        })
    }
}

/// Reducer that projects each vector onto its first two components, or
/// returns a canned answer
#[derive(Default)]
pub struct StubReducer {
    pub canned: Option<Vec<[f64; 2]>>,
    pub fail: bool,
    pub calls: AtomicUsize,
    pub last_params: Mutex<Option<ReductionParams>>,
    pub last_input: Mutex<Vec<Vec<f32>>>,
}

impl StubReducer {
    pub fn canned(coords: Vec<[f64; 2]>) -> Self {
        Self {
            canned: Some(coords),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Reducer for StubReducer {
    async fn fit(&self, params: &ReductionParams, vectors: Vec<Vec<f32>>) -> Result<Vec<[f64; 2]>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_params.lock() = Some(params.clone());
        *self.last_input.lock() = vectors.clone();

        if self.fail {
            return Err(Error::Reduction("fit diverged".to_string()));
        }
        if let Some(coords) = &self.canned {
            return Ok(coords.clone());
        }
        Ok(vectors
            .iter()
            .map(|v| {
                [
                    v.first().copied().unwrap_or(0.0) as f64,
                    v.get(1).copied().unwrap_or(0.0) as f64,
                ]
            })
            .collect())
    }
}

pub fn record(id: u64, vector: Value, payload: Value) -> ScrollRecord {
    serde_json::from_value(json!({"id": id, "vector": vector, "payload": payload}))
        .expect("valid scroll record")
}

/// `n` records with 4-D vectors `[i, i, i, i]`
pub fn uniform_records(n: u64) -> Vec<ScrollRecord> {
    (0..n)
        .map(|i| {
            let x = i as f64;
            record(
                i + 1,
                json!([x, x, x, x]),
                json!({"title": format!("doc-{}", i + 1), "category": "Test"}),
            )
        })
        .collect()
}
