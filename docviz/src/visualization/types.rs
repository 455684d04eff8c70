use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::reduce::ReductionParams;
use crate::store::PointId;

/// Default number of records fetched for one visualization
pub const DEFAULT_LIMIT: usize = 5000;

/// One document placed on the scatter plot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScatterPoint {
    pub id: PointId,
    pub x: f64,
    pub y: f64,
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub location: Option<serde_json::Value>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub pii_risk: String,
    #[serde(default)]
    pub date: Option<serde_json::Value>,
    /// First 150 characters of the document content
    #[serde(default)]
    pub snippet: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingTime {
    /// Time spent inside the reducer
    pub reduction_ms: u64,
    /// Whole pipeline, fetch through formatting
    pub total_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationMetadata {
    pub total_documents: u64,
    pub visualized_documents: usize,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub generated_at: DateTime<Utc>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<ReductionParams>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<ProcessingTime>,
}

/// A complete generated visualization. Cached as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizationResult {
    pub points: Vec<ScatterPoint>,
    pub metadata: VisualizationMetadata,
}

impl VisualizationResult {
    /// Result with no points, produced without running the reducer
    pub fn empty(total_documents: u64, method: &str, generated_at: DateTime<Utc>) -> Self {
        Self {
            points: Vec::new(),
            metadata: VisualizationMetadata {
                total_documents,
                visualized_documents: 0,
                generated_at,
                method: method.to_string(),
                parameters: None,
                processing_time: None,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScatterOptions {
    /// Skip the cache read (the fresh result is still written back)
    #[serde(default)]
    pub force_refresh: bool,
    /// Max records to visualize, defaults to [`DEFAULT_LIMIT`]
    #[serde(default)]
    pub limit: Option<usize>,
}

impl ScatterOptions {
    pub fn refresh() -> Self {
        Self {
            force_refresh: true,
            limit: None,
        }
    }

    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }
}

/// What callers of the service receive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScatterResponse {
    #[serde(flatten)]
    pub result: VisualizationResult,
    pub from_cache: bool,
    /// Milliseconds since the cached result was generated
    #[serde(rename = "cacheAge", default, skip_serializing_if = "Option::is_none")]
    pub cache_age_ms: Option<u64>,
    /// Milliseconds this call spent generating and caching
    #[serde(rename = "generationTime", default, skip_serializing_if = "Option::is_none")]
    pub generation_time_ms: Option<u64>,
}
