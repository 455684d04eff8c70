use crate::cache::CacheStats;
use crate::visualization::{ScatterOptions, ScatterResponse, VisualizationService};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub type ApiError = (StatusCode, Json<Value>);

pub async fn get_scatter(
    State(service): State<Arc<VisualizationService>>,
    Query(options): Query<ScatterOptions>,
) -> Result<Json<ScatterResponse>, ApiError> {
    service
        .get_scatter_data(&options)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!("Scatter request failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
        })
}

pub async fn clear_cache(State(service): State<Arc<VisualizationService>>) -> StatusCode {
    service.clear_cache().await;
    StatusCode::NO_CONTENT
}

pub async fn cache_stats(State(service): State<Arc<VisualizationService>>) -> Json<CacheStats> {
    Json(service.cache_stats().await)
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
