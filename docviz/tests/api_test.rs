//! HTTP routes exercised in-process through the router

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use common::{uniform_records, StubReducer, StubStore};
use docviz::api::ApiServer;
use docviz::cache::MemoryCache;
use docviz::visualization::{VisualizationPipeline, VisualizationService};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn app(store: StubStore, reducer: StubReducer) -> (Router, Arc<StubReducer>) {
    let reducer = Arc::new(reducer);
    let pipeline = VisualizationPipeline::new(Arc::new(store), reducer.clone(), "documents");
    let service = VisualizationService::new(
        Arc::new(MemoryCache::new()),
        pipeline,
        Duration::from_secs(3600),
    );
    (ApiServer::new(Arc::new(service)).router(), reducer)
}

async fn send(app: &Router, method: Method, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn test_scatter_route_returns_points() {
    let (app, _) = app(
        StubStore::with_records(uniform_records(4)),
        StubReducer::default(),
    );

    let (status, body) = send(&app, Method::GET, "/api/visualization/scatter").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["points"].as_array().unwrap().len(), 4);
    assert_eq!(body["points"][0]["title"], "doc-1");
    assert_eq!(body["points"][0]["piiRisk"], "none");
    assert_eq!(body["metadata"]["totalDocuments"], 4);
    assert_eq!(body["metadata"]["method"], "umap");
    assert!(body["metadata"]["generatedAt"].is_i64());
    assert_eq!(body["fromCache"], false);
    assert!(body.get("generationTime").is_some());
}

#[tokio::test]
async fn test_scatter_query_parameters() {
    let (app, reducer) = app(
        StubStore::with_records(uniform_records(10)),
        StubReducer::default(),
    );

    let (_, first) = send(&app, Method::GET, "/api/visualization/scatter?limit=3").await;
    assert_eq!(first["points"].as_array().unwrap().len(), 3);

    let (_, cached) = send(&app, Method::GET, "/api/visualization/scatter").await;
    assert_eq!(cached["fromCache"], true);
    assert!(cached.get("cacheAge").is_some());

    let (_, refreshed) = send(
        &app,
        Method::GET,
        "/api/visualization/scatter?forceRefresh=true",
    )
    .await;
    assert_eq!(refreshed["fromCache"], false);
    assert_eq!(refreshed["points"].as_array().unwrap().len(), 10);
    assert_eq!(reducer.calls(), 2);
}

#[tokio::test]
async fn test_scatter_failure_is_server_error() {
    let (app, _) = app(StubStore::failing(), StubReducer::default());

    let (status, body) = send(&app, Method::GET, "/api/visualization/scatter").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("connection refused"));
}

#[tokio::test]
async fn test_clear_cache_route() {
    let (app, reducer) = app(
        StubStore::with_records(uniform_records(3)),
        StubReducer::default(),
    );
    send(&app, Method::GET, "/api/visualization/scatter").await;

    let (status, body) = send(&app, Method::DELETE, "/api/visualization/cache").await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (_, again) = send(&app, Method::GET, "/api/visualization/scatter").await;
    assert_eq!(again["fromCache"], false);
    assert_eq!(reducer.calls(), 2);
}

#[tokio::test]
async fn test_cache_stats_route() {
    let (app, _) = app(
        StubStore::with_records(uniform_records(3)),
        StubReducer::default(),
    );
    send(&app, Method::GET, "/api/visualization/scatter").await;
    send(&app, Method::GET, "/api/visualization/scatter").await;

    let (status, body) = send(&app, Method::GET, "/api/visualization/cache/stats").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["strategy"], "in-memory");
    assert_eq!(body["entries"], 1);
    assert_eq!(body["hits"], 1);
}

#[tokio::test]
async fn test_health_route() {
    let (app, _) = app(StubStore::default(), StubReducer::default());
    let (status, body) = send(&app, Method::GET, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
