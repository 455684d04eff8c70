use crate::config::CorsConfig;
use crate::visualization::VisualizationService;
use crate::Result;
use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use std::future::Future;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub struct ApiServer {
    service: Arc<VisualizationService>,
    cors_config: CorsConfig,
}

impl ApiServer {
    pub fn new(service: Arc<VisualizationService>) -> Self {
        Self::with_cors(service, CorsConfig::default())
    }

    pub fn with_cors(service: Arc<VisualizationService>, cors_config: CorsConfig) -> Self {
        Self {
            service,
            cors_config,
        }
    }

    /// Build CORS layer from configuration
    fn build_cors_layer(&self) -> CorsLayer {
        if !self.cors_config.enabled {
            return CorsLayer::new();
        }

        let origins: Vec<HeaderValue> = self
            .cors_config
            .origins
            .iter()
            .filter(|o| o.as_str() != "*")
            .filter_map(|o| o.parse().ok())
            .collect();

        let has_wildcard = self.cors_config.origins.iter().any(|o| o == "*");

        let cors = if has_wildcard {
            CorsLayer::new().allow_origin(tower_http::cors::Any)
        } else if origins.is_empty() {
            CorsLayer::new()
        } else {
            CorsLayer::new().allow_origin(origins)
        };

        cors.allow_methods([Method::GET, Method::DELETE, Method::OPTIONS])
            .allow_headers(tower_http::cors::Any)
    }

    pub fn router(&self) -> Router {
        let routes = Router::new()
            .route(
                "/api/visualization/scatter",
                get(crate::api::routes::get_scatter),
            )
            .route(
                "/api/visualization/cache",
                axum::routing::delete(crate::api::routes::clear_cache),
            )
            .route(
                "/api/visualization/cache/stats",
                get(crate::api::routes::cache_stats),
            )
            .route("/health", get(crate::api::routes::health))
            .with_state(self.service.clone());

        routes
            .layer(self.build_cors_layer())
            .layer(TraceLayer::new_for_http())
    }

    /// Serve until `shutdown` resolves, then release the cache connection
    pub async fn serve<F>(self, addr: &str, extra: Router, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Server listening on {}", addr);

        let app = self.router().merge(extra);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        self.service.disconnect().await;
        tracing::info!("Server stopped");
        Ok(())
    }
}
