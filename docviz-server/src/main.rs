use anyhow::Result;
use axum::{routing::get, Router};
use clap::Parser;
use docviz::config::ObservabilityConfig;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "docviz-server")]
#[command(about = "Serves cached 2D scatter projections of a document collection")]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "docviz.toml")]
    config: String,

    /// Address to bind to, overrides server.bind_addr
    #[arg(long, env = "DOCVIZ_BIND")]
    bind: Option<String>,
}

fn init_tracing(observability: &ObservabilityConfig) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| observability.log_level.clone()),
    );
    let registry = tracing_subscriber::registry().with(filter);

    if observability.log_format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = docviz::Config::load_or_create(std::path::Path::new(&args.config))?;
    config.apply_env_overrides()?;
    init_tracing(&config.observability);

    tracing::info!("Config file: {}", args.config);

    let mut extra = Router::new();
    if config.observability.metrics_enabled {
        let handle = PrometheusBuilder::new().install_recorder()?;
        extra = extra.route("/metrics", get(move || std::future::ready(handle.render())));
    }

    let service = Arc::new(docviz::VisualizationService::from_config(&config)?);
    let server = docviz::api::ApiServer::with_cors(service, config.server.cors.clone());

    let addr = args.bind.unwrap_or_else(|| config.server.bind_addr.clone());
    tracing::info!("Starting docviz server on {}", addr);

    server.serve(&addr, extra, shutdown_signal()).await?;

    Ok(())
}
