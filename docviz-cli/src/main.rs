use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "docviz")]
#[command(about = "docviz CLI - document collection scatter plots")]
#[command(version)]
struct Cli {
    /// docviz server URL
    #[arg(long, global = true, env = "DOCVIZ_API_URL", default_value = "http://localhost:3080")]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch the scatter visualization and print a summary
    Scatter {
        /// Regenerate even if a cached result is valid
        #[arg(long)]
        force_refresh: bool,

        /// Max documents to visualize
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show cache statistics
    CacheStats,

    /// Clear the cached visualization
    CacheClear,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    tracing::debug!("Using API at {}", cli.api_url);

    match cli.command {
        Commands::Scatter {
            force_refresh,
            limit,
        } => commands::run_scatter(&cli.api_url, force_refresh, limit).await?,
        Commands::CacheStats => commands::run_cache_stats(&cli.api_url).await?,
        Commands::CacheClear => commands::run_cache_clear(&cli.api_url).await?,
    }

    Ok(())
}
