pub mod cache;
pub mod scatter;

pub use cache::{run_cache_clear, run_cache_stats};
pub use scatter::run_scatter;

/// Turn a non-2xx response into an error carrying status and body
pub(crate) async fn check(resp: reqwest::Response) -> anyhow::Result<reqwest::Response> {
    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("Request failed ({}): {}", status, body);
    }
    Ok(resp)
}
