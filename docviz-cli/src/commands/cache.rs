use anyhow::Result;

fn cache_url(api_url: &str) -> String {
    format!("{}/api/visualization/cache", api_url.trim_end_matches('/'))
}

/// Show cache statistics reported by the server
pub async fn run_cache_stats(api_url: &str) -> Result<()> {
    let resp = reqwest::get(format!("{}/stats", cache_url(api_url))).await?;
    let body: serde_json::Value = super::check(resp).await?.json().await?;

    println!("Visualization Cache");
    println!("===================");
    println!(
        "Strategy: {}",
        body.get("strategy").and_then(|v| v.as_str()).unwrap_or("?")
    );
    println!(
        "Entries:  {}",
        body.get("entries").and_then(|v| v.as_u64()).unwrap_or(0)
    );

    if let Some(details) = body.as_object() {
        for (key, value) in details {
            if key == "strategy" || key == "entries" {
                continue;
            }
            println!("{:<9} {}", format!("{}:", key), value);
        }
    }

    Ok(())
}

/// Drop the cached visualization on the server
pub async fn run_cache_clear(api_url: &str) -> Result<()> {
    let resp = reqwest::Client::new()
        .delete(cache_url(api_url))
        .send()
        .await?;
    super::check(resp).await?;

    println!("Visualization cache cleared");
    Ok(())
}
