use anyhow::Result;
use docviz::ScatterResponse;

/// Fetch scatter data from a running server and print a summary
pub async fn run_scatter(api_url: &str, force_refresh: bool, limit: Option<usize>) -> Result<()> {
    let url = format!("{}/api/visualization/scatter", api_url.trim_end_matches('/'));

    let mut query = vec![("forceRefresh", force_refresh.to_string())];
    if let Some(limit) = limit {
        query.push(("limit", limit.to_string()));
    }

    let resp = reqwest::Client::new().get(&url).query(&query).send().await?;
    let body: ScatterResponse = super::check(resp).await?.json().await?;
    let meta = &body.result.metadata;

    println!("Scatter Visualization");
    println!("=====================");
    println!("Method:      {}", meta.method);
    println!(
        "Documents:   {} of {} visualized",
        meta.visualized_documents, meta.total_documents
    );
    println!("Generated:   {}", meta.generated_at.to_rfc3339());
    if let Some(params) = &meta.parameters {
        println!(
            "Parameters:  n_neighbors={} min_dist={} spread={}",
            params.n_neighbors, params.min_dist, params.spread
        );
    }
    if let Some(timing) = &meta.processing_time {
        println!(
            "Timing:      reduction {}ms, total {}ms",
            timing.reduction_ms, timing.total_ms
        );
    }
    match (body.from_cache, body.cache_age_ms, body.generation_time_ms) {
        (true, Some(age), _) => println!("Source:      cache (age {}s)", age / 1000),
        (_, _, Some(took)) => println!("Source:      generated in {}ms", took),
        _ => println!("Source:      {}", if body.from_cache { "cache" } else { "generated" }),
    }

    if !body.result.points.is_empty() {
        println!();
        println!("{:<38} {:>10} {:>10} {:<16} TITLE", "ID", "X", "Y", "CATEGORY");
        println!("{}", "-".repeat(90));
        for point in body.result.points.iter().take(20) {
            println!(
                "{:<38} {:>10.3} {:>10.3} {:<16} {}",
                point.id.to_string(),
                point.x,
                point.y,
                point.category,
                point.title
            );
        }
        if body.result.points.len() > 20 {
            println!("... {} more", body.result.points.len() - 20);
        }
    }

    Ok(())
}
