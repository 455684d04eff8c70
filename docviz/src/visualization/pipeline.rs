//! Fetch, normalize, reduce, format
//!
//! One call to [`VisualizationPipeline::generate`] reads a bounded batch of
//! records from the vector store, resolves each record's vector to a flat
//! numeric sequence, projects the batch to 2D and zips the coordinates back
//! onto the records by position.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{Map, Value};

use super::{ProcessingTime, ScatterOptions, ScatterPoint, VisualizationMetadata, VisualizationResult};
use crate::clock::{self, Clock};
use crate::reduce::{ReductionParams, Reducer};
use crate::store::{ScrollRecord, ScrollRequest, VectorStore};
use crate::{Error, Result};

/// Max characters of content copied into a point's snippet
pub const SNIPPET_CHARS: usize = 150;

/// Named vector preferred when a record carries several
pub const DENSE_VECTOR_NAME: &str = "dense";

pub struct VisualizationPipeline {
    store: Arc<dyn VectorStore>,
    reducer: Arc<dyn Reducer>,
    collection: String,
    clock: Arc<dyn Clock>,
}

impl VisualizationPipeline {
    pub fn new(
        store: Arc<dyn VectorStore>,
        reducer: Arc<dyn Reducer>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            store,
            reducer,
            collection: collection.into(),
            clock: clock::system(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Build a visualization from scratch.
    ///
    /// Any store, shape or reducer failure aborts the whole generation.
    pub async fn generate(&self, options: &ScatterOptions) -> Result<VisualizationResult> {
        match self.run(options).await {
            Ok(result) => {
                metrics::counter!("docviz_generations_total").increment(1);
                Ok(result)
            }
            Err(e) => {
                metrics::counter!("docviz_generation_failures_total").increment(1);
                tracing::error!("Visualization generation failed for '{}': {}", self.collection, e);
                Err(e)
            }
        }
    }

    async fn run(&self, options: &ScatterOptions) -> Result<VisualizationResult> {
        let started = Instant::now();
        let method = self.reducer.method().to_string();

        let info = self.store.collection_info(&self.collection).await?;
        let total = info.points_count;
        tracing::info!("Collection '{}' has {} points", self.collection, total);

        if total == 0 {
            return Ok(VisualizationResult::empty(0, &method, self.clock.now()));
        }

        let fetch_limit = usize::try_from(total)
            .unwrap_or(usize::MAX)
            .min(options.effective_limit());
        if fetch_limit == 0 {
            return Ok(VisualizationResult::empty(total, &method, self.clock.now()));
        }

        tracing::info!("Fetching vectors (limit: {})", fetch_limit);
        let mut records = self
            .store
            .scroll(&self.collection, ScrollRequest::full(fetch_limit))
            .await?
            .points;
        records.truncate(fetch_limit);
        tracing::info!("Fetched {} points", records.len());

        if records.is_empty() {
            return Ok(VisualizationResult::empty(total, &method, self.clock.now()));
        }

        let vectors = resolve_vectors(&records)?;
        tracing::debug!("Vector dimensions: {}D", vectors[0].len());

        let params = ReductionParams::for_points(records.len());
        tracing::info!(
            "Running {} reduction (n_neighbors: {}, min_dist: {})",
            method,
            params.n_neighbors,
            params.min_dist
        );
        let reduce_started = Instant::now();
        let coords = self.reducer.fit(&params, vectors).await?;
        let reduction = reduce_started.elapsed();
        metrics::histogram!("docviz_reduction_duration_seconds").record(reduction.as_secs_f64());
        tracing::info!("{} complete in {}ms", method, reduction.as_millis());

        if coords.len() != records.len() {
            return Err(Error::Reduction(format!(
                "Reducer returned {} coordinates for {} records",
                coords.len(),
                records.len()
            )));
        }

        let points: Vec<ScatterPoint> = records
            .iter()
            .zip(coords)
            .map(|(record, [x, y])| format_point(record, x, y))
            .collect();

        Ok(VisualizationResult {
            metadata: VisualizationMetadata {
                total_documents: total,
                visualized_documents: points.len(),
                generated_at: self.clock.now(),
                method,
                parameters: Some(params),
                processing_time: Some(ProcessingTime {
                    reduction_ms: millis(reduction),
                    total_ms: millis(started.elapsed()),
                }),
            },
            points,
        })
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Resolve every record's vector and check they share one dimensionality
pub fn resolve_vectors(records: &[ScrollRecord]) -> Result<Vec<Vec<f32>>> {
    let vectors = records
        .iter()
        .map(resolve_vector)
        .collect::<Result<Vec<_>>>()?;

    if let Some(first) = vectors.first() {
        let dims = first.len();
        if let Some((record, v)) = records
            .iter()
            .zip(&vectors)
            .find(|(_, v)| v.len() != dims)
        {
            return Err(Error::shape(
                &record.id,
                format!("expected {} dimensions, got {}", dims, v.len()),
            ));
        }
    }
    Ok(vectors)
}

/// Flatten one record's vector.
///
/// Accepts a plain numeric array, or a map of named vectors where `dense`
/// wins and otherwise the first entry is used.
pub fn resolve_vector(record: &ScrollRecord) -> Result<Vec<f32>> {
    let value = match &record.vector {
        None | Some(Value::Null) => return Err(Error::shape(&record.id, "missing vector")),
        Some(v @ Value::Array(_)) => v,
        Some(Value::Object(named)) => named
            .get(DENSE_VECTOR_NAME)
            .or_else(|| named.values().next())
            .ok_or_else(|| Error::shape(&record.id, "named-vector map is empty"))?,
        Some(_) => return Err(Error::shape(&record.id, "unsupported vector type")),
    };

    let components = value
        .as_array()
        .ok_or_else(|| Error::shape(&record.id, "vector is not a numeric array"))?;
    if components.is_empty() {
        return Err(Error::shape(&record.id, "vector is empty"));
    }

    components
        .iter()
        .map(|c| {
            c.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| Error::shape(&record.id, "vector has a non-numeric component"))
        })
        .collect()
}

fn field<'a>(payload: Option<&'a Map<String, Value>>, name: &str) -> Option<&'a Value> {
    payload.and_then(|p| p.get(name)).filter(|v| !v.is_null())
}

/// Non-empty string field. Empty strings count as absent.
fn text(payload: Option<&Map<String, Value>>, name: &str) -> Option<String> {
    field(payload, name)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Build the display point for one record at `(x, y)`
pub fn format_point(record: &ScrollRecord, x: f64, y: f64) -> ScatterPoint {
    let payload = record.payload.as_ref();

    let tags = field(payload, "tags")
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let snippet = field(payload, "content")
        .and_then(Value::as_str)
        .map(|content| content.chars().take(SNIPPET_CHARS).collect())
        .unwrap_or_default();

    ScatterPoint {
        id: record.id.clone(),
        x,
        y,
        title: text(payload, "title")
            .or_else(|| text(payload, "filename"))
            .unwrap_or_else(|| format!("Document {}", record.id)),
        category: text(payload, "category").unwrap_or_else(|| "Unknown".to_string()),
        location: field(payload, "location").cloned(),
        tags,
        pii_risk: text(payload, "pii_risk_level").unwrap_or_else(|| "none".to_string()),
        date: field(payload, "upload_date").cloned(),
        snippet,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::PointId;
    use serde_json::json;

    fn record(id: u64, vector: Value, payload: Value) -> ScrollRecord {
        serde_json::from_value(json!({"id": id, "vector": vector, "payload": payload})).unwrap()
    }

    #[test]
    fn test_resolve_plain_vector() {
        let r = record(1, json!([0.5, 1, -2]), json!({}));
        assert_eq!(resolve_vector(&r).unwrap(), vec![0.5, 1.0, -2.0]);
    }

    #[test]
    fn test_resolve_prefers_dense() {
        let r = record(1, json!({"sparse": [9.0], "dense": [1.0, 2.0]}), json!({}));
        assert_eq!(resolve_vector(&r).unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_resolve_falls_back_to_first_named() {
        let r = record(1, json!({"title_vec": [3.0, 4.0], "body_vec": [5.0, 6.0]}), json!({}));
        assert_eq!(resolve_vector(&r).unwrap(), vec![3.0, 4.0]);
    }

    #[test]
    fn test_resolve_rejects_bad_shapes() {
        let missing: ScrollRecord = serde_json::from_value(json!({"id": 3})).unwrap();
        let cases = [
            missing,
            record(4, json!({}), json!({})),
            record(5, json!([]), json!({})),
            record(6, json!("0.1,0.2"), json!({})),
            record(7, json!([0.1, "x"]), json!({})),
            record(8, json!({"sparse": {"indices": [1], "values": [0.2]}}), json!({})),
        ];

        for r in &cases {
            match resolve_vector(r) {
                Err(Error::VectorShape { id, .. }) => assert_eq!(id, r.id.to_string()),
                other => panic!("expected shape error for {}, got {:?}", r.id, other),
            }
        }
    }

    #[test]
    fn test_resolve_vectors_requires_uniform_dims() {
        let records = vec![
            record(1, json!([0.0, 0.0]), json!({})),
            record(2, json!([0.0, 0.0, 0.0]), json!({})),
        ];
        let err = resolve_vectors(&records).unwrap_err();
        assert!(matches!(err, Error::VectorShape { ref id, .. } if id == "2"));
    }

    #[test]
    fn test_format_point_defaults() {
        let r = record(9, json!([0.0]), json!({}));
        let p = format_point(&r, 1.5, -2.5);

        assert_eq!(p.id, PointId::Num(9));
        assert_eq!((p.x, p.y), (1.5, -2.5));
        assert_eq!(p.title, "Document 9");
        assert_eq!(p.category, "Unknown");
        assert_eq!(p.pii_risk, "none");
        assert!(p.tags.is_empty());
        assert!(p.location.is_none());
        assert!(p.date.is_none());
        assert_eq!(p.snippet, "");
    }

    #[test]
    fn test_format_point_title_fallbacks() {
        let with_filename = record(1, json!([0.0]), json!({"title": "", "filename": "a.pdf"}));
        assert_eq!(format_point(&with_filename, 0.0, 0.0).title, "a.pdf");

        let with_title = record(1, json!([0.0]), json!({"title": "Report", "filename": "a.pdf"}));
        assert_eq!(format_point(&with_title, 0.0, 0.0).title, "Report");

        let without_payload: ScrollRecord =
            serde_json::from_value(json!({"id": "abc", "vector": [0.0]})).unwrap();
        assert_eq!(format_point(&without_payload, 0.0, 0.0).title, "Document abc");
    }

    #[test]
    fn test_format_point_payload_fields() {
        let content = "é".repeat(200);
        let r = record(
            2,
            json!([0.0]),
            json!({
                "category": "Legal",
                "location": "Oslo",
                "tags": ["contract", 7, "nda"],
                "pii_risk_level": "high",
                "upload_date": "2024-03-01",
                "content": content,
            }),
        );
        let p = format_point(&r, 0.0, 0.0);

        assert_eq!(p.category, "Legal");
        assert_eq!(p.location, Some(json!("Oslo")));
        assert_eq!(p.tags, vec!["contract", "nda"]);
        assert_eq!(p.pii_risk, "high");
        assert_eq!(p.date, Some(json!("2024-03-01")));
        assert_eq!(p.snippet.chars().count(), SNIPPET_CHARS);
    }
}
