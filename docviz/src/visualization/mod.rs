//! Scatter-plot visualization of a document collection

mod key;
mod pipeline;
mod service;
mod types;

pub use key::{KeyStrategy, SCATTER_CACHE_KEY};
pub use pipeline::{
    format_point, resolve_vector, resolve_vectors, VisualizationPipeline, DENSE_VECTOR_NAME,
    SNIPPET_CHARS,
};
pub use service::VisualizationService;
pub use types::{
    ProcessingTime, ScatterOptions, ScatterPoint, ScatterResponse, VisualizationMetadata,
    VisualizationResult, DEFAULT_LIMIT,
};
