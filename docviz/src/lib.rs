pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod reduce;
pub mod store;
pub mod visualization;

pub use config::Config;
pub use error::{Error, Result};
pub use visualization::{ScatterOptions, ScatterResponse, VisualizationService};
