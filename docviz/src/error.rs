use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Vector store error: {0}")]
    Store(String),

    #[error("Reduction error: {0}")]
    Reduction(String),

    #[error("Invalid vector format for point {id}: {reason}")]
    VectorShape { id: String, reason: String },

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    pub(crate) fn shape(id: impl ToString, reason: impl Into<String>) -> Self {
        Self::VectorShape {
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(feature = "cache-redis")]
impl From<redis::RedisError> for Error {
    fn from(e: redis::RedisError) -> Self {
        Self::Cache(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
