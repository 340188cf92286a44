use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[cfg(feature = "lancedb")]
    #[error("lancedb error: {0}")]
    Lance(#[from] ::lancedb::Error),

    #[error("embedding dimension mismatch: partition has {expected}, got {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("{0}")]
    Other(String),
}
