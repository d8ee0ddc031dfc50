use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot read corpus directory {path}: {source}")]
    CorpusDir {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("cannot read document {path}: {source}")]
    ReadDocument {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A persisted part is missing, corrupt, or belongs to another build.
    #[error("index cache is inconsistent: {0}")]
    CacheInconsistency(String),

    /// The query pipeline differs from the one the index was built with.
    #[error("preprocessor signature {query} does not match index signature {index}")]
    PipelineMismatch { index: String, query: String },

    #[error("preprocessing worker failed: {0}")]
    Worker(String),

    #[error("cannot start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("top_n must be at least 1")]
    InvalidTopN,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Encode(#[from] bincode::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
