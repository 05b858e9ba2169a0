use std::path::PathBuf;

use thiserror::Error;

/// Failures raised while loading, transforming or saving stat documents.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("file not found: {}", path.display())]
    MissingFile { path: PathBuf },

    #[error("malformed document at `{container}`: entry `{entry}` has no numeric `{field}`")]
    MalformedDocument {
        container: String,
        entry: String,
        field: String,
    },

    #[error("unsupported timezone: {0}")]
    UnsupportedTimezone(String),

    #[error("duplicate rename key `{0}`")]
    DuplicateRename(String),

    #[error("rename label `{label}` of `{code}` is also a code")]
    ChainedRename { code: String, label: String },

    #[error("json encode/decode failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TransformError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_missing_file(&self) -> bool {
        matches!(self, Self::MissingFile { .. })
    }
}

pub type TransformResult<T> = Result<T, TransformError>;
