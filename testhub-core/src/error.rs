//! Error types for testhub-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from store and config operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying I/O failure, annotated with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (write/save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load. Includes file path and line context from serde_yaml.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A config value parsed but is outside its allowed range.
    #[error("invalid config {path}: {reason}")]
    InvalidConfig { path: PathBuf, reason: String },

    /// `dirs::home_dir()` returned `None`; cannot locate `~/.testhub/`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    /// The referenced record id does not resolve in its collection.
    #[error("{collection} record '{id}' not found")]
    NotFound {
        collection: &'static str,
        id: String,
    },

    /// `create` was called with an id that already exists.
    #[error("{collection} record '{id}' already exists")]
    Conflict {
        collection: &'static str,
        id: String,
    },

    /// Remote or backend-specific failure that has no richer shape.
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Whether this error means "the id no longer resolves".
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Convenience constructor for [`StoreError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source,
    }
}
