//! Error types for testhub-generator.

use thiserror::Error;

/// All errors a generation adapter can report.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The backing generator could not be reached or refused the call.
    #[error("generator unavailable: {0}")]
    Unavailable(String),

    /// The call did not complete in time.
    #[error("generation timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// An entity schema could not be interpreted.
    #[error("invalid schema for entity '{entity}': {reason}")]
    InvalidSchema { entity: String, reason: String },

    /// The generator answered with something that is not entity → records.
    #[error("malformed generator response: {0}")]
    Malformed(String),

    #[error("generator JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
