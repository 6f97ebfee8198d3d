//! Error types for testhub-sync.

use thiserror::Error;

use testhub_core::StoreError;
use testhub_generator::GenerateError;

/// All errors that can arise from reconciliation operations.
///
/// Single-item operations return these directly. Bulk operations never
/// return a per-item error; they count it and move on.
#[derive(Debug, Error)]
pub enum HubError {
    /// The generation adapter failed for one item.
    #[error("test data generation failed for '{item}': {source}")]
    Adapter {
        item: String,
        #[source]
        source: GenerateError,
    },

    /// A referenced artifact, working copy or template no longer resolves.
    #[error("{what} '{id}' not found")]
    NotFound { what: &'static str, id: String },

    /// The request was rejected before any store call.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Generic persistence failure.
    #[error("store error: {0}")]
    Store(#[source] StoreError),
}

impl HubError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        HubError::Validation(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, HubError::NotFound { .. })
    }
}

impl From<StoreError> for HubError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { collection, id } => HubError::NotFound {
                what: collection,
                id,
            },
            other => HubError::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_not_found_maps_to_not_found() {
        let err: HubError = StoreError::NotFound {
            collection: "test_artifacts",
            id: "a1".into(),
        }
        .into();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "test_artifacts 'a1' not found");
    }

    #[test]
    fn other_store_errors_stay_store_errors() {
        let err: HubError = StoreError::Backend("503".into()).into();
        assert!(matches!(err, HubError::Store(_)));
    }

    #[test]
    fn adapter_error_names_the_item() {
        let err = HubError::Adapter {
            item: "Invoices".into(),
            source: GenerateError::Unavailable("rate limited".into()),
        };
        assert!(err.to_string().contains("'Invoices'"));
    }
}
