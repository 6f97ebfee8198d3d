//! The generation seam: what the engine asks for and what it gets back.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use testhub_core::EntityData;

use crate::error::GenerateError;

/// Records requested per entity unless configured otherwise.
pub const DEFAULT_RECORDS_PER_ENTITY: usize = 3;

/// One entity to populate, with its JSON schema (`Value::Null` when unknown).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySchema {
    pub name: String,
    #[serde(default)]
    pub schema: Value,
}

impl EntitySchema {
    pub fn new(name: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }
}

/// A single generation call: every entity of one template at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub template_name: String,
    pub entities: Vec<EntitySchema>,
    pub records_per_entity: usize,
}

impl GenerationRequest {
    pub fn new(template_name: impl Into<String>, entities: Vec<EntitySchema>) -> Self {
        Self {
            template_name: template_name.into(),
            entities,
            records_per_entity: DEFAULT_RECORDS_PER_ENTITY,
        }
    }

    pub fn with_records_per_entity(mut self, count: usize) -> Self {
        self.records_per_entity = count;
        self
    }
}

/// Produces synthetic records for a template's entities.
///
/// Implementations may return more or fewer records than requested; callers
/// accept the result as-is. Failures are per call and carry no retry contract.
#[async_trait]
pub trait GenerationAdapter: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<EntityData, GenerateError>;
}
