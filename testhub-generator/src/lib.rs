//! # testhub-generator
//!
//! The generation seam of the Testing Hub: [`GenerationAdapter`] is the
//! contract the reconciliation engine calls to populate test artifacts, and
//! [`SchemaSampler`] is an offline, deterministic implementation of it.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use serde_json::json;
//! use testhub_generator::{EntitySchema, GenerationRequest, SchemaSampler};
//!
//! let request = GenerationRequest::new(
//!     "Invoices",
//!     vec![EntitySchema::new("Invoice", json!({ "properties": { "total": { "type": "number" } } }))],
//! );
//! if let Ok(data) = SchemaSampler::new().sample(&request) {
//!     println!("{} invoice records", data["Invoice"].len());
//! }
//! ```

pub mod adapter;
pub mod error;
pub mod sampler;

pub use adapter::{EntitySchema, GenerationAdapter, GenerationRequest, DEFAULT_RECORDS_PER_ENTITY};
pub use error::GenerateError;
pub use sampler::SchemaSampler;
