//! # testhub-sync
//!
//! Reconciliation engine for the Testing Hub: joins playground working
//! copies to their test artifacts by [`SourceKey`](testhub_core::SourceKey),
//! derives sync status against the template library, versions generated
//! test data, and drives the bulk operations.
//!
//! Entry point is [`TestingHub`]. Everything under [`view`], [`status`],
//! [`versioning`] and [`diff`] is pure and usable without a hub.

pub mod diff;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod progress;
pub mod rate_limit;
pub mod status;
pub mod versioning;
pub mod view;

pub use diff::SnapshotDiff;
pub use engine::{HubSettings, TestingHub};
pub use error::HubError;
pub use progress::{BatchSummary, CancelToken, Progress, SyncOutcome};
pub use rate_limit::{FixedDelay, NoDelay, RateLimiter, TokenBucket};
pub use status::format_datetime_age;
pub use view::{Item, Stats};
