//! findmerge library crate — re-exports for integration tests.
//!
//! The primary interface is the `findmerge` binary. This lib.rs exposes the
//! reconciliation engine so that integration tests can exercise coercion,
//! scoring, matching, and merge resolution directly without going through
//! the CLI.

pub mod config;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod merge;
pub mod model;
pub mod ports;
pub mod redact;
pub mod renumber;
pub mod score;
pub mod telemetry;

pub use config::ReconcileConfig;
pub use engine::{reconcile, ReconcileOutput, ReconcileReport};
pub use error::ReconcileError;
pub use model::Finding;
