#![forbid(unsafe_code)]

//! Core domain model and business logic for liftlog.
//!
//! This crate provides:
//! - Domain types (set entries, the workout log)
//! - Unit conversion and derived metrics (1RM, summary, progress series)
//! - The tracker: exercise/set/unit operations with persistence
//! - Persistence backends, backup import/export
//! - Configuration and logging setup

pub mod types;
pub mod error;
pub mod units;
pub mod metrics;
pub mod schema;
pub mod ids;
pub mod persist;
pub mod export;
pub mod tracker;
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use units::Unit;
pub use metrics::{ComparisonMetric, HistoryRow, SeriesPoint, Summary};
pub use ids::{IdGenerator, SequentialIds, UuidIds};
pub use persist::{BlobStore, FileBlobStore, MemoryBlobStore, StoreLock};
pub use tracker::{Confirm, DeleteOutcome, Tracker, TrackerDefaults, DATA_KEY};
pub use config::Config;
