//! # mpp-db - project schedule persistence
//!
//! Stores projects and their tasks in SQLite and reads them back. Optional
//! task fields map to NULL columns and durations are kept as a
//! `(value, unit)` column pair.

pub mod core;
pub mod db;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use crate::core::{
    DbConfig, Duration, ImportReport, Project, ProjectRepository, Task, TimeUnit,
    UnknownUnitPolicy, UpdateOutcome,
};
pub use error::{Error, Result};

pub use db::{Connection, ConnectionProvider};
