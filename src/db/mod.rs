//! Database layer for mpp-db.
//!
//! Handles SQLite connection acquisition, schema creation, and row types.

mod connection;
pub mod schema;

pub use connection::{Connection, ConnectionProvider, DbTarget};
pub use schema::{ProjectRow, Schema, TaskRow};
