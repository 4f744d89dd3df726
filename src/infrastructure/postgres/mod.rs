//! PostgreSQL persistence module.
//!
//! Provides connection pooling and schema migrations for the record store.

pub mod pool;

pub use pool::{PostgresPool, PostgresPoolError};
