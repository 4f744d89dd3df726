//! Infrastructure layer modules
//!
//! - `metrics`: Prometheus metrics helpers
//! - `postgres`: PostgreSQL connection pool and migrations

pub mod metrics;
pub mod postgres;
