// Infrastructure layer (shared components)
pub mod infrastructure;

pub use infrastructure::metrics;
pub use infrastructure::postgres;

// Configuration and errors
pub mod config;
pub mod error;

// Domain layer (business logic)
pub mod delivery;
pub mod template;

// Application layer
pub mod api;
pub mod server;
pub mod triggers;

// Supporting modules
pub mod telemetry;
