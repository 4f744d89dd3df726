//! Delivery status reconciliation.
//!
//! # Architecture
//!
//! - [`ProviderAdapter`]: how one provider shapes its callbacks
//!   ([`WhatsAppCloudAdapter`], [`EvolutionAdapter`])
//! - [`Reconciler`]: provider-agnostic loop turning reports into
//!   conditional status writes
//! - [`NotificationRecordStore`]: persistence seam
//!   ([`MemoryRecordStore`], [`PostgresRecordStore`])
//!
//! Use `create_record_store()` to build the backend selected in configuration.

mod evolution;
mod memory_store;
mod postgres_store;
mod provider;
mod reconciler;
mod status;
mod store;
mod whatsapp;

use std::sync::Arc;

use crate::config::StoreConfig;
use crate::postgres::PostgresPool;

pub use evolution::EvolutionAdapter;
pub use memory_store::MemoryRecordStore;
pub use postgres_store::PostgresRecordStore;
pub use provider::{ProviderAdapter, RawCode, RawStatus, RawTimestamp};
pub use reconciler::{ReconcileOutcome, Reconciler};
pub use status::DeliveryStatus;
pub use store::{NotificationRecord, NotificationRecordStore, StatusUpdate, StoreError};
pub use whatsapp::WhatsAppCloudAdapter;

/// Create a record store based on configuration.
///
/// - `"postgres"`: `PostgresRecordStore` if a pool is provided
/// - `"memory"` (default): `MemoryRecordStore`
pub fn create_record_store(
    settings: &StoreConfig,
    postgres_pool: Option<&PostgresPool>,
) -> Arc<dyn NotificationRecordStore> {
    match settings.backend.as_str() {
        "postgres" => {
            if let Some(pool) = postgres_pool {
                tracing::info!(
                    backend = "postgres",
                    database = %pool.database_url_masked(),
                    "Creating PostgreSQL record store"
                );
                Arc::new(PostgresRecordStore::new(pool.pool().clone()))
            } else {
                tracing::warn!(
                    "PostgreSQL record store requested but no pool provided, falling back to memory"
                );
                Arc::new(MemoryRecordStore::new())
            }
        }
        _ => {
            tracing::info!(backend = "memory", "Creating memory record store");
            Arc::new(MemoryRecordStore::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_falls_back_to_memory() {
        let settings = StoreConfig {
            backend: "postgres".to_string(),
        };
        assert_eq!(create_record_store(&settings, None).backend_name(), "memory");
        assert_eq!(
            create_record_store(&StoreConfig::default(), None).backend_name(),
            "memory"
        );
    }
}
