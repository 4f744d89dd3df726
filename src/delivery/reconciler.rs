//! Applies provider status callbacks to persisted records.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::metrics::DeliveryMetrics;

use super::provider::ProviderAdapter;
use super::store::{NotificationRecordStore, StatusUpdate};

/// Counters for one callback body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    /// Status reports found in the body
    pub found: usize,
    /// Reports with a recognized status whose conditional write completed
    pub processed: usize,
    /// Writes that matched a record and changed it
    pub applied: usize,
    /// Writes that matched nothing (unknown ID or already further along)
    pub skipped: usize,
    /// Reports with a status code the provider adapter does not map
    pub ignored: usize,
    /// Writes that failed in the store
    pub errors: usize,
}

/// Shared reconciliation loop, parametrized by a [`ProviderAdapter`].
#[derive(Clone)]
pub struct Reconciler {
    store: Arc<dyn NotificationRecordStore>,
}

impl Reconciler {
    pub fn new(store: Arc<dyn NotificationRecordStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn NotificationRecordStore> {
        &self.store
    }

    /// Process every status report in `body`.
    ///
    /// Never fails: store errors are logged and counted so the caller can
    /// always acknowledge the callback.
    pub async fn reconcile(
        &self,
        adapter: &dyn ProviderAdapter,
        body: &Value,
        received_at: DateTime<Utc>,
    ) -> ReconcileOutcome {
        let started = Instant::now();
        let provider = adapter.name();
        let reports = adapter.extract(body);
        let mut outcome = ReconcileOutcome {
            found: reports.len(),
            ..Default::default()
        };

        for raw in reports {
            let Some(status) = adapter.map_status(&raw.code) else {
                tracing::debug!(
                    provider = provider,
                    external_id = %raw.external_id,
                    code = ?raw.code,
                    "Ignoring unmapped status code"
                );
                outcome.ignored += 1;
                continue;
            };

            let update = StatusUpdate {
                occurred_at: raw.occurred_at(received_at),
                external_id: raw.external_id,
                status,
                error_message: raw.error_message,
            };

            match self.store.apply_status(&update).await {
                Ok(true) => {
                    outcome.processed += 1;
                    outcome.applied += 1;
                    DeliveryMetrics::record_applied(provider, status);
                    tracing::info!(
                        provider = provider,
                        external_id = %update.external_id,
                        status = %status,
                        "Delivery status updated"
                    );
                }
                Ok(false) => {
                    outcome.processed += 1;
                    outcome.skipped += 1;
                    DeliveryMetrics::record_skipped(provider, status);
                    tracing::debug!(
                        provider = provider,
                        external_id = %update.external_id,
                        status = %status,
                        "No record eligible for status update"
                    );
                }
                Err(e) => {
                    outcome.errors += 1;
                    DeliveryMetrics::record_error(provider, status);
                    tracing::error!(
                        provider = provider,
                        external_id = %update.external_id,
                        status = %status,
                        error = %e,
                        "Failed to apply delivery status"
                    );
                }
            }
        }

        DeliveryMetrics::observe_reconcile(provider, started.elapsed().as_secs_f64());
        outcome
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::delivery::{
        DeliveryStatus, EvolutionAdapter, MemoryRecordStore, NotificationRecord, StoreError,
        WhatsAppCloudAdapter,
    };

    fn whatsapp_body(statuses: Value) -> Value {
        json!({ "entry": [ { "changes": [ { "value": { "statuses": statuses } } ] } ] })
    }

    async fn reconciler_with(records: &[(&str, DeliveryStatus)]) -> Reconciler {
        let store = Arc::new(MemoryRecordStore::new());
        for (id, status) in records {
            store
                .insert(NotificationRecord::new(*id, *status))
                .await
                .unwrap();
        }
        Reconciler::new(store)
    }

    #[tokio::test]
    async fn test_out_of_order_read_then_delivered() {
        let reconciler = reconciler_with(&[("wamid.1", DeliveryStatus::Sent)]).await;

        let read = whatsapp_body(json!([
            { "id": "wamid.1", "status": "read", "timestamp": "1700000100" }
        ]));
        let delivered = whatsapp_body(json!([
            { "id": "wamid.1", "status": "delivered", "timestamp": "1700000050" }
        ]));

        let first = reconciler
            .reconcile(&WhatsAppCloudAdapter, &read, Utc::now())
            .await;
        assert_eq!(first.applied, 1);

        let second = reconciler
            .reconcile(&WhatsAppCloudAdapter, &delivered, Utc::now())
            .await;
        assert_eq!(second.processed, 1);
        assert_eq!(second.skipped, 1);

        let record = reconciler.store().get("wamid.1").await.unwrap().unwrap();
        assert_eq!(record.status, DeliveryStatus::Read);
        assert_eq!(record.read_at.unwrap().timestamp(), 1_700_000_100);
        // Backfilled from the read event
        assert_eq!(record.delivered_at.unwrap().timestamp(), 1_700_000_100);
    }

    #[tokio::test]
    async fn test_all_reports_processed() {
        let reconciler = reconciler_with(&[
            ("a", DeliveryStatus::Sent),
            ("b", DeliveryStatus::Sent),
            ("c", DeliveryStatus::Processing),
        ])
        .await;

        let body = whatsapp_body(json!([
            { "id": "a", "status": "delivered" },
            { "id": "b", "status": "read" },
            { "id": "c", "status": "failed", "errors": [ { "title": "Re-engagement required" } ] },
            { "id": "d", "status": "read" },
            { "id": "a", "status": "sent" }
        ]));

        let outcome = reconciler
            .reconcile(&WhatsAppCloudAdapter, &body, Utc::now())
            .await;
        assert_eq!(
            outcome,
            ReconcileOutcome {
                found: 5,
                processed: 4,
                applied: 3,
                skipped: 1,
                ignored: 1,
                errors: 0,
            }
        );

        let store = reconciler.store();
        assert_eq!(store.get("a").await.unwrap().unwrap().status, DeliveryStatus::Delivered);
        assert_eq!(store.get("b").await.unwrap().unwrap().status, DeliveryStatus::Read);
        let failed = store.get("c").await.unwrap().unwrap();
        assert_eq!(failed.status, DeliveryStatus::Failed);
        assert_eq!(failed.error_message.as_deref(), Some("Re-engagement required"));
        assert!(store.get("d").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_timestamp_uses_received_at() {
        let reconciler = reconciler_with(&[("m1", DeliveryStatus::Sent)]).await;
        let received = Utc.with_ymd_and_hms(2026, 3, 9, 12, 0, 0).unwrap();

        let body = json!({
            "event": "messages.update",
            "data": { "key": { "id": "m1" }, "status": "DELIVERY_ACK" }
        });
        reconciler
            .reconcile(&EvolutionAdapter, &body, received)
            .await;

        let record = reconciler.store().get("m1").await.unwrap().unwrap();
        assert_eq!(record.delivered_at, Some(received));
    }

    struct BrokenStore;

    #[async_trait]
    impl NotificationRecordStore for BrokenStore {
        fn backend_name(&self) -> &'static str {
            "broken"
        }

        async fn insert(&self, _record: NotificationRecord) -> Result<bool, StoreError> {
            Err(StoreError::Unavailable("down".to_string()))
        }

        async fn get(&self, _external_id: &str) -> Result<Option<NotificationRecord>, StoreError> {
            Err(StoreError::Unavailable("down".to_string()))
        }

        async fn apply_status(&self, _update: &StatusUpdate) -> Result<bool, StoreError> {
            Err(StoreError::Unavailable("down".to_string()))
        }

        async fn health_check(&self) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("down".to_string()))
        }
    }

    #[tokio::test]
    async fn test_store_errors_are_counted_not_raised() {
        let reconciler = Reconciler::new(Arc::new(BrokenStore));
        let body = whatsapp_body(json!([
            { "id": "a", "status": "read" },
            { "id": "b", "status": "delivered" }
        ]));

        let outcome = reconciler
            .reconcile(&WhatsAppCloudAdapter, &body, Utc::now())
            .await;
        assert_eq!(outcome.found, 2);
        assert_eq!(outcome.errors, 2);
        assert_eq!(outcome.processed, 0);
    }
}
