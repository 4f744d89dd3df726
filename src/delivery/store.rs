//! Backend trait for notification record storage.
//!
//! Reconciliation only ever touches records through [`NotificationRecordStore`],
//! so the memory and PostgreSQL implementations are interchangeable.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::status::DeliveryStatus;

/// Errors that can occur during record store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A stored status string did not match any known status
    #[error("Corrupt record {external_id}: {reason}")]
    Corrupt { external_id: String, reason: String },

    /// Backend is temporarily unavailable
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// Persisted lifecycle of one outbound message to one recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: Uuid,
    /// Provider message identifier, used to join status callbacks
    pub external_id: String,
    pub status: DeliveryStatus,
    pub delivered_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NotificationRecord {
    /// A freshly dispatched record.
    pub fn new(external_id: impl Into<String>, status: DeliveryStatus) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            external_id: external_id.into(),
            status,
            delivered_at: None,
            read_at: None,
            failed_at: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply `update` in place if the transition guard allows it.
    ///
    /// Returns `false` (and leaves the record untouched) otherwise.
    pub fn apply(&mut self, update: &StatusUpdate, now: DateTime<Utc>) -> bool {
        if !self.status.can_transition_to(update.status) {
            return false;
        }

        match update.status {
            DeliveryStatus::Delivered => {
                self.delivered_at = Some(update.occurred_at);
            }
            DeliveryStatus::Read => {
                self.read_at = Some(update.occurred_at);
                // A read message was necessarily delivered
                self.delivered_at.get_or_insert(update.occurred_at);
            }
            DeliveryStatus::Failed => {
                self.failed_at = Some(update.occurred_at);
                self.error_message = update.error_message.clone();
            }
            DeliveryStatus::Pending | DeliveryStatus::Processing | DeliveryStatus::Sent => {
                return false;
            }
        }

        self.status = update.status;
        self.updated_at = now;
        true
    }
}

/// One canonical status change reported by a provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusUpdate {
    pub external_id: String,
    pub status: DeliveryStatus,
    pub occurred_at: DateTime<Utc>,
    pub error_message: Option<String>,
}

/// Storage for notification records.
///
/// # Thread Safety
///
/// Implementations are shared across request handlers and must be `Send + Sync`.
///
/// # Atomicity
///
/// [`apply_status`](Self::apply_status) must be a single compare-and-set
/// write: "update the row with this external ID if its status is one of the
/// allowed predecessors". A read followed by a separate write would let two
/// near-simultaneous callbacks race.
#[async_trait]
pub trait NotificationRecordStore: Send + Sync {
    /// Backend type identifier ("memory", "postgres")
    fn backend_name(&self) -> &'static str;

    /// Persist a newly dispatched record.
    ///
    /// Returns `false` if a record with the same external ID already exists.
    async fn insert(&self, record: NotificationRecord) -> Result<bool, StoreError>;

    async fn get(&self, external_id: &str) -> Result<Option<NotificationRecord>, StoreError>;

    /// Conditionally apply a status change.
    ///
    /// Returns whether a record matched. An unknown external ID or a record that
    /// has already moved past the target status yields `Ok(false)`.
    async fn apply_status(&self, update: &StatusUpdate) -> Result<bool, StoreError>;

    /// Check that the backend can serve requests.
    async fn health_check(&self) -> Result<(), StoreError>;
}
