//! PostgreSQL-based notification record store.
//!
//! Status changes are a single `UPDATE ... WHERE external_id = $1 AND status = ANY($2)`
//! so the guard and the write happen atomically inside the database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::status::DeliveryStatus;
use super::store::{NotificationRecord, NotificationRecordStore, StatusUpdate, StoreError};

const UPDATE_DELIVERED: &str = r#"
    UPDATE notifications
    SET status = 'DELIVERED', delivered_at = $3, updated_at = $4
    WHERE external_id = $1 AND status = ANY($2)
"#;

const UPDATE_READ: &str = r#"
    UPDATE notifications
    SET status = 'READ', read_at = $3, delivered_at = COALESCE(delivered_at, $3), updated_at = $4
    WHERE external_id = $1 AND status = ANY($2)
"#;

const UPDATE_FAILED: &str = r#"
    UPDATE notifications
    SET status = 'FAILED', failed_at = $3, error_message = $5, updated_at = $4
    WHERE external_id = $1 AND status = ANY($2)
"#;

type RecordRow = (
    Uuid,
    String,
    String,
    Option<DateTime<Utc>>,
    Option<DateTime<Utc>>,
    Option<DateTime<Utc>>,
    Option<String>,
    DateTime<Utc>,
    DateTime<Utc>,
);

/// PostgreSQL-based record store.
///
/// Table structure (see `migrations/`):
/// - `notifications` - one row per dispatched message, unique on `external_id`
pub struct PostgresRecordStore {
    pool: PgPool,
}

impl PostgresRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_record(row: RecordRow) -> Result<NotificationRecord, StoreError> {
    let (id, external_id, status, delivered_at, read_at, failed_at, error_message, created_at, updated_at) =
        row;
    let status = status
        .parse::<DeliveryStatus>()
        .map_err(|reason| StoreError::Corrupt {
            external_id: external_id.clone(),
            reason,
        })?;

    Ok(NotificationRecord {
        id,
        external_id,
        status,
        delivered_at,
        read_at,
        failed_at,
        error_message,
        created_at,
        updated_at,
    })
}

#[async_trait]
impl NotificationRecordStore for PostgresRecordStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn insert(&self, record: NotificationRecord) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO notifications
                (id, external_id, status, delivered_at, read_at, failed_at, error_message, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (external_id) DO NOTHING
            "#,
        )
        .bind(record.id)
        .bind(&record.external_id)
        .bind(record.status.as_str())
        .bind(record.delivered_at)
        .bind(record.read_at)
        .bind(record.failed_at)
        .bind(&record.error_message)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn get(&self, external_id: &str) -> Result<Option<NotificationRecord>, StoreError> {
        let row: Option<RecordRow> = sqlx::query_as(
            r#"
            SELECT id, external_id, status, delivered_at, read_at, failed_at, error_message, created_at, updated_at
            FROM notifications
            WHERE external_id = $1
            "#,
        )
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_record).transpose()
    }

    async fn apply_status(&self, update: &StatusUpdate) -> Result<bool, StoreError> {
        let sql = match update.status {
            DeliveryStatus::Delivered => UPDATE_DELIVERED,
            DeliveryStatus::Read => UPDATE_READ,
            DeliveryStatus::Failed => UPDATE_FAILED,
            DeliveryStatus::Pending | DeliveryStatus::Processing | DeliveryStatus::Sent => {
                return Ok(false);
            }
        };

        let allowed: Vec<String> = update
            .status
            .allowed_predecessors()
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();

        let mut query = sqlx::query(sql)
            .bind(&update.external_id)
            .bind(allowed)
            .bind(update.occurred_at)
            .bind(Utc::now());
        if update.status == DeliveryStatus::Failed {
            query = query.bind(&update.error_message);
        }

        let result = query.execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_to_record() {
        let now = Utc::now();
        let record = row_to_record((
            Uuid::nil(),
            "wamid.1".to_string(),
            "DELIVERED".to_string(),
            Some(now),
            None,
            None,
            None,
            now,
            now,
        ))
        .unwrap();
        assert_eq!(record.status, DeliveryStatus::Delivered);
        assert_eq!(record.delivered_at, Some(now));
    }

    #[test]
    fn test_row_with_unknown_status_is_corrupt() {
        let now = Utc::now();
        let result = row_to_record((
            Uuid::nil(),
            "wamid.1".to_string(),
            "QUEUED".to_string(),
            None,
            None,
            None,
            None,
            now,
            now,
        ));
        assert!(matches!(result, Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn test_update_statements_guard_on_status() {
        for sql in [UPDATE_DELIVERED, UPDATE_READ, UPDATE_FAILED] {
            assert!(sql.contains("WHERE external_id = $1 AND status = ANY($2)"));
        }
        assert!(UPDATE_READ.contains("COALESCE(delivered_at, $3)"));
    }

    // The tests below need a PostgreSQL instance:
    // DATABASE_URL=postgres://... cargo test -- --ignored

    use std::sync::Arc;

    use chrono::TimeZone;
    use sqlx::postgres::PgPoolOptions;

    async fn connect() -> PostgresRecordStore {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = PgPoolOptions::new()
            .max_connections(8)
            .connect(&url)
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        PostgresRecordStore::new(pool)
    }

    async fn seed(store: &PostgresRecordStore, status: DeliveryStatus) -> String {
        let external_id = format!("wamid.test-{}", Uuid::new_v4());
        assert!(store
            .insert(NotificationRecord::new(external_id.clone(), status))
            .await
            .unwrap());
        external_id
    }

    fn update(external_id: &str, status: DeliveryStatus, secs: i64) -> StatusUpdate {
        StatusUpdate {
            external_id: external_id.to_string(),
            status,
            occurred_at: Utc.timestamp_opt(secs, 0).unwrap(),
            error_message: None,
        }
    }

    #[tokio::test]
    #[ignore]
    async fn test_read_then_late_delivered_keeps_read() {
        let store = connect().await;
        let id = seed(&store, DeliveryStatus::Sent).await;

        assert!(store
            .apply_status(&update(&id, DeliveryStatus::Read, 1_700_000_100))
            .await
            .unwrap());
        assert!(!store
            .apply_status(&update(&id, DeliveryStatus::Delivered, 1_700_000_000))
            .await
            .unwrap());
        assert!(!store
            .apply_status(&update(&id, DeliveryStatus::Read, 1_700_000_200))
            .await
            .unwrap());

        let record = store.get(&id).await.unwrap().unwrap();
        let read_at = Utc.timestamp_opt(1_700_000_100, 0).unwrap();
        assert_eq!(record.status, DeliveryStatus::Read);
        assert_eq!(record.read_at, Some(read_at));
        assert_eq!(record.delivered_at, Some(read_at));
    }

    #[tokio::test]
    #[ignore]
    async fn test_failed_records_message_and_unknown_id_is_noop() {
        let store = connect().await;
        let id = seed(&store, DeliveryStatus::Pending).await;

        let mut failed = update(&id, DeliveryStatus::Failed, 1_700_000_000);
        failed.error_message = Some("Message undeliverable".to_string());
        assert!(store.apply_status(&failed).await.unwrap());

        let record = store.get(&id).await.unwrap().unwrap();
        assert_eq!(record.status, DeliveryStatus::Failed);
        assert_eq!(record.error_message.as_deref(), Some("Message undeliverable"));

        assert!(!store
            .apply_status(&update("wamid.missing", DeliveryStatus::Read, 1_700_000_000))
            .await
            .unwrap());
    }

    #[tokio::test]
    #[ignore]
    async fn test_concurrent_out_of_order_updates_end_in_read() {
        let store = Arc::new(connect().await);
        let id = seed(&store, DeliveryStatus::Sent).await;

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            let id = id.clone();
            let status = if i % 2 == 0 {
                DeliveryStatus::Delivered
            } else {
                DeliveryStatus::Read
            };
            handles.push(tokio::spawn(async move {
                store
                    .apply_status(&update(&id, status, 1_700_000_000 + i))
                    .await
                    .unwrap()
            }));
        }
        let mut read_applied = 0;
        for (i, handle) in handles.into_iter().enumerate() {
            if handle.await.unwrap() && i % 2 == 1 {
                read_applied += 1;
            }
        }

        let record = store.get(&id).await.unwrap().unwrap();
        assert_eq!(record.status, DeliveryStatus::Read);
        assert_eq!(read_applied, 1);
        assert!(record.delivered_at.is_some());
    }
}
