//! In-memory notification record store using DashMap.
//!
//! State is lost on restart; intended for development and tests.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use super::store::{NotificationRecord, NotificationRecordStore, StatusUpdate, StoreError};

/// In-memory record store keyed by external ID.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: DashMap<String, NotificationRecord>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl NotificationRecordStore for MemoryRecordStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn insert(&self, record: NotificationRecord) -> Result<bool, StoreError> {
        match self.records.entry(record.external_id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Ok(false),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(true)
            }
        }
    }

    async fn get(&self, external_id: &str) -> Result<Option<NotificationRecord>, StoreError> {
        Ok(self.records.get(external_id).map(|r| r.clone()))
    }

    async fn apply_status(&self, update: &StatusUpdate) -> Result<bool, StoreError> {
        // The shard write lock is held for the check and the write
        let Some(mut record) = self.records.get_mut(&update.external_id) else {
            return Ok(false);
        };
        Ok(record.apply(update, Utc::now()))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
