use std::sync::Arc;
use std::time::Instant;

use crate::config::Settings;
use crate::delivery::{NotificationRecordStore, Reconciler};
use crate::postgres::PostgresPool;
use crate::template::{create_template_store, TemplateStore};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub template_store: Arc<TemplateStore>,
    pub record_store: Arc<dyn NotificationRecordStore>,
    pub reconciler: Arc<Reconciler>,
    pub postgres_pool: Option<PostgresPool>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        settings: Settings,
        record_store: Arc<dyn NotificationRecordStore>,
        postgres_pool: Option<PostgresPool>,
    ) -> Self {
        let reconciler = Arc::new(Reconciler::new(record_store.clone()));

        Self {
            settings: Arc::new(settings),
            template_store: create_template_store(),
            record_store,
            reconciler,
            postgres_pool,
            start_time: Instant::now(),
        }
    }
}
