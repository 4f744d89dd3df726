mod settings;

pub use settings::{
    ApiConfig, DatabaseConfig, OtelConfig, ServerConfig, Settings, StoreConfig, WebhookConfig,
};
