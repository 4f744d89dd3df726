use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Deserializer};
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub webhooks: WebhookConfig,
    #[serde(default)]
    pub store: StoreConfig,
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub otel: OtelConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// A list in config files, or a comma-separated string in the environment
    #[serde(default, deserialize_with = "list_or_csv")]
    pub cors_origins: Vec<String>,
}

/// Admin API configuration (template management).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
    pub key: Option<String>,
}

/// Shared secrets for inbound provider callbacks.
///
/// A missing secret rejects every request on that endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookConfig {
    /// Token expected in `hub.verify_token` during the WhatsApp handshake
    pub whatsapp_verify_token: Option<String>,
    /// Value expected in the `apikey` header of Evolution callbacks
    pub evolution_api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// "memory" or "postgres"
    #[serde(default = "default_store_backend")]
    pub backend: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u32,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u32,
    #[serde(default)]
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtelConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_otel_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_sampling_ratio")]
    pub sampling_ratio: f64,
}

fn list_or_csv<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ListOrCsv {
        List(Vec<String>),
        Csv(String),
    }

    Ok(match ListOrCsv::deserialize(deserializer)? {
        ListOrCsv::List(items) => items,
        ListOrCsv::Csv(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect(),
    })
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8081
}

fn default_store_backend() -> String {
    "memory".to_string()
}

fn default_pool_size() -> u32 {
    10
}

fn default_connect_timeout() -> u32 {
    5
}

fn default_idle_timeout() -> u32 {
    300 // 5 minutes
}

fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_service_name() -> String {
    "desk-notification-service".to_string()
}

fn default_sampling_ratio() -> f64 {
    1.0
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        Self::load(Self::environment())
    }

    /// Environment source: `SERVER__PORT`, `WEBHOOKS__EVOLUTION_API_KEY`, `DATABASE__URL`, ...
    ///
    /// Values stay strings; typed fields convert on deserialize, so secrets
    /// such as `0123` keep their exact text.
    fn environment() -> Environment {
        Environment::default().separator("__")
    }

    fn load(environment: Environment) -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8081)?
            .set_default("store.backend", "memory")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(environment);

        builder.build()?.try_deserialize()
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Settings suitable for tests and local runs without any config source.
    pub fn with_secrets(verify_token: &str, evolution_api_key: &str) -> Self {
        Self {
            server: ServerConfig::default(),
            api: ApiConfig::default(),
            webhooks: WebhookConfig {
                whatsapp_verify_token: Some(verify_token.to_string()),
                evolution_api_key: Some(evolution_api_key.to_string()),
            },
            store: StoreConfig::default(),
            database: None,
            otel: OtelConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
        }
    }
}

impl Default for OtelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_otel_endpoint(),
            service_name: default_service_name(),
            sampling_ratio: default_sampling_ratio(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let server = ServerConfig::default();
        assert_eq!(server.host, "0.0.0.0");
        assert_eq!(server.port, 8081);
        assert_eq!(StoreConfig::default().backend, "memory");
    }

    #[test]
    fn test_with_secrets() {
        let settings = Settings::with_secrets("verify-me", "evo-key");
        assert_eq!(
            settings.webhooks.whatsapp_verify_token.as_deref(),
            Some("verify-me")
        );
        assert_eq!(settings.webhooks.evolution_api_key.as_deref(), Some("evo-key"));
        assert!(settings.database.is_none());
        assert_eq!(settings.server_addr(), "0.0.0.0:8081");
    }

    #[test]
    fn test_deserialize_partial_sections() {
        let settings: Settings = serde_json::from_value(serde_json::json!({
            "webhooks": { "evolution_api_key": "abc" },
            "database": { "url": "postgres://localhost/desk" }
        }))
        .unwrap();

        assert_eq!(settings.webhooks.evolution_api_key.as_deref(), Some("abc"));
        assert!(settings.webhooks.whatsapp_verify_token.is_none());
        let db = settings.database.unwrap();
        assert_eq!(db.pool_size, 10);
        assert!(!db.run_migrations);
        assert_eq!(settings.otel.service_name, "desk-notification-service");
    }
    fn load_with_env(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let source: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::load(Settings::environment().source(Some(source)))
    }

    #[test]
    fn test_environment_secrets_and_typed_fields() {
        let settings = load_with_env(&[
            ("WEBHOOKS__EVOLUTION_API_KEY", "s3cret-key"),
            ("WEBHOOKS__WHATSAPP_VERIFY_TOKEN", "0123"),
            ("DATABASE__URL", "postgres://desk:pw@localhost:5432/desk"),
            ("DATABASE__RUN_MIGRATIONS", "true"),
            ("SERVER__PORT", "9090"),
            ("OTEL__SAMPLING_RATIO", "0.5"),
            ("STORE__BACKEND", "postgres"),
        ])
        .unwrap();

        assert_eq!(settings.webhooks.evolution_api_key.as_deref(), Some("s3cret-key"));
        assert_eq!(settings.webhooks.whatsapp_verify_token.as_deref(), Some("0123"));
        assert_eq!(settings.server.port, 9090);
        assert_eq!(settings.otel.sampling_ratio, 0.5);
        assert_eq!(settings.store.backend, "postgres");

        let db = settings.database.unwrap();
        assert_eq!(db.url, "postgres://desk:pw@localhost:5432/desk");
        assert!(db.run_migrations);
    }

    #[test]
    fn test_environment_cors_origins_csv() {
        let settings = load_with_env(&[(
            "SERVER__CORS_ORIGINS",
            "https://desk.example.com, https://admin.example.com",
        )])
        .unwrap();

        assert_eq!(
            settings.server.cors_origins,
            vec!["https://desk.example.com", "https://admin.example.com"]
        );
    }

    #[test]
    fn test_cors_origins_list_form() {
        let server: ServerConfig = serde_json::from_value(serde_json::json!({
            "cors_origins": ["https://desk.example.com"]
        }))
        .unwrap();
        assert_eq!(server.cors_origins, vec!["https://desk.example.com"]);
    }
}
