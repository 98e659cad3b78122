use std::env;
use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tokio::fs;
use tracing::warn;

use backend_domain::{normalize_optional_text, DbConfig, RuntimeConfig};

use super::validation::{validate_database_url, validate_notify_url, validate_reminder_time};

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub database_url: String,
    pub database_max_connections: u32,
    /// YAML file of users and events loaded at startup.
    pub directory_path: Option<String>,
    pub public_base_url: String,
    pub notify_webhook_url: Option<String>,
    pub notify_webhook_template: Option<String>,
    pub notify_webhook_token: Option<String>,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
    pub reminder_enabled: bool,
    pub reminder_hour: u32,
    pub reminder_minute: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3240".to_string(),
            api_token: None,
            database_url: "sqlite://hearth.db?mode=rwc".to_string(),
            database_max_connections: 5,
            directory_path: None,
            public_base_url: "http://127.0.0.1:3240".to_string(),
            notify_webhook_url: None,
            notify_webhook_template: None,
            notify_webhook_token: None,
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 15,
            reminder_enabled: true,
            reminder_hour: 0,
            reminder_minute: 0,
        }
    }
}

impl AppConfig {
    pub async fn load() -> Result<Self> {
        let path = env::var("HEARTH_CONFIG").unwrap_or_else(|_| "./config.toml".to_string());
        let file_path = Path::new(&path);
        let base_dir = file_path.parent();
        let mut config = if file_path.exists() {
            let content = fs::read_to_string(file_path).await?;
            Self::from_toml(&content)?
        } else {
            warn!("{} not found, using defaults", path);
            AppConfig::default()
        };
        config.apply_env_overrides();
        config.resolve_paths(base_dir);
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|err| anyhow!("invalid config: {}", err))
    }

    pub fn normalize(&mut self) {
        self.api_token = normalize_optional_text(self.api_token.take());
        self.directory_path = normalize_optional_text(self.directory_path.take());
        self.notify_webhook_url = normalize_optional_text(self.notify_webhook_url.take());
        self.notify_webhook_template = normalize_optional_text(self.notify_webhook_template.take());
        self.notify_webhook_token = normalize_optional_text(self.notify_webhook_token.take());
        self.public_base_url = self.public_base_url.trim().trim_end_matches('/').to_string();
        self.database_url = self.database_url.trim().to_string();
        if self.database_max_connections == 0 {
            self.database_max_connections = 1;
        }
    }

    fn resolve_paths(&mut self, base_dir: Option<&Path>) {
        let Some(base) = base_dir else {
            return;
        };
        if let Some(path) = &self.directory_path {
            self.directory_path = Some(resolve_path(base, path));
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_addr
            .parse::<std::net::SocketAddr>()
            .map_err(|err| anyhow!("invalid bind_addr: {}", err))?;
        if self.public_base_url.trim().is_empty() {
            return Err(anyhow!("public_base_url must not be empty"));
        }
        if self.max_body_bytes == 0 {
            return Err(anyhow!("max_body_bytes must be greater than 0"));
        }
        validate_database_url(&self.database_url)?;
        validate_reminder_time(self.reminder_hour, self.reminder_minute)?;
        if let Some(url) = &self.notify_webhook_url {
            validate_notify_url(url)?;
        }
        Ok(())
    }

    pub fn to_runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            bind_addr: self.bind_addr.clone(),
            api_token: self.api_token.clone(),
            public_base_url: self.public_base_url.clone(),
            notify_webhook_url: self.notify_webhook_url.clone(),
            notify_webhook_template: self.notify_webhook_template.clone(),
            notify_webhook_token: self.notify_webhook_token.clone(),
            max_body_bytes: self.max_body_bytes,
            request_timeout_seconds: self.request_timeout_seconds,
            reminder_enabled: self.reminder_enabled,
            reminder_hour: self.reminder_hour,
            reminder_minute: self.reminder_minute,
        }
    }

    pub fn to_db_config(&self) -> DbConfig {
        DbConfig {
            database_url: self.database_url.clone(),
            max_connections: self.database_max_connections,
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = env::var("HEARTH_BIND_ADDR") {
            self.bind_addr = value;
        }
        if let Ok(value) = env::var("HEARTH_API_TOKEN") {
            self.api_token = Some(value);
        }
        if let Ok(value) = env::var("HEARTH_DATABASE_URL") {
            self.database_url = value;
        }
        if let Ok(value) = env::var("HEARTH_DATABASE_MAX_CONNECTIONS") {
            self.database_max_connections = value.parse().unwrap_or(self.database_max_connections);
        }
        if let Ok(value) = env::var("HEARTH_DIRECTORY_PATH") {
            self.directory_path = Some(value);
        }
        if let Ok(value) = env::var("HEARTH_PUBLIC_BASE_URL") {
            self.public_base_url = value;
        }
        if let Ok(value) = env::var("HEARTH_NOTIFY_WEBHOOK_URL") {
            self.notify_webhook_url = Some(value);
        }
        if let Ok(value) = env::var("HEARTH_NOTIFY_WEBHOOK_TEMPLATE") {
            self.notify_webhook_template = Some(value);
        }
        if let Ok(value) = env::var("HEARTH_NOTIFY_WEBHOOK_TOKEN") {
            self.notify_webhook_token = Some(value);
        }
        if let Ok(value) = env::var("HEARTH_MAX_BODY_BYTES") {
            self.max_body_bytes = value.parse().unwrap_or(self.max_body_bytes);
        }
        if let Ok(value) = env::var("HEARTH_REQUEST_TIMEOUT_SECONDS") {
            self.request_timeout_seconds = value.parse().unwrap_or(self.request_timeout_seconds);
        }
        if let Ok(value) = env::var("HEARTH_REMINDER_ENABLED") {
            self.reminder_enabled = value.parse().unwrap_or(self.reminder_enabled);
        }
        if let Ok(value) = env::var("HEARTH_REMINDER_HOUR") {
            self.reminder_hour = value.parse().unwrap_or(self.reminder_hour);
        }
        if let Ok(value) = env::var("HEARTH_REMINDER_MINUTE") {
            self.reminder_minute = value.parse().unwrap_or(self.reminder_minute);
        }
    }
}

fn resolve_path(base: &Path, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return trimmed.to_string();
    }
    let path = Path::new(trimmed);
    if path.is_absolute() {
        trimmed.to_string()
    } else {
        base.join(path).to_string_lossy().to_string()
    }
}
