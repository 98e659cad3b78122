#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
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

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3240".to_string(),
            api_token: None,
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

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_url: String,
    pub max_connections: u32,
}
