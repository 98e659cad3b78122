use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde_json::json;
use tokio::sync::RwLock;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use backend_application::Metrics;
use backend_domain::ports::NotificationService;
use backend_domain::{
    current_millis, NotificationDeliveryRecord, NotificationKind, OutboundNotification,
    RuntimeConfig,
};

const DELIVERY_LOG_CAPACITY: usize = 200;
const MAX_ATTEMPTS: u8 = 2;
const DEFAULT_TEMPLATE: &str = r#"{"recipient":"{recipient}","email":"{email}","kind":"{kind}","event_id":{event_id},"message":"{message}"}"#;

#[derive(Clone, Default)]
struct DeliveryLog {
    entries: Arc<RwLock<VecDeque<NotificationDeliveryRecord>>>,
}

impl DeliveryLog {
    async fn push(&self, record: NotificationDeliveryRecord) {
        let mut entries = self.entries.write().await;
        entries.push_front(record);
        entries.truncate(DELIVERY_LOG_CAPACITY);
    }

    async fn latest(&self, limit: usize) -> Vec<NotificationDeliveryRecord> {
        self.entries.read().await.iter().take(limit).cloned().collect()
    }
}

/// Delivers notifications to a webhook (HTTP) or a chat bot (WebSocket),
/// depending on the scheme of `notify_webhook_url`.
pub struct DefaultNotificationService {
    metrics: Arc<Metrics>,
    log: DeliveryLog,
}

impl DefaultNotificationService {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self {
            metrics,
            log: DeliveryLog::default(),
        }
    }
}

#[async_trait]
impl NotificationService for DefaultNotificationService {
    fn spawn_notifications(&self, config: RuntimeConfig, notifications: Vec<OutboundNotification>) {
        if notifications.is_empty() {
            return;
        }
        let metrics = self.metrics.clone();
        let log = self.log.clone();
        tokio::spawn(async move {
            deliver(&config, &notifications, &metrics, &log).await;
        });
    }

    async fn check_notify_target(&self, config: &RuntimeConfig) -> Result<()> {
        check_notify_target(config).await
    }

    async fn list_deliveries(&self, limit: usize) -> Vec<NotificationDeliveryRecord> {
        self.log.latest(limit).await
    }

    async fn last_delivery(&self) -> Option<NotificationDeliveryRecord> {
        self.log.latest(1).await.into_iter().next()
    }
}

/// Sends every notification to its own recipient, one request each.
async fn deliver(
    config: &RuntimeConfig,
    notifications: &[OutboundNotification],
    metrics: &Metrics,
    log: &DeliveryLog,
) {
    let url = resolve_notify_url(config);
    if url.is_none() {
        debug!(
            "notify target not configured, dropping {} notifications",
            notifications.len()
        );
    }
    for item in notifications {
        let record = deliver_one(config, url.as_deref(), item, metrics).await;
        log.push(record).await;
    }
}

async fn deliver_one(
    config: &RuntimeConfig,
    url: Option<&str>,
    item: &OutboundNotification,
    metrics: &Metrics,
) -> NotificationDeliveryRecord {
    let mut record = NotificationDeliveryRecord {
        delivery_id: uuid::Uuid::new_v4().to_string(),
        timestamp_ms: current_millis(),
        status: "skipped".to_string(),
        mode: "none".to_string(),
        attempts: 0,
        recipient: item.recipient.id.clone(),
        event_id: item.event.id,
        kind: item.kind.as_str().to_string(),
        error: None,
    };
    let Some(url) = url else {
        return record;
    };
    record.mode = if is_ws_url(url) { "ws" } else { "http" }.to_string();

    let mut last_error = None;
    for attempt in 1..=MAX_ATTEMPTS {
        record.attempts = attempt;
        match send_notification(config, url, item).await {
            Ok(()) => {
                last_error = None;
                break;
            }
            Err(err) => {
                warn!(
                    "notification to {} attempt {}/{} failed: {}",
                    item.recipient.id, attempt, MAX_ATTEMPTS, err
                );
                last_error = Some(err.to_string());
                if attempt < MAX_ATTEMPTS {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                }
            }
        }
    }

    match last_error {
        None => {
            info!(
                "delivered {} to {} via {}",
                record.kind, item.recipient.id, record.mode
            );
            metrics.record_notifications_sent(1);
            record.status = "sent".to_string();
        }
        Some(err) => {
            metrics.record_notification_failure();
            record.status = "failed".to_string();
            record.error = Some(err);
        }
    }
    record
}

pub async fn check_notify_target(config: &RuntimeConfig) -> Result<()> {
    let url = resolve_notify_url(config)
        .ok_or_else(|| anyhow::anyhow!("notify webhook url not configured"))?;
    if is_ws_url(&url) {
        check_ws_target(config, &url).await
    } else {
        check_http_target(config, &url).await
    }
}

async fn send_notification(
    config: &RuntimeConfig,
    url: &str,
    item: &OutboundNotification,
) -> Result<()> {
    if is_ws_url(url) {
        send_ws_notification(config, url, item).await
    } else {
        send_http_notification(config, url, item).await
    }
}

fn http_client(config: &RuntimeConfig) -> Result<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_seconds.max(3)))
        .build()?)
}

async fn send_http_notification(
    config: &RuntimeConfig,
    url: &str,
    item: &OutboundNotification,
) -> Result<()> {
    let template = config
        .notify_webhook_template
        .as_deref()
        .unwrap_or(DEFAULT_TEMPLATE);
    let payload = build_payload(config, item, template);

    let mut request = http_client(config)?
        .post(url)
        .header("Content-Type", "application/json")
        .body(payload);
    if let Some(token) = &config.notify_webhook_token {
        request = request.header(AUTHORIZATION, format!("Bearer {}", token));
    }
    request.send().await?.error_for_status()?;
    Ok(())
}

async fn check_http_target(config: &RuntimeConfig, url: &str) -> Result<()> {
    let response = http_client(config)?.get(url).send().await?;
    if !response.status().is_success() {
        anyhow::bail!("notify webhook responded {}", response.status());
    }
    Ok(())
}

async fn check_ws_target(config: &RuntimeConfig, url: &str) -> Result<()> {
    let token = config.notify_webhook_token.clone();
    if let Err(err) = try_ws_check(url, token.as_deref(), false).await {
        if token.is_some() {
            return try_ws_check(url, token.as_deref(), true).await;
        }
        return Err(err);
    }
    Ok(())
}

/// Direct message to the recipient through the chat bot.
async fn send_ws_notification(
    config: &RuntimeConfig,
    url: &str,
    item: &OutboundNotification,
) -> Result<()> {
    let payload = json!({
        "action": "send_private_msg",
        "params": {
            "user_id": item.recipient.id,
            "email": item.recipient.email,
            "message": render_message(config, item),
        },
        "echo": format!("hearth-{}", current_millis()),
    })
    .to_string();

    let token = config.notify_webhook_token.clone();
    if let Err(err) = try_ws_send(url, token.as_deref(), &payload, false).await {
        if token.is_some() {
            try_ws_send(url, token.as_deref(), &payload, true).await?;
        } else {
            return Err(err);
        }
    }
    Ok(())
}

async fn connect_ws(
    url: &str,
    token: Option<&str>,
    use_query: bool,
) -> Result<
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
> {
    let mut request = if use_query {
        add_access_token_query(url, token).into_client_request()?
    } else {
        url.into_client_request()?
    };
    if let Some(token) = token {
        if !use_query {
            request
                .headers_mut()
                .insert(AUTHORIZATION, format!("Bearer {}", token).parse()?);
        }
    }
    let (ws, _) = tokio_tungstenite::connect_async(request).await?;
    Ok(ws)
}

async fn try_ws_check(url: &str, token: Option<&str>, use_query: bool) -> Result<()> {
    let mut ws = connect_ws(url, token, use_query).await?;
    let payload = json!({
        "action": "get_status",
        "params": {},
        "echo": format!("hearth-check-{}", current_millis()),
    })
    .to_string();
    ws.send(Message::Text(payload)).await?;
    let _ = timeout(Duration::from_secs(2), ws.next()).await?;
    let _ = ws.close(None).await;
    Ok(())
}

async fn try_ws_send(url: &str, token: Option<&str>, payload: &str, use_query: bool) -> Result<()> {
    let mut ws = connect_ws(url, token, use_query).await?;
    ws.send(Message::Text(payload.to_string())).await?;
    let _ = timeout(Duration::from_secs(2), ws.next()).await.ok();
    let _ = ws.close(None).await;
    Ok(())
}

fn is_ws_url(url: &str) -> bool {
    url.starts_with("ws://") || url.starts_with("wss://")
}

fn add_access_token_query(url: &str, token: Option<&str>) -> String {
    let token = match token {
        Some(value) if !value.trim().is_empty() => value,
        _ => return url.to_string(),
    };
    if url.contains("access_token=") {
        return url.to_string();
    }
    if url.contains('?') {
        format!("{}&access_token={}", url, token)
    } else {
        format!("{}?access_token={}", url, token)
    }
}

fn resolve_notify_url(config: &RuntimeConfig) -> Option<String> {
    config
        .notify_webhook_url
        .as_ref()
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
}

fn event_link(config: &RuntimeConfig, item: &OutboundNotification) -> String {
    format!("{}/events/{}", config.public_base_url, item.event.id)
}

/// Text addressed to the recipient alone.
pub fn render_message(config: &RuntimeConfig, item: &OutboundNotification) -> String {
    let name = &item.recipient.name;
    let title = &item.event.title;
    let when = item.event.starts_at.format("%A, %B %d, %Y %H:%M UTC");
    let link = event_link(config, item);
    match item.kind {
        NotificationKind::RsvpConfirmed { status } => format!(
            "Hi {name}, your RSVP for {title} ({when}) is recorded as {}. {link}",
            status.label()
        ),
        NotificationKind::StatusChanged { status: Some(status) } => format!(
            "Hi {name}, your RSVP for {title} is now {}. {link}",
            status.label()
        ),
        NotificationKind::StatusChanged { status: None } => {
            format!("Hi {name}, your RSVP for {title} was removed. {link}")
        }
        NotificationKind::WaitlistPromoted => format!(
            "Hi {name}, a spot opened up and you are now attending {title} ({when}). {link}"
        ),
        NotificationKind::EventReminder => {
            format!("Hi {name}, reminder: {title} is on {when}. {link}")
        }
    }
}

/// Fills `{recipient}`, `{email}`, `{name}`, `{kind}`, `{event_id}` and
/// `{message}` in one pass. Values are JSON-escaped so they can sit inside
/// string literals of the template, and substituted text is never rescanned.
pub fn build_payload(config: &RuntimeConfig, item: &OutboundNotification, template: &str) -> String {
    let values = [
        ("recipient", json_escape(item.recipient.id.as_str())),
        ("email", json_escape(&item.recipient.email)),
        ("name", json_escape(&item.recipient.name)),
        ("kind", item.kind.as_str().to_string()),
        ("event_id", item.event.id.to_string()),
        ("message", json_escape(&render_message(config, item))),
    ];
    fill_template(template, &values)
}

fn fill_template(template: &str, values: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        let matched = values.iter().find(|(key, _)| {
            tail.starts_with(key) && tail[key.len()..].starts_with('}')
        });
        match matched {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len() + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

fn json_escape(value: &str) -> String {
    let quoted = serde_json::Value::String(value.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}
