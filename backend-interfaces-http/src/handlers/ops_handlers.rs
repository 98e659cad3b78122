use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use tokio::time::{timeout, Duration};
use tracing::error;

use backend_application::AppState;
use backend_domain::NotificationDeliveryRecord;

use crate::error::HttpError;
use crate::middleware::authorize;

#[derive(serde::Serialize)]
struct NotifyTargetStatus {
    status: String,
    mode: String,
}

#[derive(serde::Deserialize)]
pub struct DeliveryQuery {
    pub limit: Option<usize>,
}

pub async fn notify_target_check(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if !authorize(&state.config, &headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(NotifyTargetStatus {
                status: "unauthorized".to_string(),
                mode: "unset".to_string(),
            }),
        )
            .into_response();
    }

    let timeout_secs = state.config.request_timeout_seconds.max(1);
    let mode = match &state.config.notify_webhook_url {
        Some(url) if url.starts_with("ws://") || url.starts_with("wss://") => "ws",
        Some(_) => "http",
        None => "unset",
    };

    let (status, label) = match timeout(
        Duration::from_secs(timeout_secs),
        state.notification_service.check_notify_target(&state.config),
    )
    .await
    {
        Ok(Ok(())) => (StatusCode::OK, "ok"),
        Ok(Err(err)) => {
            error!("notify target check failed: {}", err);
            (StatusCode::SERVICE_UNAVAILABLE, "error")
        }
        Err(_) => {
            error!("notify target check timeout after {}s", timeout_secs);
            (StatusCode::SERVICE_UNAVAILABLE, "timeout")
        }
    };
    (
        status,
        Json(NotifyTargetStatus {
            status: label.to_string(),
            mode: mode.to_string(),
        }),
    )
        .into_response()
}

pub async fn list_notification_deliveries(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<DeliveryQuery>,
) -> Result<Json<Vec<NotificationDeliveryRecord>>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let deliveries = state.notification_service.list_deliveries(limit).await;
    Ok(Json(deliveries))
}

pub async fn get_last_notification_delivery(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Option<NotificationDeliveryRecord>>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let last = state.notification_service.last_delivery().await;
    Ok(Json(last))
}

pub async fn health_live() -> StatusCode {
    StatusCode::OK
}

pub async fn health_ready(State(state): State<AppState>) -> StatusCode {
    let timeout_secs = state.config.request_timeout_seconds.max(1);
    let timeout_duration = Duration::from_secs(timeout_secs);
    match timeout(timeout_duration, state.event_repo.ping()).await {
        Ok(Ok(_)) => StatusCode::OK,
        Ok(Err(err)) => {
            error!("ready check failed: {}", err);
            StatusCode::SERVICE_UNAVAILABLE
        }
        Err(_) => {
            error!("ready check timeout after {}s", timeout_secs);
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

pub async fn metrics_prometheus(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if !authorize(&state.config, &headers) {
        return (StatusCode::UNAUTHORIZED, "unauthorized".to_string()).into_response();
    }
    let payload = state.metrics.render_prometheus();
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8"),
    );
    (headers, payload).into_response()
}
