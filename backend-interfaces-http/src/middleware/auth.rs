use axum::http::HeaderMap;

use backend_domain::{RuntimeConfig, UserId};

use crate::error::HttpError;

pub const ACTING_USER_HEADER: &str = "X-Acting-User";

pub fn authorize(config: &RuntimeConfig, headers: &HeaderMap) -> bool {
    if let Some(api_token) = &config.api_token {
        return extract_bearer(headers)
            .map(|v| v == *api_token)
            .unwrap_or(false);
    }
    true
}

/// Checks the API token and returns the user the session layer vouched for.
pub fn acting_user(config: &RuntimeConfig, headers: &HeaderMap) -> Result<UserId, HttpError> {
    if !authorize(config, headers) {
        return Err(HttpError::Unauthorized);
    }
    let value = headers
        .get(ACTING_USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .unwrap_or("");
    if value.is_empty() {
        return Err(HttpError::Unauthorized);
    }
    Ok(UserId::from(value))
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("Authorization")?.to_str().ok()?.trim();
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}
