use anyhow::{anyhow, Result};

pub fn validate_database_url(value: &str) -> Result<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("database_url is empty"));
    }
    if !trimmed.starts_with("sqlite:") {
        return Err(anyhow!("database_url must be a sqlite: url"));
    }
    Ok(())
}

pub fn validate_reminder_time(hour: u32, minute: u32) -> Result<()> {
    if hour > 23 || minute > 59 {
        return Err(anyhow!("reminder_hour or reminder_minute out of range"));
    }
    Ok(())
}

pub fn validate_notify_url(value: &str) -> Result<()> {
    let lower = value.trim().to_lowercase();
    let supported = ["http://", "https://", "ws://", "wss://"];
    if supported.iter().any(|scheme| lower.starts_with(scheme)) {
        Ok(())
    } else {
        Err(anyhow!("notify_webhook_url must be http(s) or ws(s)"))
    }
}
