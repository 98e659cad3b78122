use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use tracing::{error, info};

use backend_application::commands::send_event_reminders;
use backend_application::AppState;
use backend_domain::RuntimeConfig;

/// Runs forever, sending the day's event reminders at the configured UTC
/// time.
pub async fn schedule_reminders(state: AppState) {
    if !state.config.reminder_enabled {
        info!("event reminders disabled");
        return;
    }
    loop {
        let next = next_reminder_time(&state.config, Utc::now());
        let duration = next.signed_duration_since(Utc::now());
        let sleep_ms = duration.num_milliseconds().max(0) as u64;
        tokio::time::sleep(std::time::Duration::from_millis(sleep_ms)).await;

        match send_event_reminders(&state, Utc::now()).await {
            Ok(count) => info!("queued {} event reminders", count),
            Err(err) => error!("event reminders failed: {}", err),
        }
    }
}

pub fn next_reminder_time(config: &RuntimeConfig, now: DateTime<Utc>) -> DateTime<Utc> {
    let time = NaiveTime::from_hms_opt(config.reminder_hour, config.reminder_minute, 0)
        .unwrap_or(NaiveTime::MIN);
    let today = Utc.from_utc_datetime(&now.date_naive().and_time(time));
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}
