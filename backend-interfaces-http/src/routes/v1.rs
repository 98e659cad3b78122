use axum::routing::{get, post, put};
use axum::Router;

use backend_application::AppState;

use crate::handlers::{admin_handlers, attendance_handlers, no_show_handlers, ops_handlers};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/v1/events/:event_id/rsvp",
            post(attendance_handlers::set_rsvp).get(attendance_handlers::get_my_rsvp),
        )
        .route(
            "/v1/events/:event_id/attendance",
            get(attendance_handlers::get_attendance_summary),
        )
        .route(
            "/v1/events/:event_id/attendance/manage",
            get(attendance_handlers::get_management_roster),
        )
        .route(
            "/v1/events/:event_id/attendance/remove",
            post(admin_handlers::remove_attendees),
        )
        .route(
            "/v1/events/:event_id/attendance/bulk",
            post(admin_handlers::set_attendees),
        )
        .route(
            "/v1/events/:event_id/attendance/:user_id/move",
            post(admin_handlers::move_attendee),
        )
        .route(
            "/v1/events/:event_id/attendance/:user_id/remove",
            post(admin_handlers::remove_attendee),
        )
        .route(
            "/v1/events/:event_id/no-shows/:user_id",
            put(no_show_handlers::mark_no_show).delete(no_show_handlers::clear_no_show),
        )
        .route(
            "/v1/ops/notify-target/check",
            get(ops_handlers::notify_target_check),
        )
        .route(
            "/v1/ops/notification-deliveries",
            get(ops_handlers::list_notification_deliveries),
        )
        .route(
            "/v1/ops/notification-deliveries/last",
            get(ops_handlers::get_last_notification_delivery),
        )
        .route("/v1/ops/health/live", get(ops_handlers::health_live))
        .route("/v1/ops/health/ready", get(ops_handlers::health_ready))
        .route(
            "/v1/ops/metrics/prometheus",
            get(ops_handlers::metrics_prometheus),
        )
        .with_state(state)
}
