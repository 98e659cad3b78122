use std::sync::Arc;

use backend_domain::ports::{
    AttendanceRepository, EventRepository, NoShowRepository, NotificationService, UserRepository,
};
use backend_domain::RuntimeConfig;

use crate::ops::EventLocks;
use crate::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub config: RuntimeConfig,
    pub event_repo: Arc<dyn EventRepository>,
    pub user_repo: Arc<dyn UserRepository>,
    pub attendance_repo: Arc<dyn AttendanceRepository>,
    pub no_show_repo: Arc<dyn NoShowRepository>,
    pub notification_service: Arc<dyn NotificationService>,
    pub event_locks: Arc<EventLocks>,
    pub metrics: Arc<Metrics>,
}
