use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use backend_application::ops::EventLocks;
use backend_application::{AppState, Metrics};
use backend_domain::{DirectoryRepository, EventRepository, UserRepository};
use backend_infrastructure::{
    AppConfig, DefaultNotificationService, DirectoryFileRepository, SqliteStore,
};

pub struct AppContext {
    pub state: AppState,
}

impl AppContext {
    pub async fn new() -> Result<Self> {
        let config = AppConfig::load().await?;
        let runtime_config = config.to_runtime_config();
        let db_config = config.to_db_config();

        let store = Arc::new(SqliteStore::connect(&db_config).await?);
        store.ensure_schema().await?;

        if let Some(path) = &config.directory_path {
            seed_directory(&store, path).await?;
        }

        let metrics = Arc::new(Metrics::default());
        let state = AppState {
            config: runtime_config,
            event_repo: store.clone(),
            user_repo: store.clone(),
            attendance_repo: store.clone(),
            no_show_repo: store,
            notification_service: Arc::new(DefaultNotificationService::new(metrics.clone())),
            event_locks: Arc::new(EventLocks::default()),
            metrics,
        };

        Ok(Self { state })
    }
}

/// Mirrors users and events from the directory file. Attendance is never
/// touched.
async fn seed_directory(store: &SqliteStore, path: &str) -> Result<()> {
    let directory = DirectoryFileRepository::new().load_directory(path).await?;
    for user in directory.users.iter() {
        store.save_user(user).await?;
    }
    for event in directory.events.iter() {
        store.save_event(event).await?;
    }
    info!(
        "seeded {} users and {} events from {}",
        directory.users.len(),
        directory.events.len(),
        path
    );
    Ok(())
}
