use sqlx::SqlitePool;

use postscope_backend::registry::PostTypeRegistry;
use postscope_backend::settings::SettingsStore;
use postscope_backend::sync::StatusSync;

/// Shared application state, one instance per process / 进程内共享的应用状态
pub struct AppState {
    pub db: SqlitePool,
    pub settings: SettingsStore,
    pub registry: PostTypeRegistry,
    pub sync: StatusSync,
}

impl AppState {
    pub fn new(db: SqlitePool) -> Self {
        let settings = SettingsStore::new(db.clone());
        let registry = PostTypeRegistry::new();
        let sync = StatusSync::new(settings.clone(), registry.clone());
        Self {
            db,
            settings,
            registry,
            sync,
        }
    }
}
