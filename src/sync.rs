//! Status synchronizer / 状态同步器
//!
//! Keeps the persisted post type status map aligned with the live registry:
//! one-time bulk initialization plus incremental updates on register and
//! unregister events.

use std::collections::HashMap;

use anyhow::Result;

use crate::registry::{PostTypeRegistry, RegistryEvent};
use crate::settings::SettingsStore;

#[derive(Clone)]
pub struct StatusSync {
    store: SettingsStore,
    registry: PostTypeRegistry,
}

impl StatusSync {
    pub fn new(store: SettingsStore, registry: PostTypeRegistry) -> Self {
        Self { store, registry }
    }

    /// One-time bulk initialization of the status map / 状态表的一次性批量初始化
    ///
    /// Defaults every public post type to the inverse of its declared
    /// `exclude_from_search` flag, so pre-existing search behavior is kept
    /// until an administrator changes it. Idempotent: once the marker is set,
    /// repeated calls are no-ops and leave administrator edits alone.
    pub async fn initialize(&self) -> Result<()> {
        if self.store.statuses_initialized().await? {
            return Ok(());
        }

        let mut statuses: HashMap<String, bool> = HashMap::new();
        for post_type in self.registry.public_post_types().await {
            statuses.insert(post_type.name, !post_type.exclude_from_search);
        }

        self.store.set_post_type_statuses(&statuses).await?;
        self.store.set_statuses_initialized().await?;
        tracing::info!("Post type statuses initialized ({} types)", statuses.len());
        Ok(())
    }

    /// Handle a newly registered post type / 处理新注册的内容类型
    ///
    /// A type already present in the map keeps its stored value; only
    /// never-seen types are inserted, defaulting to searchable.
    pub async fn on_post_type_registered(&self, name: &str) -> Result<()> {
        let mut statuses = self.store.post_type_statuses().await?;

        if statuses.contains_key(name) {
            return Ok(());
        }

        statuses.insert(name.to_string(), true);
        self.store.set_post_type_statuses(&statuses).await?;
        tracing::debug!("Post type status added: {} -> searchable", name);
        Ok(())
    }

    /// Handle an unregistered post type / 处理已注销的内容类型
    pub async fn on_post_type_unregistered(&self, name: &str) -> Result<()> {
        let mut statuses = self.store.post_type_statuses().await?;

        if statuses.remove(name).is_none() {
            return Ok(());
        }

        self.store.set_post_type_statuses(&statuses).await?;
        tracing::debug!("Post type status removed: {}", name);
        Ok(())
    }

    /// Apply a registry event / 应用注册表事件
    pub async fn apply_event(&self, event: &RegistryEvent) -> Result<()> {
        match event {
            RegistryEvent::Registered(post_type) => {
                self.on_post_type_registered(&post_type.name).await
            }
            RegistryEvent::Unregistered(name) => self.on_post_type_unregistered(name).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PostType;
    use sqlx::SqlitePool;

    async fn test_sync() -> StatusSync {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        sqlx::query(
            r#"
            CREATE TABLE site_settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();

        let registry = PostTypeRegistry::new();
        registry
            .register(PostType::new("post", "Posts", true, false))
            .await;
        registry
            .register(PostType::new("page", "Pages", true, false))
            .await;
        registry
            .register(PostType::new("attachment", "Media", true, true))
            .await;
        registry
            .register(PostType::new("revision", "Revisions", false, true))
            .await;

        StatusSync::new(SettingsStore::new(pool), registry)
    }

    #[tokio::test]
    async fn test_initialize_defaults() {
        let sync = test_sync().await;
        sync.initialize().await.unwrap();

        let statuses = sync.store.post_type_statuses().await.unwrap();
        assert_eq!(statuses.get("post"), Some(&true));
        assert_eq!(statuses.get("page"), Some(&true));
        // exclude_from_search 的类型默认为不可搜索
        assert_eq!(statuses.get("attachment"), Some(&false));
        // 私有类型不进入状态表
        assert!(!statuses.contains_key("revision"));
        assert!(sync.store.statuses_initialized().await.unwrap());
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let sync = test_sync().await;
        sync.initialize().await.unwrap();

        // 管理员修改后再次初始化不得覆盖
        let mut edited = sync.store.post_type_statuses().await.unwrap();
        edited.insert("post".to_string(), false);
        sync.store.set_post_type_statuses(&edited).await.unwrap();

        sync.initialize().await.unwrap();

        let statuses = sync.store.post_type_statuses().await.unwrap();
        assert_eq!(statuses, edited);
        assert!(sync.store.statuses_initialized().await.unwrap());
    }

    #[tokio::test]
    async fn test_registration_preserves_existing_choice() {
        let sync = test_sync().await;

        let mut statuses = HashMap::new();
        statuses.insert("post".to_string(), false);
        sync.store.set_post_type_statuses(&statuses).await.unwrap();

        sync.on_post_type_registered("post").await.unwrap();

        let statuses = sync.store.post_type_statuses().await.unwrap();
        assert_eq!(statuses.get("post"), Some(&false));
    }

    #[tokio::test]
    async fn test_new_registration_defaults_searchable() {
        let sync = test_sync().await;

        let mut statuses = HashMap::new();
        statuses.insert("post".to_string(), true);
        sync.store.set_post_type_statuses(&statuses).await.unwrap();

        sync.on_post_type_registered("event").await.unwrap();

        let statuses = sync.store.post_type_statuses().await.unwrap();
        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses.get("post"), Some(&true));
        assert_eq!(statuses.get("event"), Some(&true));
    }

    #[tokio::test]
    async fn test_unregistration_removes_exactly_one_key() {
        let sync = test_sync().await;

        let mut statuses = HashMap::new();
        statuses.insert("a".to_string(), true);
        statuses.insert("b".to_string(), false);
        sync.store.set_post_type_statuses(&statuses).await.unwrap();

        sync.on_post_type_unregistered("a").await.unwrap();

        let statuses = sync.store.post_type_statuses().await.unwrap();
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses.get("b"), Some(&false));

        // 再次注销同一类型是空操作
        sync.on_post_type_unregistered("a").await.unwrap();
        assert_eq!(sync.store.post_type_statuses().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_startup_order_keeps_initialize_defaults() {
        // 启动顺序：先注册内置类型并初始化，之后才订阅事件。
        // attachment 的 exclude_from_search 默认不得被后续事件处理翻转。
        let sync = test_sync().await;
        sync.initialize().await.unwrap();

        let mut rx = sync.registry.subscribe();
        sync.registry
            .register(PostType::new("event", "Events", true, false))
            .await;
        while let Ok(event) = rx.try_recv() {
            sync.apply_event(&event).await.unwrap();
        }

        let statuses = sync.store.post_type_statuses().await.unwrap();
        assert_eq!(statuses.get("attachment"), Some(&false));
        assert_eq!(statuses.get("event"), Some(&true));
        assert!(sync.store.statuses_initialized().await.unwrap());
    }

    #[tokio::test]
    async fn test_apply_event_via_registry() {
        let sync = test_sync().await;
        sync.initialize().await.unwrap();

        let mut rx = sync.registry.subscribe();
        sync.registry
            .register(PostType::new("event", "Events", true, false))
            .await;

        let event = rx.recv().await.unwrap();
        sync.apply_event(&event).await.unwrap();

        let statuses = sync.store.post_type_statuses().await.unwrap();
        assert_eq!(statuses.get("event"), Some(&true));
    }
}
