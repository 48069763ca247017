//! Content type registry / 内容类型注册表
//!
//! Tracks which post types currently exist and broadcasts change events so
//! the status synchronizer can keep the persisted map aligned.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};

use crate::models::PostType;

/// Registry change event / 注册表变更事件
#[derive(Debug, Clone)]
pub enum RegistryEvent {
    Registered(PostType),
    Unregistered(String),
}

/// Post type registry (process-wide, shared via clone) / 内容类型注册表
#[derive(Clone)]
pub struct PostTypeRegistry {
    post_types: Arc<RwLock<HashMap<String, PostType>>>,
    event_sender: broadcast::Sender<RegistryEvent>,
}

impl PostTypeRegistry {
    pub fn new() -> Self {
        let (event_sender, _) = broadcast::channel(64);
        Self {
            post_types: Arc::new(RwLock::new(HashMap::new())),
            event_sender,
        }
    }

    /// Subscribe to registry events / 订阅注册表事件
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.event_sender.subscribe()
    }

    fn broadcast(&self, event: RegistryEvent) {
        // No subscribers is fine (e.g. in tests) / 没有订阅者也没关系
        let _ = self.event_sender.send(event);
    }

    /// Register a post type, replacing any previous definition / 注册内容类型
    ///
    /// Emits one `Registered` event per call, mirroring the host firing its
    /// registration hook even for an already-known type.
    pub async fn register(&self, post_type: PostType) {
        let name = post_type.name.clone();
        {
            let mut post_types = self.post_types.write().await;
            post_types.insert(name.clone(), post_type.clone());
        }
        tracing::info!("Post type registered: {}", name);
        self.broadcast(RegistryEvent::Registered(post_type));
    }

    /// Unregister a post type / 注销内容类型
    ///
    /// Emits `Unregistered` only when the type actually existed.
    pub async fn unregister(&self, name: &str) -> bool {
        let removed = {
            let mut post_types = self.post_types.write().await;
            post_types.remove(name).is_some()
        };
        if removed {
            tracing::info!("Post type unregistered: {}", name);
            self.broadcast(RegistryEvent::Unregistered(name.to_string()));
        }
        removed
    }

    /// Get a post type by name / 按名称获取内容类型
    pub async fn get(&self, name: &str) -> Option<PostType> {
        let post_types = self.post_types.read().await;
        post_types.get(name).cloned()
    }

    /// List all public post types / 列出所有公开内容类型
    pub async fn public_post_types(&self) -> Vec<PostType> {
        let post_types = self.post_types.read().await;
        post_types.values().filter(|pt| pt.public).cloned().collect()
    }

    /// List all public post type names / 列出所有公开内容类型名称
    pub async fn public_post_type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .public_post_types()
            .await
            .into_iter()
            .map(|pt| pt.name)
            .collect();
        names.sort();
        names
    }
}

impl Default for PostTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
