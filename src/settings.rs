//! Settings store / 设置存储
//!
//! Thin key-value persistence over the `site_settings` table. Holds the two
//! entries the search-scope logic needs: the post type status map and the
//! one-time initialization marker.

use std::collections::HashMap;

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;

/// Option key for the post type status map / 内容类型状态表的存储键
pub const POST_TYPE_STATUSES_KEY: &str = "post_type_statuses";
/// Option key for the bulk-initialization marker / 批量初始化标记的存储键
pub const STATUSES_INITIALIZED_KEY: &str = "post_type_statuses_initialized";

/// Key-value settings store backed by SQLite / 基于SQLite的键值设置存储
///
/// Single-key reads and writes are atomic at the database layer; there is no
/// cross-call transaction. Concurrent writers are last-write-wins.
#[derive(Clone)]
pub struct SettingsStore {
    db: SqlitePool,
}

impl SettingsStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Read a raw setting value / 读取原始设置值
    pub async fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT value FROM site_settings WHERE key = ?"
        )
        .bind(key)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(|(v,)| v))
    }

    /// Write a raw setting value / 写入原始设置值
    pub async fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT OR REPLACE INTO site_settings (key, value, updated_at) VALUES (?, ?, ?)"
        )
        .bind(key)
        .bind(value)
        .bind(&now)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Read a JSON-encoded setting / 读取JSON编码的设置
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get_raw(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Write a JSON-encoded setting / 写入JSON编码的设置
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.set_raw(key, &serde_json::to_string(value)?).await
    }

    /// Get the post type status map (empty when never written) / 获取内容类型状态表
    pub async fn post_type_statuses(&self) -> Result<HashMap<String, bool>> {
        Ok(self
            .get_json(POST_TYPE_STATUSES_KEY)
            .await?
            .unwrap_or_default())
    }

    /// Replace the post type status map wholesale / 整体替换内容类型状态表
    ///
    /// This is a full overwrite: keys absent from `statuses` are dropped, not
    /// merged. Callers that submit a partial map delete the omitted entries.
    pub async fn set_post_type_statuses(&self, statuses: &HashMap<String, bool>) -> Result<()> {
        self.set_json(POST_TYPE_STATUSES_KEY, statuses).await
    }

    /// Whether bulk initialization has run / 批量初始化是否已执行
    pub async fn statuses_initialized(&self) -> Result<bool> {
        Ok(self
            .get_json(STATUSES_INITIALIZED_KEY)
            .await?
            .unwrap_or(false))
    }

    /// Mark bulk initialization as done / 标记批量初始化已完成
    pub async fn set_statuses_initialized(&self) -> Result<()> {
        self.set_json(STATUSES_INITIALIZED_KEY, &true).await
    }
}
