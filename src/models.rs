use serde::{Deserialize, Serialize};

/// A registered content type / 已注册的内容类型
///
/// `exclude_from_search` is the type's own default, declared at registration
/// time. The administrator's per-type choice lives in the persisted status
/// map, not here.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PostType {
    pub name: String,
    pub label: String,
    pub public: bool,
    pub exclude_from_search: bool,
}

impl PostType {
    pub fn new(name: &str, label: &str, public: bool, exclude_from_search: bool) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            public,
            exclude_from_search,
        }
    }
}

/// A content entry / 内容条目
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: String,
    pub post_type: String,
    pub title: String,
    pub content: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_admin: bool,
    pub enabled: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    pub is_admin: bool,
}

/// Register content type request / 注册内容类型请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterPostTypeRequest {
    pub name: String,
    pub label: Option<String>,
    #[serde(default = "default_true")]
    pub public: bool,
    #[serde(default)]
    pub exclude_from_search: bool,
}

fn default_true() -> bool {
    true
}
