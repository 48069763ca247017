use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::auth::require_admin;
use crate::state::AppState;
use postscope_backend::models::Post;

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub post_type: String,
    pub title: String,
    pub content: String,
}

/// POST /api/posts - 创建内容（需要管理员权限）
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreatePostRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    require_admin(&headers, &state.db).await?;

    // 内容必须属于已注册的类型
    if state.registry.get(&req.post_type).await.is_none() {
        return Err((StatusCode::BAD_REQUEST, Json(json!({"error": "未知的内容类型"}))));
    }

    let now = Utc::now().to_rfc3339();
    let post = Post {
        id: uuid::Uuid::new_v4().to_string(),
        post_type: req.post_type,
        title: req.title,
        content: req.content,
        status: "publish".to_string(),
        created_at: now.clone(),
        updated_at: now,
    };

    sqlx::query(
        "INSERT INTO posts (id, post_type, title, content, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)"
    )
    .bind(&post.id)
    .bind(&post.post_type)
    .bind(&post.title)
    .bind(&post.content)
    .bind(&post.status)
    .bind(&post.created_at)
    .bind(&post.updated_at)
    .execute(&state.db)
    .await
    .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "保存失败"}))))?;

    Ok(Json(json!({ "code": 200, "message": "success", "data": post })))
}

/// GET /api/posts - 列出最新内容
pub async fn list_posts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let posts = sqlx::query_as::<_, Post>(
        "SELECT * FROM posts WHERE status = 'publish' ORDER BY created_at DESC LIMIT 50"
    )
    .fetch_all(&state.db)
    .await
    .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "服务器错误"}))))?;

    Ok(Json(json!({ "code": 200, "message": "success", "data": posts })))
}
