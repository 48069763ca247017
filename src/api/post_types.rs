use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::auth::require_admin;
use crate::state::AppState;
use postscope_backend::models::{PostType, RegisterPostTypeRequest};

/// GET /api/post-types - 获取内容类型及其搜索状态
///
/// Returns `{ "<post_type>": bool, ... }` once the status map has been
/// initialized. Before that it degrades to a plain array of the registered
/// public post type names; clients must accept both shapes and treat missing
/// entries as searchable.
pub async fn get_post_types(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let names = state.registry.public_post_type_names().await;

    let statuses = state
        .settings
        .post_type_statuses()
        .await
        .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "服务器错误"}))))?;

    // 状态表尚未初始化时，原样返回类型名称列表
    if statuses.is_empty() {
        return Ok(Json(json!(names)));
    }

    let mut result = Map::new();
    for name in names {
        let searchable = statuses.get(&name).copied().unwrap_or(true);
        result.insert(name, Value::Bool(searchable));
    }

    Ok(Json(Value::Object(result)))
}

/// POST /api/post-types/status - 整体更新搜索状态（需要管理员权限）
///
/// The submitted map replaces the stored one wholesale; omitted post types
/// are dropped. The admin UI always submits the complete set, so this is the
/// intended contract rather than a merge.
pub async fn update_post_type_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(statuses): Json<HashMap<String, bool>>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    require_admin(&headers, &state.db).await?;

    state
        .settings
        .set_post_type_statuses(&statuses)
        .await
        .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "保存失败"}))))?;

    tracing::info!("Post type statuses updated ({} types)", statuses.len());

    Ok(Json(json!({
        "code": 200,
        "message": "Post type status updated successfully."
    })))
}

/// POST /api/post-types - 注册新内容类型（需要管理员权限）
pub async fn register_post_type(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<RegisterPostTypeRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    require_admin(&headers, &state.db).await?;

    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err((StatusCode::BAD_REQUEST, Json(json!({"error": "类型名称不能为空"}))));
    }

    let label = req.label.unwrap_or_else(|| name.clone());
    let post_type = PostType::new(&name, &label, req.public, req.exclude_from_search);

    let now = Utc::now().to_rfc3339();
    sqlx::query(
        "INSERT OR REPLACE INTO content_types (name, label, public, exclude_from_search, builtin, created_at) VALUES (?, ?, ?, ?, 0, ?)"
    )
    .bind(&post_type.name)
    .bind(&post_type.label)
    .bind(post_type.public)
    .bind(post_type.exclude_from_search)
    .bind(&now)
    .execute(&state.db)
    .await
    .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "保存失败"}))))?;

    // 通过注册表广播，由同步器增量更新状态表
    state.registry.register(post_type.clone()).await;

    Ok(Json(json!({ "code": 200, "message": "success", "data": post_type })))
}

/// POST /api/post-types/:name/delete - 注销内容类型（需要管理员权限）
pub async fn unregister_post_type(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    require_admin(&headers, &state.db).await?;

    let builtin: Option<(bool,)> =
        sqlx::query_as("SELECT builtin FROM content_types WHERE name = ?")
            .bind(&name)
            .fetch_optional(&state.db)
            .await
            .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "服务器错误"}))))?;

    match builtin {
        None => {
            return Err((StatusCode::NOT_FOUND, Json(json!({"error": "内容类型不存在"}))));
        }
        Some((true,)) => {
            return Err((StatusCode::BAD_REQUEST, Json(json!({"error": "内置类型不能注销"}))));
        }
        Some((false,)) => {}
    }

    sqlx::query("DELETE FROM content_types WHERE name = ?")
        .bind(&name)
        .execute(&state.db)
        .await
        .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "删除失败"}))))?;

    state.registry.unregister(&name).await;

    Ok(Json(json!({ "code": 200, "message": "success" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use sqlx::SqlitePool;

    async fn test_state() -> Arc<AppState> {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        crate::db::run_migrations(&pool).await.unwrap();

        let state = Arc::new(AppState::new(pool));
        state
            .registry
            .register(PostType::new("post", "Posts", true, false))
            .await;
        state
            .registry
            .register(PostType::new("page", "Pages", true, false))
            .await;
        state
    }

    #[tokio::test]
    async fn test_get_post_types_falls_back_to_name_list() {
        let state = test_state().await;

        // 状态表为空时返回纯名称数组
        let Json(body) = get_post_types(State(state)).await.unwrap();
        let names: Vec<String> = serde_json::from_value(body).unwrap();
        assert_eq!(names, vec!["page".to_string(), "post".to_string()]);
    }

    #[tokio::test]
    async fn test_get_post_types_returns_status_map() {
        let state = test_state().await;

        let mut statuses = HashMap::new();
        statuses.insert("post".to_string(), false);
        state
            .settings
            .set_post_type_statuses(&statuses)
            .await
            .unwrap();

        let Json(body) = get_post_types(State(state)).await.unwrap();
        let map = body.as_object().unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("post"), Some(&Value::Bool(false)));
        // 状态表中缺失的类型默认可搜索
        assert_eq!(map.get("page"), Some(&Value::Bool(true)));
    }
}
