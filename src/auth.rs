use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde_json::{json, Value};
use sqlx::SqlitePool;

use postscope_backend::models::UserInfo;

pub const SESSION_COOKIE_NAME: &str = "session_token";

// 从Cookie中提取session token
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    headers.get("cookie")
        .and_then(|cookie_header| cookie_header.to_str().ok())
        .and_then(|cookie_str| {
            for cookie in cookie_str.split(';') {
                let cookie = cookie.trim();
                if let Some((key, value)) = cookie.split_once('=') {
                    if key.trim() == SESSION_COOKIE_NAME {
                        return Some(value.trim().to_string());
                    }
                }
            }
            None
        })
}

// 验证session token，返回用户信息
async fn verify_session_token(token: &str, pool: &SqlitePool) -> Option<UserInfo> {
    sqlx::query_as::<_, (String, String, bool)>(
        "SELECT u.id, u.username, u.is_admin FROM users u
         JOIN user_sessions s ON u.id = s.user_id
         WHERE s.token = ? AND s.expires_at > ? AND u.enabled = 1"
    )
    .bind(token)
    .bind(chrono::Utc::now().timestamp())
    .fetch_optional(pool)
    .await
    .ok()
    .flatten()
    .map(|(id, username, is_admin)| UserInfo { id, username, is_admin })
}

// 获取当前登录用户
pub async fn get_current_user(headers: &HeaderMap, pool: &SqlitePool) -> Option<UserInfo> {
    let token = extract_session_token(headers)?;
    verify_session_token(&token, pool).await
}

/// 验证管理员权限，未登录返回401，非管理员返回403
pub async fn require_admin(
    headers: &HeaderMap,
    pool: &SqlitePool,
) -> Result<UserInfo, (StatusCode, Json<Value>)> {
    let token = extract_session_token(headers)
        .ok_or_else(|| (StatusCode::UNAUTHORIZED, Json(json!({"error": "未登录"}))))?;

    let user = verify_session_token(&token, pool)
        .await
        .ok_or_else(|| (StatusCode::UNAUTHORIZED, Json(json!({"error": "无效的session或已过期"}))))?;

    if !user.is_admin {
        return Err((StatusCode::FORBIDDEN, Json(json!({"error": "需要管理员权限"}))));
    }

    Ok(user)
}

// 创建session
pub async fn create_session(user_id: &str, pool: &SqlitePool) -> Result<String, String> {
    use rand::Rng;
    let token: String = rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();

    // 设置过期时间（7天）
    let expires_at = chrono::Utc::now().timestamp() + 7 * 24 * 60 * 60;

    // 删除该用户的旧session
    let _ = sqlx::query("DELETE FROM user_sessions WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await;

    sqlx::query("INSERT INTO user_sessions (token, user_id, expires_at) VALUES (?, ?, ?)")
        .bind(&token)
        .bind(user_id)
        .bind(expires_at)
        .execute(pool)
        .await
        .map_err(|_| "创建session失败".to_string())?;

    Ok(token)
}

// 删除session（登出）
pub async fn delete_session(token: &str, pool: &SqlitePool) -> Result<(), String> {
    sqlx::query("DELETE FROM user_sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await
        .map_err(|_| "删除session失败".to_string())?;

    Ok(())
}
