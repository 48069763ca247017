use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_cookies::{Cookie, Cookies};

use crate::auth::{self, SESSION_COOKIE_NAME};
use crate::state::AppState;
use postscope_backend::models::{LoginRequest, User};

pub async fn login(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let user = sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE username = ? AND enabled = 1"
    )
    .bind(&req.username)
    .fetch_optional(&state.db)
    .await
    .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "服务器错误"}))))?
    .ok_or_else(|| (StatusCode::UNAUTHORIZED, Json(json!({"error": "账号或密码错误"}))))?;

    let valid = bcrypt::verify(&req.password, &user.password_hash)
        .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "服务器错误"}))))?;

    if !valid {
        return Err((StatusCode::UNAUTHORIZED, Json(json!({"error": "账号或密码错误"}))));
    }

    let token = auth::create_session(&user.id, &state.db)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": e}))))?;

    let mut cookie = Cookie::new(SESSION_COOKIE_NAME, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookies.add(cookie);

    tracing::info!("User logged in: {}", user.username);

    Ok(Json(json!({
        "code": 200,
        "message": "success",
        "user": {
            "id": user.id,
            "username": user.username,
            "is_admin": user.is_admin
        }
    })))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    headers: HeaderMap,
) -> Json<Value> {
    if let Some(token) = auth::extract_session_token(&headers) {
        let _ = auth::delete_session(&token, &state.db).await;
    }
    cookies.remove(Cookie::new(SESSION_COOKIE_NAME, ""));

    Json(json!({ "code": 200, "message": "success" }))
}

/// GET /api/auth/me - 当前登录用户
pub async fn me(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let user = auth::get_current_user(&headers, &state.db)
        .await
        .ok_or_else(|| (StatusCode::UNAUTHORIZED, Json(json!({"error": "未登录"}))))?;

    Ok(Json(json!({ "code": 200, "message": "success", "user": user })))
}
