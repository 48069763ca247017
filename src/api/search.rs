use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::api::ApiResponse;
use crate::state::AppState;
use postscope_backend::query::{adjust_search_query, SearchQuery};

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default = "default_page")]
    pub page: usize,
}

fn default_limit() -> usize { 20 }
fn default_page() -> usize { 1 }

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct SearchResultItem {
    pub id: String,
    pub post_type: String,
    pub title: String,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResultItem>,
    pub total: usize,
}

/// POST /api/search - 前台内容搜索
///
/// The one place the main search query is built and executed: the filter
/// narrows it to the searchable post types before it touches the database.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> Json<ApiResponse<SearchResponse>> {
    let keyword = req.query.trim();
    if keyword.is_empty() {
        return Json(ApiResponse::error("搜索关键词不能为空"));
    }

    let statuses = match state.settings.post_type_statuses().await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to load post type statuses: {}", e);
            return Json(ApiResponse::error("服务器错误"));
        }
    };

    let mut query = SearchQuery::main_search(keyword);
    adjust_search_query(&mut query, &statuses);

    let total = match count_search(&state.db, &query).await {
        Ok(total) => total,
        Err(e) => {
            tracing::error!("Search count failed: {}", e);
            return Json(ApiResponse::error("搜索失败"));
        }
    };

    let offset = req.page.saturating_sub(1) * req.limit;
    match run_search(&state.db, &query, req.limit, offset).await {
        Ok(results) => Json(ApiResponse::success(SearchResponse { results, total })),
        Err(e) => {
            tracing::error!("Search failed: {}", e);
            Json(ApiResponse::error("搜索失败"))
        }
    }
}

/// Escape LIKE wildcards in a user keyword / 转义用户关键词中的LIKE通配符
///
/// `%` and `_` in the keyword must match literally, not as wildcards.
fn escape_like(keyword: &str) -> String {
    keyword
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Execute a search query against the posts table / 对posts表执行搜索查询
///
/// An empty restriction list means no post types are searchable, so the
/// query short-circuits to zero results instead of querying unrestricted.
pub async fn run_search(
    pool: &SqlitePool,
    query: &SearchQuery,
    limit: usize,
    offset: usize,
) -> Result<Vec<SearchResultItem>, sqlx::Error> {
    let pattern = format!("%{}%", escape_like(&query.keyword));

    let sql = match &query.post_types {
        Some(types) if types.is_empty() => {
            return Ok(Vec::new());
        }
        Some(types) => {
            let placeholders = vec!["?"; types.len()].join(", ");
            format!(
                "SELECT id, post_type, title, created_at FROM posts \
                 WHERE status = 'publish' \
                 AND (title LIKE ? ESCAPE '\\' OR content LIKE ? ESCAPE '\\') \
                 AND post_type IN ({}) \
                 ORDER BY created_at DESC LIMIT ? OFFSET ?",
                placeholders
            )
        }
        None => {
            "SELECT id, post_type, title, created_at FROM posts \
             WHERE status = 'publish' \
             AND (title LIKE ? ESCAPE '\\' OR content LIKE ? ESCAPE '\\') \
             ORDER BY created_at DESC LIMIT ? OFFSET ?"
                .to_string()
        }
    };

    let mut sql_query = sqlx::query_as::<_, SearchResultItem>(&sql)
        .bind(&pattern)
        .bind(&pattern);

    if let Some(types) = &query.post_types {
        for post_type in types {
            sql_query = sql_query.bind(post_type);
        }
    }

    sql_query
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(pool)
        .await
}

/// Count all matches of a search query / 统计搜索查询的全部匹配数
pub async fn count_search(pool: &SqlitePool, query: &SearchQuery) -> Result<usize, sqlx::Error> {
    let pattern = format!("%{}%", escape_like(&query.keyword));

    let sql = match &query.post_types {
        Some(types) if types.is_empty() => {
            return Ok(0);
        }
        Some(types) => {
            let placeholders = vec!["?"; types.len()].join(", ");
            format!(
                "SELECT COUNT(*) FROM posts \
                 WHERE status = 'publish' \
                 AND (title LIKE ? ESCAPE '\\' OR content LIKE ? ESCAPE '\\') \
                 AND post_type IN ({})",
                placeholders
            )
        }
        None => {
            "SELECT COUNT(*) FROM posts \
             WHERE status = 'publish' \
             AND (title LIKE ? ESCAPE '\\' OR content LIKE ? ESCAPE '\\')"
                .to_string()
        }
    };

    let mut sql_query = sqlx::query_as::<_, (i64,)>(&sql)
        .bind(&pattern)
        .bind(&pattern);

    if let Some(types) = &query.post_types {
        for post_type in types {
            sql_query = sql_query.bind(post_type);
        }
    }

    let (count,) = sql_query.fetch_one(pool).await?;
    Ok(count as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        crate::db::run_migrations(&pool).await.unwrap();

        for (id, post_type, title) in [
            ("1", "post", "Hello world"),
            ("2", "page", "Hello page"),
            ("3", "event", "Hello event"),
            ("4", "post", "Unrelated title"),
        ] {
            sqlx::query(
                "INSERT INTO posts (id, post_type, title, content, status, created_at, updated_at) VALUES (?, ?, ?, 'body', 'publish', ?, ?)"
            )
            .bind(id)
            .bind(post_type)
            .bind(title)
            .bind(id)
            .bind(id)
            .execute(&pool)
            .await
            .unwrap();
        }
        pool
    }

    fn statuses(entries: &[(&str, bool)]) -> HashMap<String, bool> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[tokio::test]
    async fn test_search_restricted_to_searchable_types() {
        let pool = test_pool().await;
        let statuses = statuses(&[("post", true), ("page", false), ("event", true)]);

        let mut query = SearchQuery::main_search("Hello");
        adjust_search_query(&mut query, &statuses);

        let results = run_search(&pool, &query, 20, 0).await.unwrap();
        let types: Vec<&str> = results.iter().map(|r| r.post_type.as_str()).collect();
        assert_eq!(results.len(), 2);
        assert!(types.contains(&"post"));
        assert!(types.contains(&"event"));
        assert!(!types.contains(&"page"));
    }

    #[tokio::test]
    async fn test_empty_restriction_returns_nothing() {
        let pool = test_pool().await;
        let statuses = statuses(&[("post", false), ("page", false)]);

        let mut query = SearchQuery::main_search("Hello");
        adjust_search_query(&mut query, &statuses);

        let results = run_search(&pool, &query, 20, 0).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_unrestricted_query_searches_all_types() {
        let pool = test_pool().await;

        // 未经过滤器的查询不带限制
        let query = SearchQuery::main_search("Hello");
        let results = run_search(&pool, &query, 20, 0).await.unwrap();
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn test_like_wildcards_match_literally() {
        let pool = test_pool().await;
        sqlx::query(
            "INSERT INTO posts (id, post_type, title, content, status, created_at, updated_at) VALUES ('5', 'post', '50% off sale', 'body', 'publish', '5', '5')"
        )
        .execute(&pool)
        .await
        .unwrap();

        let statuses = statuses(&[("post", true), ("page", true), ("event", true)]);

        // "%" 只能匹配字面百分号，不得匹配所有内容
        let mut query = SearchQuery::main_search("%");
        adjust_search_query(&mut query, &statuses);
        let results = run_search(&pool, &query, 20, 0).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "50% off sale");

        // "_" 同样按字面匹配
        let mut query = SearchQuery::main_search("_");
        adjust_search_query(&mut query, &statuses);
        assert!(run_search(&pool, &query, 20, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_count_covers_all_pages() {
        let pool = test_pool().await;
        let statuses = statuses(&[("post", true), ("event", true)]);

        let mut query = SearchQuery::main_search("Hello");
        adjust_search_query(&mut query, &statuses);

        // 第一页只取一条，但总数仍是全部匹配数
        let page = run_search(&pool, &query, 1, 0).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(count_search(&pool, &query).await.unwrap(), 2);

        // 空限制列表的总数为零
        let empty = SearchQuery {
            post_types: Some(Vec::new()),
            ..SearchQuery::main_search("Hello")
        };
        assert_eq!(count_search(&pool, &empty).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_keyword_matches_content() {
        let pool = test_pool().await;
        let statuses = statuses(&[("post", true)]);

        let mut query = SearchQuery::main_search("body");
        adjust_search_query(&mut query, &statuses);

        let results = run_search(&pool, &query, 20, 0).await.unwrap();
        assert_eq!(results.len(), 2);
    }
}
