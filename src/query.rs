//! Search query filter / 搜索查询过滤
//!
//! Restricts the main front-end search query to the post types an
//! administrator has left searchable.

use std::collections::HashMap;

/// A content query about to be executed / 即将执行的内容查询
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub keyword: String,
    /// Whether this is the main query of the request / 是否为请求的主查询
    pub is_main_query: bool,
    /// Whether the query runs in an admin context / 是否在管理后台上下文中
    pub is_admin: bool,
    /// Whether the query is a search / 是否为搜索查询
    pub is_search: bool,
    /// Post type restriction; `None` means unrestricted / 内容类型限制
    pub post_types: Option<Vec<String>>,
}

impl SearchQuery {
    /// The main front-end search query / 前台主搜索查询
    pub fn main_search(keyword: &str) -> Self {
        Self {
            keyword: keyword.to_string(),
            is_main_query: true,
            is_admin: false,
            is_search: true,
            post_types: None,
        }
    }
}

/// Constrain a search query to the searchable post types / 将搜索限制到可搜索类型
///
/// Only acts on the main, non-admin search query; anything else is left
/// untouched. The restriction is exactly the set of map keys whose value is
/// true. Note that a map with no true entries produces an empty restriction
/// list, which the executor treats as "no post types": the search returns
/// nothing rather than everything.
pub fn adjust_search_query(query: &mut SearchQuery, statuses: &HashMap<String, bool>) {
    if query.is_admin || !query.is_main_query || !query.is_search {
        return;
    }

    let searchable: Vec<String> = statuses
        .iter()
        .filter(|(_, &included)| included)
        .map(|(post_type, _)| post_type.clone())
        .collect();

    query.post_types = Some(searchable);
}
