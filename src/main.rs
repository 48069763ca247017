use axum::{
    routing::{get, post},
    Router,
};
use sqlx::sqlite::SqlitePool;
use std::sync::Arc;
use tower_cookies::CookieManagerLayer;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod auth;
mod db;
mod state;

use postscope_backend::config;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "postscope_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration / 加载配置
    let app_config = config::load_config().expect("Failed to load configuration");
    tracing::info!("Server will listen on {}:{}", app_config.server.host, app_config.server.port);

    // Create data directory if not exists / 创建数据目录
    let data_dir = app_config.get_data_dir();
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
        tracing::info!("Created data directory: {:?}", data_dir);
    }

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| app_config.get_database_url());

    let pool = SqlitePool::connect(&database_url).await?;

    db::run_migrations(&pool).await?;

    let state = Arc::new(AppState::new(pool.clone()));

    // Load persisted content types into the registry / 加载已保存的内容类型
    for post_type in db::load_content_types(&pool).await? {
        state.registry.register(post_type).await;
    }

    // One-time bulk initialization of the status map / 状态表的一次性批量初始化
    state.sync.initialize().await?;

    // Wire registry events to the status synchronizer / 将注册表事件接入状态同步器
    // Subscribed only after initialization: the listener must observe runtime
    // registrations only, never the startup ones already covered by the bulk
    // initializer.
    {
        let sync = state.sync.clone();
        let mut events = state.registry.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        if let Err(e) = sync.apply_event(&event).await {
                            tracing::warn!("Failed to sync post type status: {}", e);
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("Registry event listener lagged, {} events skipped", skipped);
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    let app = Router::new()
        .route("/api/health", get(api::server::health_check))
        .route("/api/auth/login", post(api::auth::login))
        .route("/api/auth/logout", post(api::auth::logout))
        .route("/api/auth/me", get(api::auth::me))
        .route("/api/post-types", get(api::post_types::get_post_types))
        .route("/api/post-types", post(api::post_types::register_post_type))
        .route("/api/post-types/status", post(api::post_types::update_post_type_status))
        .route("/api/post-types/:name/delete", post(api::post_types::unregister_post_type))
        .route("/api/posts", get(api::posts::list_posts))
        .route("/api/posts", post(api::posts::create_post))
        .route("/api/search", post(api::search::search))
        .layer(CookieManagerLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state.clone());

    let bind_addr = app_config.get_bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server running at http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
