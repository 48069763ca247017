use anyhow::Result;
use chrono::Utc;
use rand::Rng;
use sqlx::SqlitePool;

use postscope_backend::models::PostType;

/// Generate random password / 生成随机密码
fn generate_random_password(length: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghjkmnpqrstuvwxyz23456789!@#$%^&*";
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// Run database migrations / 运行数据库迁移
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            is_admin INTEGER NOT NULL DEFAULT 0,
            enabled INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_sessions (
            token TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            expires_at INTEGER NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS site_settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS content_types (
            name TEXT PRIMARY KEY,
            label TEXT NOT NULL,
            public INTEGER NOT NULL DEFAULT 1,
            exclude_from_search INTEGER NOT NULL DEFAULT 0,
            builtin INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS posts (
            id TEXT PRIMARY KEY,
            post_type TEXT NOT NULL,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'publish',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_posts_type ON posts(post_type)")
        .execute(pool)
        .await?;

    seed_admin_user(pool).await?;
    seed_builtin_content_types(pool).await?;

    Ok(())
}

/// Create the default admin account on first run / 首次运行时创建默认管理员账户
async fn seed_admin_user(pool: &SqlitePool) -> Result<()> {
    let user_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    if user_count.0 > 0 {
        return Ok(());
    }

    let password = generate_random_password(12);
    let password_hash = bcrypt::hash(&password, bcrypt::DEFAULT_COST)?;
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO users (id, username, password_hash, is_admin, enabled, created_at, updated_at) VALUES (?, ?, ?, 1, 1, ?, ?)"
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind("admin")
    .bind(&password_hash)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    tracing::info!("Created default admin account, username: admin, password: {}", password);
    Ok(())
}

/// Built-in content types / 内置内容类型
pub fn builtin_post_types() -> Vec<PostType> {
    vec![
        PostType::new("post", "Posts", true, false),
        PostType::new("page", "Pages", true, false),
        PostType::new("attachment", "Media", true, true),
    ]
}

/// Seed built-in content types on first run / 首次运行时写入内置内容类型
async fn seed_builtin_content_types(pool: &SqlitePool) -> Result<()> {
    let type_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM content_types")
        .fetch_one(pool)
        .await?;

    if type_count.0 > 0 {
        return Ok(());
    }

    let now = Utc::now().to_rfc3339();
    for pt in builtin_post_types() {
        sqlx::query(
            "INSERT INTO content_types (name, label, public, exclude_from_search, builtin, created_at) VALUES (?, ?, ?, ?, 1, ?)"
        )
        .bind(&pt.name)
        .bind(&pt.label)
        .bind(pt.public)
        .bind(pt.exclude_from_search)
        .bind(&now)
        .execute(pool)
        .await?;
    }

    tracing::info!("Seeded built-in content types");
    Ok(())
}

/// Load persisted content types / 加载已保存的内容类型
pub async fn load_content_types(pool: &SqlitePool) -> Result<Vec<PostType>> {
    let types = sqlx::query_as::<_, PostType>(
        "SELECT name, label, public, exclude_from_search FROM content_types"
    )
    .fetch_all(pool)
    .await?;

    Ok(types)
}
