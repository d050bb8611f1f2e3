//! SQLite Database - 数据库连接和迁移

use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::path::Path;

/// 数据库配置
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// 数据库文件路径
    pub database_url: String,
    /// 最大连接数
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:./data/underscore.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

impl DatabaseConfig {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            database_url: format!("sqlite:{}?mode=rwc", path.as_ref().display()),
            max_connections: 5,
        }
    }

    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
        }
    }
}

/// 数据库连接池
pub type DbPool = Pool<Sqlite>;

/// 创建数据库连接池
pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;

    // 启用 WAL 模式，允许并发读写
    sqlx::query("PRAGMA journal_mode=WAL")
        .execute(&pool)
        .await?;

    // 设置 busy_timeout=5000ms，遇到锁时等待而不是立即失败
    sqlx::query("PRAGMA busy_timeout=5000")
        .execute(&pool)
        .await?;

    // 设置同步模式为 NORMAL（平衡性能和安全性）
    sqlx::query("PRAGMA synchronous=NORMAL")
        .execute(&pool)
        .await?;

    tracing::info!("SQLite pool created with WAL mode and busy_timeout=5000ms");

    Ok(pool)
}

/// 运行数据库迁移
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    // 创建 users 表
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            display_name TEXT NOT NULL,
            default_music_service TEXT,
            auto_generate_playlists INTEGER NOT NULL DEFAULT 0,
            instrumental_only INTEGER NOT NULL DEFAULT 0,
            playlist_length TEXT NOT NULL DEFAULT 'medium',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // 创建 service_connections 表（每用户每服务至多一条）
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS service_connections (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            service TEXT NOT NULL,
            connected_at TEXT NOT NULL,
            access_token TEXT NOT NULL,
            refresh_token TEXT,
            expires_at TEXT,
            external_user_id TEXT NOT NULL,
            detail_value TEXT NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
            UNIQUE (user_id, service)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // 创建 books 表（列表字段存 JSON 文本）
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS books (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            authors TEXT NOT NULL,
            description TEXT,
            cover_image_url TEXT,
            genres TEXT NOT NULL,
            source TEXT NOT NULL,
            external_id TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // 携带外部 ID 的来源按 (source, external_id) 去重
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_books_source_external
        ON books(source, external_id)
        WHERE external_id IS NOT NULL
        "#,
    )
    .execute(pool)
    .await?;

    // 创建 user_books 表
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_books (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            book_id TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'want-to-read',
            progress INTEGER,
            current_page INTEGER,
            started_at TEXT,
            finished_at TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users(id),
            FOREIGN KEY (book_id) REFERENCES books(id),
            UNIQUE (user_id, book_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // 创建 book_analyses 表（user_book 一一对应）
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS book_analyses (
            id TEXT PRIMARY KEY,
            user_book_id TEXT NOT NULL UNIQUE,
            analyzed_at TEXT NOT NULL,
            mood TEXT NOT NULL,
            themes TEXT NOT NULL,
            era TEXT,
            location TEXT,
            atmosphere TEXT,
            pace TEXT NOT NULL,
            intensity TEXT NOT NULL,
            time_of_day TEXT NOT NULL,
            vibe TEXT NOT NULL,
            music_description TEXT NOT NULL,
            analysis_source TEXT NOT NULL,
            confidence REAL NOT NULL,
            model_used TEXT NOT NULL,
            FOREIGN KEY (user_book_id) REFERENCES user_books(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    // 创建 playlists 表
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS playlists (
            id TEXT PRIMARY KEY,
            user_book_id TEXT NOT NULL,
            name TEXT NOT NULL,
            description TEXT,
            total_duration INTEGER NOT NULL DEFAULT 0,
            generated_at TEXT NOT NULL,
            generation_prompt TEXT NOT NULL,
            spotify_playlist_id TEXT,
            apple_music_playlist_id TEXT,
            youtube_music_playlist_id TEXT,
            is_active INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (user_book_id) REFERENCES user_books(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    // 创建 tracks 表
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tracks (
            id TEXT PRIMARY KEY,
            playlist_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            title TEXT NOT NULL,
            artist TEXT NOT NULL,
            album TEXT,
            duration_secs INTEGER NOT NULL,
            spotify_id TEXT,
            apple_music_id TEXT,
            youtube_music_id TEXT,
            is_instrumental INTEGER,
            mood_tags TEXT NOT NULL,
            ai_rationale TEXT,
            FOREIGN KEY (playlist_id) REFERENCES playlists(id) ON DELETE CASCADE,
            UNIQUE (playlist_id, position)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // 创建索引
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_user_books_user_id
        ON user_books(user_id)
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_playlists_user_book_id
        ON playlists(user_book_id)
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_tracks_playlist_id
        ON tracks(playlist_id)
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_service_connections_user_id
        ON service_connections(user_id)
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database migrations completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_in_memory_db() {
        let config = DatabaseConfig::in_memory();
        let pool = create_pool(&config).await.unwrap();
        run_migrations(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn test_migrations_idempotent() {
        let config = DatabaseConfig::in_memory();
        let pool = create_pool(&config).await.unwrap();
        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();
    }
}
