//! SQLite Library Repository

use async_trait::async_trait;
use sqlx::FromRow;
use uuid::Uuid;

use super::user_repo::{parse_datetime, parse_uuid};
use super::DbPool;
use crate::application::ports::{LibraryRepositoryPort, RepositoryError, UserBookRecord};
use crate::domain::library::ReadingStatus;

/// SQLite Library Repository
pub struct SqliteLibraryRepository {
    pool: DbPool,
}

impl SqliteLibraryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct UserBookRow {
    id: String,
    user_id: String,
    book_id: String,
    status: String,
    progress: Option<i64>,
    current_page: Option<i64>,
    started_at: Option<String>,
    finished_at: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<UserBookRow> for UserBookRecord {
    type Error = RepositoryError;

    fn try_from(row: UserBookRow) -> Result<Self, Self::Error> {
        Ok(UserBookRecord {
            id: parse_uuid(&row.id)?,
            user_id: parse_uuid(&row.user_id)?,
            book_id: parse_uuid(&row.book_id)?,
            status: ReadingStatus::from_str(&row.status).ok_or_else(|| {
                RepositoryError::SerializationError(format!(
                    "unknown reading status: {}",
                    row.status
                ))
            })?,
            progress: row.progress.map(|p| p as u8),
            current_page: row.current_page.map(|p| p as u32),
            started_at: row.started_at.as_deref().map(parse_datetime).transpose()?,
            finished_at: row.finished_at.as_deref().map(parse_datetime).transpose()?,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}

const USER_BOOK_COLUMNS: &str = "id, user_id, book_id, status, progress, current_page, started_at, finished_at, created_at, updated_at";

#[async_trait]
impl LibraryRepositoryPort for SqliteLibraryRepository {
    async fn save(&self, user_book: &UserBookRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO user_books (
                id, user_id, book_id, status, progress, current_page,
                started_at, finished_at, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                status = excluded.status,
                progress = excluded.progress,
                current_page = excluded.current_page,
                started_at = excluded.started_at,
                finished_at = excluded.finished_at,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_book.id.to_string())
        .bind(user_book.user_id.to_string())
        .bind(user_book.book_id.to_string())
        .bind(user_book.status.as_str())
        .bind(user_book.progress.map(|p| p as i64))
        .bind(user_book.current_page.map(|p| p as i64))
        .bind(user_book.started_at.map(|dt| dt.to_rfc3339()))
        .bind(user_book.finished_at.map(|dt| dt.to_rfc3339()))
        .bind(user_book.created_at.to_rfc3339())
        .bind(user_book.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserBookRecord>, RepositoryError> {
        let row: Option<UserBookRow> = sqlx::query_as(&format!(
            "SELECT {} FROM user_books WHERE id = ?",
            USER_BOOK_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        row.map(UserBookRecord::try_from).transpose()
    }

    async fn find_by_user_and_book(
        &self,
        user_id: Uuid,
        book_id: Uuid,
    ) -> Result<Option<UserBookRecord>, RepositoryError> {
        let row: Option<UserBookRow> = sqlx::query_as(&format!(
            "SELECT {} FROM user_books WHERE user_id = ? AND book_id = ?",
            USER_BOOK_COLUMNS
        ))
        .bind(user_id.to_string())
        .bind(book_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        row.map(UserBookRecord::try_from).transpose()
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<UserBookRecord>, RepositoryError> {
        let rows: Vec<UserBookRow> = sqlx::query_as(&format!(
            "SELECT {} FROM user_books WHERE user_id = ? ORDER BY updated_at DESC",
            USER_BOOK_COLUMNS
        ))
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        rows.into_iter().map(UserBookRecord::try_from).collect()
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        // 使用事务确保级联删除原子性
        let mut tx = self.pool.begin().await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        // 删除关联的 tracks（通过 playlists）
        sqlx::query(
            "DELETE FROM tracks WHERE playlist_id IN (SELECT id FROM playlists WHERE user_book_id = ?)"
        )
        .bind(id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        // 删除关联的 playlists
        sqlx::query("DELETE FROM playlists WHERE user_book_id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        // 删除关联的分析
        sqlx::query("DELETE FROM book_analyses WHERE user_book_id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        // 删除 user_book
        sqlx::query("DELETE FROM user_books WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        tx.commit().await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::{create_pool, run_migrations, DatabaseConfig};
    use super::*;
    use chrono::Utc;

    async fn test_repo() -> SqliteLibraryRepository {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        // 仓储隔离测试直接插入子表行而不预置父表（users/books 等），
        // 关闭外键强制（sqlx 默认开启）以匹配这些用例的设计意图。
        sqlx::query("PRAGMA foreign_keys = OFF").execute(&pool).await.unwrap();
        SqliteLibraryRepository::new(pool)
    }

    fn sample_user_book(user_id: Uuid, book_id: Uuid) -> UserBookRecord {
        let now = Utc::now();
        UserBookRecord {
            id: Uuid::new_v4(),
            user_id,
            book_id,
            status: ReadingStatus::WantToRead,
            progress: None,
            current_page: None,
            started_at: None,
            finished_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_save_and_find() {
        let repo = test_repo().await;
        let user_id = Uuid::new_v4();
        let user_book = sample_user_book(user_id, Uuid::new_v4());

        repo.save(&user_book).await.unwrap();

        let found = repo.find_by_id(user_book.id).await.unwrap().unwrap();
        assert_eq!(found.status, ReadingStatus::WantToRead);

        let by_user = repo.find_by_user(user_id).await.unwrap();
        assert_eq!(by_user.len(), 1);
    }

    #[tokio::test]
    async fn test_save_is_upsert() {
        let repo = test_repo().await;
        let mut user_book = sample_user_book(Uuid::new_v4(), Uuid::new_v4());
        repo.save(&user_book).await.unwrap();

        user_book.status = ReadingStatus::CurrentlyReading;
        user_book.started_at = Some(Utc::now());
        repo.save(&user_book).await.unwrap();

        let found = repo.find_by_id(user_book.id).await.unwrap().unwrap();
        assert_eq!(found.status, ReadingStatus::CurrentlyReading);
        assert!(found.started_at.is_some());
    }

    #[tokio::test]
    async fn test_duplicate_user_book_rejected() {
        let repo = test_repo().await;
        let user_id = Uuid::new_v4();
        let book_id = Uuid::new_v4();

        repo.save(&sample_user_book(user_id, book_id)).await.unwrap();
        assert!(repo.save(&sample_user_book(user_id, book_id)).await.is_err());
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = test_repo().await;
        let user_book = sample_user_book(Uuid::new_v4(), Uuid::new_v4());
        repo.save(&user_book).await.unwrap();

        repo.delete(user_book.id).await.unwrap();
        assert!(repo.find_by_id(user_book.id).await.unwrap().is_none());
    }
}
