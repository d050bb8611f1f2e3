//! SQLite Book Repository

use async_trait::async_trait;
use sqlx::FromRow;
use uuid::Uuid;

use super::user_repo::{parse_datetime, parse_uuid};
use super::DbPool;
use crate::application::ports::{BookRecord, BookRepositoryPort, RepositoryError};
use crate::domain::book::BookSource;

/// SQLite Book Repository
pub struct SqliteBookRepository {
    pool: DbPool,
}

impl SqliteBookRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct BookRow {
    id: String,
    title: String,
    authors: String,
    description: Option<String>,
    cover_image_url: Option<String>,
    genres: String,
    source: String,
    external_id: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<BookRow> for BookRecord {
    type Error = RepositoryError;

    fn try_from(row: BookRow) -> Result<Self, Self::Error> {
        Ok(BookRecord {
            id: parse_uuid(&row.id)?,
            title: row.title,
            authors: serde_json::from_str(&row.authors)
                .map_err(|e| RepositoryError::SerializationError(e.to_string()))?,
            description: row.description,
            cover_image_url: row.cover_image_url,
            genres: serde_json::from_str(&row.genres)
                .map_err(|e| RepositoryError::SerializationError(e.to_string()))?,
            source: BookSource::from_str(&row.source).ok_or_else(|| {
                RepositoryError::SerializationError(format!("unknown book source: {}", row.source))
            })?,
            external_id: row.external_id,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}

const BOOK_COLUMNS: &str = "id, title, authors, description, cover_image_url, genres, source, external_id, created_at, updated_at";

#[async_trait]
impl BookRepositoryPort for SqliteBookRepository {
    async fn save(&self, book: &BookRecord) -> Result<(), RepositoryError> {
        let authors = serde_json::to_string(&book.authors)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;
        let genres = serde_json::to_string(&book.genres)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO books (
                id, title, authors, description, cover_image_url,
                genres, source, external_id, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                authors = excluded.authors,
                description = excluded.description,
                cover_image_url = excluded.cover_image_url,
                genres = excluded.genres,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(book.id.to_string())
        .bind(&book.title)
        .bind(authors)
        .bind(&book.description)
        .bind(&book.cover_image_url)
        .bind(genres)
        .bind(book.source.as_str())
        .bind(&book.external_id)
        .bind(book.created_at.to_rfc3339())
        .bind(book.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<BookRecord>, RepositoryError> {
        let row: Option<BookRow> =
            sqlx::query_as(&format!("SELECT {} FROM books WHERE id = ?", BOOK_COLUMNS))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        row.map(BookRecord::try_from).transpose()
    }

    async fn find_by_source(
        &self,
        source: BookSource,
        external_id: &str,
    ) -> Result<Option<BookRecord>, RepositoryError> {
        let row: Option<BookRow> = sqlx::query_as(&format!(
            "SELECT {} FROM books WHERE source = ? AND external_id = ?",
            BOOK_COLUMNS
        ))
        .bind(source.as_str())
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        row.map(BookRecord::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::super::{create_pool, run_migrations, DatabaseConfig};
    use super::*;
    use chrono::Utc;

    async fn test_repo() -> SqliteBookRepository {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteBookRepository::new(pool)
    }

    fn sample_book(source: BookSource, external_id: Option<&str>) -> BookRecord {
        let now = Utc::now();
        BookRecord {
            id: Uuid::new_v4(),
            title: "The Night Circus".to_string(),
            authors: vec!["Erin Morgenstern".to_string()],
            description: Some("A magical competition.".to_string()),
            cover_image_url: None,
            genres: vec!["Fantasy".to_string(), "Romance".to_string()],
            source,
            external_id: external_id.map(String::from),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_save_and_find_roundtrips_lists() {
        let repo = test_repo().await;
        let book = sample_book(BookSource::GoogleBooks, Some("gb-1"));

        repo.save(&book).await.unwrap();

        let found = repo.find_by_id(book.id).await.unwrap().unwrap();
        assert_eq!(found.authors, vec!["Erin Morgenstern".to_string()]);
        assert_eq!(found.genres.len(), 2);
        assert_eq!(found.source, BookSource::GoogleBooks);
    }

    #[tokio::test]
    async fn test_find_by_source() {
        let repo = test_repo().await;
        let book = sample_book(BookSource::Goodreads, Some("gr-42"));
        repo.save(&book).await.unwrap();

        let found = repo
            .find_by_source(BookSource::Goodreads, "gr-42")
            .await
            .unwrap();
        assert_eq!(found.unwrap().id, book.id);

        let missing = repo
            .find_by_source(BookSource::Kindle, "gr-42")
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_source_external_rejected() {
        let repo = test_repo().await;
        let first = sample_book(BookSource::Goodreads, Some("gr-42"));
        repo.save(&first).await.unwrap();

        // 不同 id 同 (source, external_id) 触碰唯一索引
        let second = sample_book(BookSource::Goodreads, Some("gr-42"));
        assert!(repo.save(&second).await.is_err());
    }

    #[tokio::test]
    async fn test_manual_books_not_deduplicated() {
        let repo = test_repo().await;
        let first = sample_book(BookSource::Manual, None);
        let second = sample_book(BookSource::Manual, None);

        repo.save(&first).await.unwrap();
        repo.save(&second).await.unwrap();
    }
}
