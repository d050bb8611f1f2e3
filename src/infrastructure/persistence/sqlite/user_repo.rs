//! SQLite User Repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::DbPool;
use crate::application::ports::{
    RepositoryError, ServiceConnectionRecord, UserRecord, UserRepositoryPort,
};
use crate::domain::user::{MusicService, PlaylistLength, UserPreferences};

/// SQLite User Repository
pub struct SqliteUserRepository {
    pool: DbPool,
}

impl SqliteUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct UserRow {
    id: String,
    email: String,
    display_name: String,
    default_music_service: Option<String>,
    auto_generate_playlists: i64,
    instrumental_only: i64,
    playlist_length: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let preferences = UserPreferences {
            default_music_service: row
                .default_music_service
                .as_deref()
                .and_then(MusicService::from_str),
            auto_generate_playlists: row.auto_generate_playlists != 0,
            instrumental_only: row.instrumental_only != 0,
            playlist_length: PlaylistLength::from_str(&row.playlist_length)
                .unwrap_or(PlaylistLength::Medium),
        };

        Ok(UserRecord {
            id: parse_uuid(&row.id)?,
            email: row.email,
            display_name: row.display_name,
            preferences,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}

#[derive(FromRow)]
struct ServiceConnectionRow {
    id: String,
    user_id: String,
    service: String,
    connected_at: String,
    access_token: String,
    refresh_token: Option<String>,
    expires_at: Option<String>,
    external_user_id: String,
    detail_value: String,
}

impl TryFrom<ServiceConnectionRow> for ServiceConnectionRecord {
    type Error = RepositoryError;

    fn try_from(row: ServiceConnectionRow) -> Result<Self, Self::Error> {
        Ok(ServiceConnectionRecord {
            id: parse_uuid(&row.id)?,
            user_id: parse_uuid(&row.user_id)?,
            service: row.service,
            connected_at: parse_datetime(&row.connected_at)?,
            access_token: row.access_token,
            refresh_token: row.refresh_token,
            expires_at: row.expires_at.as_deref().map(parse_datetime).transpose()?,
            external_user_id: row.external_user_id,
            detail_value: row.detail_value,
        })
    }
}

pub(super) fn parse_uuid(s: &str) -> Result<Uuid, RepositoryError> {
    Uuid::parse_str(s).map_err(|e| RepositoryError::SerializationError(e.to_string()))
}

pub(super) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::SerializationError(e.to_string()))
}

#[async_trait]
impl UserRepositoryPort for SqliteUserRepository {
    async fn save(&self, user: &UserRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, email, display_name, default_music_service,
                auto_generate_playlists, instrumental_only, playlist_length,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                email = excluded.email,
                display_name = excluded.display_name,
                default_music_service = excluded.default_music_service,
                auto_generate_playlists = excluded.auto_generate_playlists,
                instrumental_only = excluded.instrumental_only,
                playlist_length = excluded.playlist_length,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user.id.to_string())
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(
            user.preferences
                .default_music_service
                .map(|s| s.as_str().to_string()),
        )
        .bind(user.preferences.auto_generate_playlists as i64)
        .bind(user.preferences.instrumental_only as i64)
        .bind(user.preferences.playlist_length.as_str())
        .bind(user.created_at.to_rfc3339())
        .bind(user.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, email, display_name, default_music_service, auto_generate_playlists, instrumental_only, playlist_length, created_at, updated_at FROM users WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        row.map(UserRecord::try_from).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, email, display_name, default_music_service, auto_generate_playlists, instrumental_only, playlist_length, created_at, updated_at FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        row.map(UserRecord::try_from).transpose()
    }

    async fn update_preferences(
        &self,
        id: Uuid,
        preferences: &UserPreferences,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            UPDATE users
            SET default_music_service = ?, auto_generate_playlists = ?,
                instrumental_only = ?, playlist_length = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(
            preferences
                .default_music_service
                .map(|s| s.as_str().to_string()),
        )
        .bind(preferences.auto_generate_playlists as i64)
        .bind(preferences.instrumental_only as i64)
        .bind(preferences.playlist_length.as_str())
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn save_connection(
        &self,
        connection: &ServiceConnectionRecord,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO service_connections (
                id, user_id, service, connected_at, access_token,
                refresh_token, expires_at, external_user_id, detail_value
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id, service) DO UPDATE SET
                connected_at = excluded.connected_at,
                access_token = excluded.access_token,
                refresh_token = excluded.refresh_token,
                expires_at = excluded.expires_at,
                external_user_id = excluded.external_user_id,
                detail_value = excluded.detail_value
            "#,
        )
        .bind(connection.id.to_string())
        .bind(connection.user_id.to_string())
        .bind(&connection.service)
        .bind(connection.connected_at.to_rfc3339())
        .bind(&connection.access_token)
        .bind(&connection.refresh_token)
        .bind(connection.expires_at.map(|dt| dt.to_rfc3339()))
        .bind(&connection.external_user_id)
        .bind(&connection.detail_value)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn delete_connection(
        &self,
        user_id: Uuid,
        service: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM service_connections WHERE user_id = ? AND service = ?",
        )
        .bind(user_id.to_string())
        .bind(service)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_connection(
        &self,
        user_id: Uuid,
        service: &str,
    ) -> Result<Option<ServiceConnectionRecord>, RepositoryError> {
        let row: Option<ServiceConnectionRow> = sqlx::query_as(
            "SELECT id, user_id, service, connected_at, access_token, refresh_token, expires_at, external_user_id, detail_value FROM service_connections WHERE user_id = ? AND service = ?",
        )
        .bind(user_id.to_string())
        .bind(service)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        row.map(ServiceConnectionRecord::try_from).transpose()
    }

    async fn find_connections(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<ServiceConnectionRecord>, RepositoryError> {
        let rows: Vec<ServiceConnectionRow> = sqlx::query_as(
            "SELECT id, user_id, service, connected_at, access_token, refresh_token, expires_at, external_user_id, detail_value FROM service_connections WHERE user_id = ? ORDER BY connected_at",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        rows.into_iter()
            .map(ServiceConnectionRecord::try_from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::{create_pool, run_migrations, DatabaseConfig};
    use super::*;

    async fn test_repo() -> SqliteUserRepository {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteUserRepository::new(pool)
    }

    fn sample_user() -> UserRecord {
        let now = Utc::now();
        UserRecord {
            id: Uuid::new_v4(),
            email: "reader@example.com".to_string(),
            display_name: "Reader".to_string(),
            preferences: UserPreferences::default(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_save_and_find() {
        let repo = test_repo().await;
        let user = sample_user();

        repo.save(&user).await.unwrap();

        let found = repo.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(found.email, "reader@example.com");

        let by_email = repo.find_by_email("reader@example.com").await.unwrap();
        assert!(by_email.is_some());
    }

    #[tokio::test]
    async fn test_update_preferences() {
        let repo = test_repo().await;
        let user = sample_user();
        repo.save(&user).await.unwrap();

        let preferences = UserPreferences {
            default_music_service: Some(MusicService::Spotify),
            auto_generate_playlists: true,
            instrumental_only: true,
            playlist_length: PlaylistLength::Long,
        };
        repo.update_preferences(user.id, &preferences).await.unwrap();

        let found = repo.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(
            found.preferences.default_music_service,
            Some(MusicService::Spotify)
        );
        assert!(found.preferences.auto_generate_playlists);
        assert_eq!(found.preferences.playlist_length, PlaylistLength::Long);
    }

    #[tokio::test]
    async fn test_connection_upsert_per_service() {
        let repo = test_repo().await;
        let user = sample_user();
        repo.save(&user).await.unwrap();

        let mut connection = ServiceConnectionRecord {
            id: Uuid::new_v4(),
            user_id: user.id,
            service: "spotify".to_string(),
            connected_at: Utc::now(),
            access_token: "at-1".to_string(),
            refresh_token: None,
            expires_at: None,
            external_user_id: "sp-user".to_string(),
            detail_value: "listener".to_string(),
        };
        repo.save_connection(&connection).await.unwrap();

        // 同服务重连覆盖旧凭据
        connection.id = Uuid::new_v4();
        connection.access_token = "at-2".to_string();
        repo.save_connection(&connection).await.unwrap();

        let connections = repo.find_connections(user.id).await.unwrap();
        assert_eq!(connections.len(), 1);
        assert_eq!(connections[0].access_token, "at-2");
    }

    #[tokio::test]
    async fn test_delete_connection() {
        let repo = test_repo().await;
        let user = sample_user();
        repo.save(&user).await.unwrap();

        assert!(!repo.delete_connection(user.id, "spotify").await.unwrap());

        let connection = ServiceConnectionRecord {
            id: Uuid::new_v4(),
            user_id: user.id,
            service: "spotify".to_string(),
            connected_at: Utc::now(),
            access_token: "at".to_string(),
            refresh_token: None,
            expires_at: None,
            external_user_id: "sp-user".to_string(),
            detail_value: "listener".to_string(),
        };
        repo.save_connection(&connection).await.unwrap();

        assert!(repo.delete_connection(user.id, "spotify").await.unwrap());
        assert!(repo
            .find_connection(user.id, "spotify")
            .await
            .unwrap()
            .is_none());
    }
}
