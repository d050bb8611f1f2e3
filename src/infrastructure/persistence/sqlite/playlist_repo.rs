//! SQLite Playlist Repository

use async_trait::async_trait;
use chrono::Utc;
use sqlx::FromRow;
use uuid::Uuid;

use super::user_repo::{parse_datetime, parse_uuid};
use super::DbPool;
use crate::application::ports::{
    PlaylistRecord, PlaylistRepositoryPort, RepositoryError, TrackRecord,
};

/// SQLite Playlist Repository
pub struct SqlitePlaylistRepository {
    pool: DbPool,
}

impl SqlitePlaylistRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct PlaylistRow {
    id: String,
    user_book_id: String,
    name: String,
    description: Option<String>,
    total_duration: i64,
    generated_at: String,
    generation_prompt: String,
    spotify_playlist_id: Option<String>,
    apple_music_playlist_id: Option<String>,
    youtube_music_playlist_id: Option<String>,
    is_active: i64,
    created_at: String,
    updated_at: String,
}

impl TryFrom<PlaylistRow> for PlaylistRecord {
    type Error = RepositoryError;

    fn try_from(row: PlaylistRow) -> Result<Self, Self::Error> {
        Ok(PlaylistRecord {
            id: parse_uuid(&row.id)?,
            user_book_id: parse_uuid(&row.user_book_id)?,
            name: row.name,
            description: row.description,
            total_duration: row.total_duration as u32,
            generated_at: parse_datetime(&row.generated_at)?,
            generation_prompt: row.generation_prompt,
            spotify_playlist_id: row.spotify_playlist_id,
            apple_music_playlist_id: row.apple_music_playlist_id,
            youtube_music_playlist_id: row.youtube_music_playlist_id,
            is_active: row.is_active != 0,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}

#[derive(FromRow)]
struct TrackRow {
    id: String,
    playlist_id: String,
    position: i64,
    title: String,
    artist: String,
    album: Option<String>,
    duration_secs: i64,
    spotify_id: Option<String>,
    apple_music_id: Option<String>,
    youtube_music_id: Option<String>,
    is_instrumental: Option<i64>,
    mood_tags: String,
    ai_rationale: Option<String>,
}

impl TryFrom<TrackRow> for TrackRecord {
    type Error = RepositoryError;

    fn try_from(row: TrackRow) -> Result<Self, Self::Error> {
        Ok(TrackRecord {
            id: parse_uuid(&row.id)?,
            playlist_id: parse_uuid(&row.playlist_id)?,
            position: row.position as u32,
            title: row.title,
            artist: row.artist,
            album: row.album,
            duration_secs: row.duration_secs as u32,
            spotify_id: row.spotify_id,
            apple_music_id: row.apple_music_id,
            youtube_music_id: row.youtube_music_id,
            is_instrumental: row.is_instrumental.map(|v| v != 0),
            mood_tags: serde_json::from_str(&row.mood_tags)
                .map_err(|e| RepositoryError::SerializationError(e.to_string()))?,
            ai_rationale: row.ai_rationale,
        })
    }
}

const PLAYLIST_COLUMNS: &str = "id, user_book_id, name, description, total_duration, generated_at, generation_prompt, spotify_playlist_id, apple_music_playlist_id, youtube_music_playlist_id, is_active, created_at, updated_at";
const TRACK_COLUMNS: &str = "id, playlist_id, position, title, artist, album, duration_secs, spotify_id, apple_music_id, youtube_music_id, is_instrumental, mood_tags, ai_rationale";

/// service 字符串对应的歌单外部 ID 列
fn playlist_id_column(service: &str) -> Result<&'static str, RepositoryError> {
    match service {
        "spotify" => Ok("spotify_playlist_id"),
        "apple-music" => Ok("apple_music_playlist_id"),
        "youtube-music" => Ok("youtube_music_playlist_id"),
        other => Err(RepositoryError::SerializationError(format!(
            "unknown music service: {}",
            other
        ))),
    }
}

/// service 字符串对应的曲目外部 ID 列
fn track_id_column(service: &str) -> Result<&'static str, RepositoryError> {
    match service {
        "spotify" => Ok("spotify_id"),
        "apple-music" => Ok("apple_music_id"),
        "youtube-music" => Ok("youtube_music_id"),
        other => Err(RepositoryError::SerializationError(format!(
            "unknown music service: {}",
            other
        ))),
    }
}

#[async_trait]
impl PlaylistRepositoryPort for SqlitePlaylistRepository {
    async fn save(
        &self,
        playlist: &PlaylistRecord,
        tracks: &[TrackRecord],
    ) -> Result<(), RepositoryError> {
        // total_duration 恒由曲目派生，同事务重算
        let total_duration: i64 = tracks.iter().map(|t| t.duration_secs as i64).sum();

        let mut tx = self.pool.begin().await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO playlists (
                id, user_book_id, name, description, total_duration,
                generated_at, generation_prompt,
                spotify_playlist_id, apple_music_playlist_id, youtube_music_playlist_id,
                is_active, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                total_duration = excluded.total_duration,
                generation_prompt = excluded.generation_prompt,
                spotify_playlist_id = excluded.spotify_playlist_id,
                apple_music_playlist_id = excluded.apple_music_playlist_id,
                youtube_music_playlist_id = excluded.youtube_music_playlist_id,
                is_active = excluded.is_active,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(playlist.id.to_string())
        .bind(playlist.user_book_id.to_string())
        .bind(&playlist.name)
        .bind(&playlist.description)
        .bind(total_duration)
        .bind(playlist.generated_at.to_rfc3339())
        .bind(&playlist.generation_prompt)
        .bind(&playlist.spotify_playlist_id)
        .bind(&playlist.apple_music_playlist_id)
        .bind(&playlist.youtube_music_playlist_id)
        .bind(playlist.is_active as i64)
        .bind(playlist.created_at.to_rfc3339())
        .bind(playlist.updated_at.to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        // 整体重写曲目列表
        sqlx::query("DELETE FROM tracks WHERE playlist_id = ?")
            .bind(playlist.id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        for track in tracks {
            let mood_tags = serde_json::to_string(&track.mood_tags)
                .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;

            sqlx::query(
                r#"
                INSERT INTO tracks (
                    id, playlist_id, position, title, artist, album, duration_secs,
                    spotify_id, apple_music_id, youtube_music_id,
                    is_instrumental, mood_tags, ai_rationale
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(track.id.to_string())
            .bind(playlist.id.to_string())
            .bind(track.position as i64)
            .bind(&track.title)
            .bind(&track.artist)
            .bind(&track.album)
            .bind(track.duration_secs as i64)
            .bind(&track.spotify_id)
            .bind(&track.apple_music_id)
            .bind(&track.youtube_music_id)
            .bind(track.is_instrumental.map(|v| v as i64))
            .bind(mood_tags)
            .bind(&track.ai_rationale)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;
        }

        tx.commit().await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PlaylistRecord>, RepositoryError> {
        let row: Option<PlaylistRow> = sqlx::query_as(&format!(
            "SELECT {} FROM playlists WHERE id = ?",
            PLAYLIST_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        row.map(PlaylistRecord::try_from).transpose()
    }

    async fn find_by_user_book(
        &self,
        user_book_id: Uuid,
    ) -> Result<Vec<PlaylistRecord>, RepositoryError> {
        let rows: Vec<PlaylistRow> = sqlx::query_as(&format!(
            "SELECT {} FROM playlists WHERE user_book_id = ? ORDER BY created_at DESC",
            PLAYLIST_COLUMNS
        ))
        .bind(user_book_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        rows.into_iter().map(PlaylistRecord::try_from).collect()
    }

    async fn find_tracks(&self, playlist_id: Uuid) -> Result<Vec<TrackRecord>, RepositoryError> {
        let rows: Vec<TrackRow> = sqlx::query_as(&format!(
            "SELECT {} FROM tracks WHERE playlist_id = ? ORDER BY position",
            TRACK_COLUMNS
        ))
        .bind(playlist_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        rows.into_iter().map(TrackRecord::try_from).collect()
    }

    async fn count_by_user_book(&self, user_book_id: Uuid) -> Result<usize, RepositoryError> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM playlists WHERE user_book_id = ?")
                .bind(user_book_id.to_string())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(count.0 as usize)
    }

    async fn activate(
        &self,
        user_book_id: Uuid,
        playlist_id: Uuid,
    ) -> Result<(), RepositoryError> {
        // 单事务保证同 user_book 至多一个 active
        let mut tx = self.pool.begin().await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "UPDATE playlists SET is_active = 0, updated_at = ? WHERE user_book_id = ? AND is_active = 1",
        )
        .bind(&now)
        .bind(user_book_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        let result = sqlx::query(
            "UPDATE playlists SET is_active = 1, updated_at = ? WHERE id = ? AND user_book_id = ?",
        )
        .bind(&now)
        .bind(playlist_id.to_string())
        .bind(user_book_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!(
                "playlist {} under user_book {}",
                playlist_id, user_book_id
            )));
        }

        tx.commit().await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn set_external_ids(
        &self,
        playlist_id: Uuid,
        service: &str,
        external_playlist_id: &str,
        track_external_ids: &[(Uuid, String)],
    ) -> Result<(), RepositoryError> {
        let playlist_column = playlist_id_column(service)?;
        let track_column = track_id_column(service)?;

        let mut tx = self.pool.begin().await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        // 列名来自白名单映射，可安全拼接
        let query = format!(
            "UPDATE playlists SET {} = ?, updated_at = ? WHERE id = ?",
            playlist_column
        );
        sqlx::query(&query)
            .bind(external_playlist_id)
            .bind(Utc::now().to_rfc3339())
            .bind(playlist_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        let track_query = format!("UPDATE tracks SET {} = ? WHERE id = ?", track_column);
        for (track_id, external_id) in track_external_ids {
            sqlx::query(&track_query)
                .bind(external_id)
                .bind(track_id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;
        }

        tx.commit().await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        sqlx::query("DELETE FROM tracks WHERE playlist_id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        sqlx::query("DELETE FROM playlists WHERE id = ?")
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

    async fn test_repo() -> SqlitePlaylistRepository {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        // 仓储隔离测试直接插入子表行而不预置父表（user_books 等），
        // 关闭外键强制（sqlx 默认开启）以匹配这些用例的设计意图。
        sqlx::query("PRAGMA foreign_keys = OFF").execute(&pool).await.unwrap();
        SqlitePlaylistRepository::new(pool)
    }

    fn sample_playlist(user_book_id: Uuid) -> PlaylistRecord {
        let now = Utc::now();
        PlaylistRecord {
            id: Uuid::new_v4(),
            user_book_id,
            name: "Quiet evening".to_string(),
            description: None,
            total_duration: 0,
            generated_at: now,
            generation_prompt: "prompt".to_string(),
            spotify_playlist_id: None,
            apple_music_playlist_id: None,
            youtube_music_playlist_id: None,
            is_active: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn sample_track(playlist_id: Uuid, position: u32, duration_secs: u32) -> TrackRecord {
        TrackRecord {
            id: Uuid::new_v4(),
            playlist_id,
            position,
            title: format!("Track {}", position),
            artist: "Artist".to_string(),
            album: None,
            duration_secs,
            spotify_id: None,
            apple_music_id: None,
            youtube_music_id: None,
            is_instrumental: Some(true),
            mood_tags: vec!["calm".to_string()],
            ai_rationale: None,
        }
    }

    #[tokio::test]
    async fn test_save_recomputes_total_duration() {
        let repo = test_repo().await;
        let playlist = sample_playlist(Uuid::new_v4());
        let tracks = vec![
            sample_track(playlist.id, 0, 200),
            sample_track(playlist.id, 1, 300),
        ];

        // 传入的 total_duration=0 应被曲目之和覆盖
        repo.save(&playlist, &tracks).await.unwrap();

        let found = repo.find_by_id(playlist.id).await.unwrap().unwrap();
        assert_eq!(found.total_duration, 500);

        let found_tracks = repo.find_tracks(playlist.id).await.unwrap();
        assert_eq!(found_tracks.len(), 2);
        assert_eq!(found_tracks[0].position, 0);
        assert_eq!(found_tracks[0].mood_tags, vec!["calm".to_string()]);
    }

    #[tokio::test]
    async fn test_activate_is_exclusive() {
        let repo = test_repo().await;
        let user_book_id = Uuid::new_v4();

        let first = sample_playlist(user_book_id);
        let second = sample_playlist(user_book_id);
        repo.save(&first, &[sample_track(first.id, 0, 100)]).await.unwrap();
        repo.save(&second, &[sample_track(second.id, 0, 100)]).await.unwrap();

        repo.activate(user_book_id, first.id).await.unwrap();
        repo.activate(user_book_id, second.id).await.unwrap();

        let playlists = repo.find_by_user_book(user_book_id).await.unwrap();
        let active: Vec<_> = playlists.iter().filter(|p| p.is_active).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, second.id);
    }

    #[tokio::test]
    async fn test_activate_unknown_playlist_fails() {
        let repo = test_repo().await;
        let result = repo.activate(Uuid::new_v4(), Uuid::new_v4()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_set_external_ids() {
        let repo = test_repo().await;
        let playlist = sample_playlist(Uuid::new_v4());
        let track = sample_track(playlist.id, 0, 100);
        let track_id = track.id;
        repo.save(&playlist, &[track]).await.unwrap();

        repo.set_external_ids(
            playlist.id,
            "spotify",
            "sp-list-1",
            &[(track_id, "sp-track-1".to_string())],
        )
        .await
        .unwrap();

        let found = repo.find_by_id(playlist.id).await.unwrap().unwrap();
        assert_eq!(found.spotify_playlist_id, Some("sp-list-1".to_string()));
        assert!(found.apple_music_playlist_id.is_none());

        let tracks = repo.find_tracks(playlist.id).await.unwrap();
        assert_eq!(tracks[0].spotify_id, Some("sp-track-1".to_string()));
    }

    #[tokio::test]
    async fn test_set_external_ids_unknown_service() {
        let repo = test_repo().await;
        let result = repo
            .set_external_ids(Uuid::new_v4(), "myspace", "x", &[])
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_delete_removes_tracks() {
        let repo = test_repo().await;
        let playlist = sample_playlist(Uuid::new_v4());
        repo.save(&playlist, &[sample_track(playlist.id, 0, 100)]).await.unwrap();

        repo.delete(playlist.id).await.unwrap();
        assert!(repo.find_by_id(playlist.id).await.unwrap().is_none());
        assert!(repo.find_tracks(playlist.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_count_by_user_book() {
        let repo = test_repo().await;
        let user_book_id = Uuid::new_v4();
        assert_eq!(repo.count_by_user_book(user_book_id).await.unwrap(), 0);

        let playlist = sample_playlist(user_book_id);
        repo.save(&playlist, &[sample_track(playlist.id, 0, 100)]).await.unwrap();
        assert_eq!(repo.count_by_user_book(user_book_id).await.unwrap(), 1);
    }
}
