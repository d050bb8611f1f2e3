//! SQLite Analysis Repository

use async_trait::async_trait;
use sqlx::FromRow;
use uuid::Uuid;

use super::user_repo::{parse_datetime, parse_uuid};
use super::DbPool;
use crate::application::ports::{AnalysisRecord, AnalysisRepositoryPort, RepositoryError};
use crate::domain::analysis::{AnalysisSource, IntensityLevel, Pace, Setting, TimeOfDay};

/// SQLite Analysis Repository
pub struct SqliteAnalysisRepository {
    pool: DbPool,
}

impl SqliteAnalysisRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct AnalysisRow {
    id: String,
    user_book_id: String,
    analyzed_at: String,
    mood: String,
    themes: String,
    era: Option<String>,
    location: Option<String>,
    atmosphere: Option<String>,
    pace: String,
    intensity: String,
    time_of_day: String,
    vibe: String,
    music_description: String,
    analysis_source: String,
    confidence: f64,
    model_used: String,
}

impl TryFrom<AnalysisRow> for AnalysisRecord {
    type Error = RepositoryError;

    fn try_from(row: AnalysisRow) -> Result<Self, Self::Error> {
        let time_of_day_raw: Vec<String> = serde_json::from_str(&row.time_of_day)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;

        Ok(AnalysisRecord {
            id: parse_uuid(&row.id)?,
            user_book_id: parse_uuid(&row.user_book_id)?,
            analyzed_at: parse_datetime(&row.analyzed_at)?,
            mood: serde_json::from_str(&row.mood)
                .map_err(|e| RepositoryError::SerializationError(e.to_string()))?,
            themes: serde_json::from_str(&row.themes)
                .map_err(|e| RepositoryError::SerializationError(e.to_string()))?,
            setting: Setting {
                era: row.era,
                location: row.location,
                atmosphere: row.atmosphere,
            },
            pace: Pace::from_str(&row.pace).ok_or_else(|| {
                RepositoryError::SerializationError(format!("unknown pace: {}", row.pace))
            })?,
            intensity: IntensityLevel::from_str(&row.intensity).ok_or_else(|| {
                RepositoryError::SerializationError(format!("unknown intensity: {}", row.intensity))
            })?,
            time_of_day: time_of_day_raw
                .iter()
                .filter_map(|s| TimeOfDay::from_str(s))
                .collect(),
            vibe: row.vibe,
            music_description: row.music_description,
            analysis_source: AnalysisSource::from_str(&row.analysis_source).ok_or_else(|| {
                RepositoryError::SerializationError(format!(
                    "unknown analysis source: {}",
                    row.analysis_source
                ))
            })?,
            confidence: row.confidence,
            model_used: row.model_used,
        })
    }
}

const ANALYSIS_COLUMNS: &str = "id, user_book_id, analyzed_at, mood, themes, era, location, atmosphere, pace, intensity, time_of_day, vibe, music_description, analysis_source, confidence, model_used";

#[async_trait]
impl AnalysisRepositoryPort for SqliteAnalysisRepository {
    async fn save(&self, analysis: &AnalysisRecord) -> Result<(), RepositoryError> {
        let mood = serde_json::to_string(&analysis.mood)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;
        let themes = serde_json::to_string(&analysis.themes)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;
        let time_of_day: Vec<&str> = analysis.time_of_day.iter().map(|t| t.as_str()).collect();
        let time_of_day = serde_json::to_string(&time_of_day)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;

        // ON CONFLICT(user_book_id) 保证一一对应
        sqlx::query(
            r#"
            INSERT INTO book_analyses (
                id, user_book_id, analyzed_at, mood, themes, era, location, atmosphere,
                pace, intensity, time_of_day, vibe, music_description,
                analysis_source, confidence, model_used
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_book_id) DO UPDATE SET
                analyzed_at = excluded.analyzed_at,
                mood = excluded.mood,
                themes = excluded.themes,
                era = excluded.era,
                location = excluded.location,
                atmosphere = excluded.atmosphere,
                pace = excluded.pace,
                intensity = excluded.intensity,
                time_of_day = excluded.time_of_day,
                vibe = excluded.vibe,
                music_description = excluded.music_description,
                analysis_source = excluded.analysis_source,
                confidence = excluded.confidence,
                model_used = excluded.model_used
            "#,
        )
        .bind(analysis.id.to_string())
        .bind(analysis.user_book_id.to_string())
        .bind(analysis.analyzed_at.to_rfc3339())
        .bind(mood)
        .bind(themes)
        .bind(&analysis.setting.era)
        .bind(&analysis.setting.location)
        .bind(&analysis.setting.atmosphere)
        .bind(analysis.pace.as_str())
        .bind(analysis.intensity.as_str())
        .bind(time_of_day)
        .bind(&analysis.vibe)
        .bind(&analysis.music_description)
        .bind(analysis.analysis_source.as_str())
        .bind(analysis.confidence)
        .bind(&analysis.model_used)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn find_by_user_book(
        &self,
        user_book_id: Uuid,
    ) -> Result<Option<AnalysisRecord>, RepositoryError> {
        let row: Option<AnalysisRow> = sqlx::query_as(&format!(
            "SELECT {} FROM book_analyses WHERE user_book_id = ?",
            ANALYSIS_COLUMNS
        ))
        .bind(user_book_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        row.map(AnalysisRecord::try_from).transpose()
    }

    async fn delete_by_user_book(&self, user_book_id: Uuid) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM book_analyses WHERE user_book_id = ?")
            .bind(user_book_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::{create_pool, run_migrations, DatabaseConfig};
    use super::*;
    use crate::domain::analysis::Mood;
    use chrono::Utc;

    async fn test_repo() -> SqliteAnalysisRepository {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        // 仓储隔离测试直接插入子表行而不预置父表（user_books 等），
        // 关闭外键强制（sqlx 默认开启）以匹配这些用例的设计意图。
        sqlx::query("PRAGMA foreign_keys = OFF").execute(&pool).await.unwrap();
        SqliteAnalysisRepository::new(pool)
    }

    fn sample_analysis(user_book_id: Uuid) -> AnalysisRecord {
        AnalysisRecord {
            id: Uuid::new_v4(),
            user_book_id,
            analyzed_at: Utc::now(),
            mood: vec![Mood::new("melancholic", 0.8).unwrap()],
            themes: vec!["loss".to_string(), "memory".to_string()],
            setting: Setting {
                era: Some("contemporary".to_string()),
                location: Some("urban".to_string()),
                atmosphere: None,
            },
            pace: Pace::Slow,
            intensity: IntensityLevel::Moderate,
            time_of_day: vec![TimeOfDay::Evening, TimeOfDay::Night],
            vibe: "寂静而怅然".to_string(),
            music_description: "slow ambient piano".to_string(),
            analysis_source: AnalysisSource::MetadataOnly,
            confidence: 0.65,
            model_used: "claude-3-opus".to_string(),
        }
    }

    #[tokio::test]
    async fn test_save_and_find_roundtrip() {
        let repo = test_repo().await;
        let user_book_id = Uuid::new_v4();
        let analysis = sample_analysis(user_book_id);

        repo.save(&analysis).await.unwrap();

        let found = repo.find_by_user_book(user_book_id).await.unwrap().unwrap();
        assert_eq!(found.mood.len(), 1);
        assert_eq!(found.mood[0].name, "melancholic");
        assert_eq!(found.pace, Pace::Slow);
        assert_eq!(found.time_of_day, vec![TimeOfDay::Evening, TimeOfDay::Night]);
        assert_eq!(found.analysis_source, AnalysisSource::MetadataOnly);
    }

    #[tokio::test]
    async fn test_one_analysis_per_user_book() {
        let repo = test_repo().await;
        let user_book_id = Uuid::new_v4();

        repo.save(&sample_analysis(user_book_id)).await.unwrap();

        // 同 user_book 再存覆盖而不是新增
        let mut second = sample_analysis(user_book_id);
        second.model_used = "claude-3-sonnet".to_string();
        repo.save(&second).await.unwrap();

        let found = repo.find_by_user_book(user_book_id).await.unwrap().unwrap();
        assert_eq!(found.model_used, "claude-3-sonnet");
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = test_repo().await;
        let user_book_id = Uuid::new_v4();
        repo.save(&sample_analysis(user_book_id)).await.unwrap();

        repo.delete_by_user_book(user_book_id).await.unwrap();
        assert!(repo.find_by_user_book(user_book_id).await.unwrap().is_none());
    }
}
