//! Analysis Command Handlers

use std::sync::Arc;
use uuid::Uuid;

use crate::application::commands::RequestAnalysis;
use crate::application::error::ApplicationError;
use crate::application::ports::{
    AnalysisProviderPort, AnalysisProviderRequest, AnalysisRecord, AnalysisRepositoryPort,
    BookRecord, BookRepositoryPort, LibraryRepositoryPort, ProviderAnalysis,
};
use crate::domain::analysis::{
    AnalysisSource, BookAnalysis, IntensityLevel, Mood, Pace, Setting, TimeOfDay,
};
use crate::domain::{build_analysis_prompt, PromptConfig};
use crate::infrastructure::events::EventPublisher;

/// 确保书架条目有分析结果
///
/// 幂等规则：同 (user_book, model) 已有分析且未 force 时直接复用。
/// 返回 (分析记录, 是否新生成)。
pub async fn ensure_analysis(
    analysis_repo: &Arc<dyn AnalysisRepositoryPort>,
    provider: &Arc<dyn AnalysisProviderPort>,
    user_book_id: Uuid,
    book: &BookRecord,
    full_text: Option<&str>,
    force: bool,
) -> Result<(AnalysisRecord, bool), ApplicationError> {
    let existing = analysis_repo.find_by_user_book(user_book_id).await?;

    if let Some(analysis) = &existing {
        if !force && analysis.model_used == provider.model() {
            tracing::debug!(
                user_book_id = %user_book_id,
                model = %analysis.model_used,
                "Analysis reused (idempotent)"
            );
            return Ok((analysis.clone(), false));
        }
    }

    let source = if full_text.is_some() {
        AnalysisSource::FullContent
    } else {
        AnalysisSource::MetadataOnly
    };

    let prompt = build_analysis_prompt(
        &book.title,
        &book.authors,
        &book.genres,
        book.description.as_deref(),
        full_text,
        &PromptConfig::default(),
    );

    let provider_analysis = provider
        .analyze(AnalysisProviderRequest { prompt, source })
        .await?;

    // 领域对象校验边界值并按来源压置信度
    let analysis = validate_provider_analysis(user_book_id, source, provider_analysis)?;

    // 覆盖写保证 user_book 与分析一一对应；保留旧 ID
    let record = AnalysisRecord {
        id: existing
            .map(|a| a.id)
            .unwrap_or_else(|| *analysis.id().as_uuid()),
        user_book_id,
        analyzed_at: analysis.analyzed_at(),
        mood: analysis.mood().to_vec(),
        themes: analysis.themes().to_vec(),
        setting: analysis.setting().clone(),
        pace: analysis.pace(),
        intensity: analysis.intensity(),
        time_of_day: analysis.time_of_day().to_vec(),
        vibe: analysis.vibe().to_string(),
        music_description: analysis.music_description().to_string(),
        analysis_source: analysis.analysis_source(),
        confidence: analysis.confidence(),
        model_used: analysis.model_used().to_string(),
    };
    analysis_repo.save(&record).await?;

    tracing::info!(
        user_book_id = %user_book_id,
        source = %source.as_str(),
        confidence = record.confidence,
        model = %record.model_used,
        "Analysis completed"
    );

    Ok((record, true))
}

/// 将模型原始输出转换为校验过的领域对象
fn validate_provider_analysis(
    user_book_id: Uuid,
    source: AnalysisSource,
    raw: ProviderAnalysis,
) -> Result<BookAnalysis, ApplicationError> {
    let mood = raw
        .mood
        .into_iter()
        .map(|m| Mood::new(m.name, m.intensity))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| invalid_provider_output(e.to_string()))?;

    let pace = Pace::from_str(&raw.pace)
        .ok_or_else(|| invalid_provider_output(format!("unknown pace: {}", raw.pace)))?;
    let intensity = IntensityLevel::from_str(&raw.intensity)
        .ok_or_else(|| invalid_provider_output(format!("unknown intensity: {}", raw.intensity)))?;

    // time_of_day 未知值宽松丢弃
    let time_of_day: Vec<TimeOfDay> = raw
        .time_of_day
        .iter()
        .filter_map(|s| TimeOfDay::from_str(s))
        .collect();

    let setting = Setting {
        era: raw.era,
        location: raw.location,
        atmosphere: raw.atmosphere,
    };

    BookAnalysis::new(
        user_book_id,
        mood,
        raw.themes,
        setting,
        pace,
        intensity,
        time_of_day,
        raw.vibe,
        raw.music_description,
        source,
        raw.confidence,
        raw.model,
    )
    .map_err(|e| invalid_provider_output(e.to_string()))
}

fn invalid_provider_output(message: String) -> ApplicationError {
    ApplicationError::ExternalServiceError(format!("Invalid analysis output: {}", message))
}

// ============================================================================
// RequestAnalysis
// ============================================================================

/// RequestAnalysis Handler - 同步分析入口
pub struct RequestAnalysisHandler {
    library_repo: Arc<dyn LibraryRepositoryPort>,
    book_repo: Arc<dyn BookRepositoryPort>,
    analysis_repo: Arc<dyn AnalysisRepositoryPort>,
    provider: Arc<dyn AnalysisProviderPort>,
    event_publisher: Arc<EventPublisher>,
}

impl RequestAnalysisHandler {
    pub fn new(
        library_repo: Arc<dyn LibraryRepositoryPort>,
        book_repo: Arc<dyn BookRepositoryPort>,
        analysis_repo: Arc<dyn AnalysisRepositoryPort>,
        provider: Arc<dyn AnalysisProviderPort>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            library_repo,
            book_repo,
            analysis_repo,
            provider,
            event_publisher,
        }
    }

    pub async fn handle(
        &self,
        command: RequestAnalysis,
    ) -> Result<AnalysisRecord, ApplicationError> {
        let user_book = self
            .library_repo
            .find_by_id(command.user_book_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("UserBook", command.user_book_id))?;

        let book = self
            .book_repo
            .find_by_id(user_book.book_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Book", user_book.book_id))?;

        let result = ensure_analysis(
            &self.analysis_repo,
            &self.provider,
            user_book.id,
            &book,
            command.full_text.as_deref(),
            command.force,
        )
        .await;

        match result {
            Ok((record, newly_generated)) => {
                if newly_generated {
                    self.event_publisher.publish_analysis_ready(
                        &user_book.user_id,
                        user_book.id,
                        record.id,
                        record.confidence,
                    );
                }
                Ok(record)
            }
            Err(e) => {
                self.event_publisher.publish_analysis_failed(
                    &user_book.user_id,
                    user_book.id,
                    &e.to_string(),
                );
                Err(e)
            }
        }
    }
}
