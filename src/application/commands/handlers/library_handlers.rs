//! Library Command Handlers

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::commands::{
    AddBookToLibrary, RemoveBookFromLibrary, UpdateReadingStatus,
};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    BookRecord, BookRepositoryPort, GenerationJob, JobManagerPort, LibraryRepositoryPort,
    UserBookRecord, UserRepositoryPort,
};
use crate::domain::book::{Book, BookTitle};
use crate::domain::library::{ReadingStatus, UserBook, UserBookId};

// ============================================================================
// AddBookToLibrary
// ============================================================================

/// 加书入架响应
#[derive(Debug, Clone)]
pub struct AddBookToLibraryResponse {
    pub user_book_id: Uuid,
    pub book_id: Uuid,
    /// 书籍是否命中已有记录（(source, external_id) 去重）
    pub book_deduplicated: bool,
}

/// AddBookToLibrary Handler - 书籍归一化入库 + 建立书架条目
pub struct AddBookToLibraryHandler {
    user_repo: Arc<dyn UserRepositoryPort>,
    book_repo: Arc<dyn BookRepositoryPort>,
    library_repo: Arc<dyn LibraryRepositoryPort>,
}

impl AddBookToLibraryHandler {
    pub fn new(
        user_repo: Arc<dyn UserRepositoryPort>,
        book_repo: Arc<dyn BookRepositoryPort>,
        library_repo: Arc<dyn LibraryRepositoryPort>,
    ) -> Self {
        Self {
            user_repo,
            book_repo,
            library_repo,
        }
    }

    pub async fn handle(
        &self,
        command: AddBookToLibrary,
    ) -> Result<AddBookToLibraryResponse, ApplicationError> {
        let user = self
            .user_repo
            .find_by_id(command.user_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("User", command.user_id))?;

        let title = BookTitle::new(command.title)
            .map_err(|e| ApplicationError::validation(e.to_string()))?;

        // 去重：携带外部 ID 的来源按 (source, external_id) 命中已有书籍
        let existing = match (command.source.has_external_id(), &command.external_id) {
            (true, Some(external_id)) => {
                self.book_repo
                    .find_by_source(command.source, external_id)
                    .await?
            }
            _ => None,
        };
        let book_deduplicated = existing.is_some();

        let book = match existing {
            Some(mut book) => {
                // 命中时用新元数据补全空缺字段
                if book.description.is_none() {
                    book.description = command.description;
                }
                if book.cover_image_url.is_none() {
                    book.cover_image_url = command.cover_image_url;
                }
                book.updated_at = Utc::now();
                self.book_repo.save(&book).await?;
                book
            }
            None => {
                // 经领域聚合归一化（类型标签去重等）
                let mut aggregate =
                    Book::new(title, command.authors, command.source, command.external_id);
                aggregate.set_metadata(command.description, command.cover_image_url);
                aggregate.set_genres(command.genres);

                let book = BookRecord {
                    id: *aggregate.id().as_uuid(),
                    title: aggregate.title().as_str().to_string(),
                    authors: aggregate.authors().to_vec(),
                    description: aggregate.description().map(String::from),
                    cover_image_url: aggregate.cover_image_url().map(String::from),
                    genres: aggregate.genres().to_vec(),
                    source: aggregate.source(),
                    external_id: aggregate.external_id().map(String::from),
                    created_at: aggregate.created_at(),
                    updated_at: aggregate.updated_at(),
                };
                self.book_repo.save(&book).await?;
                book
            }
        };

        // 同一本书不重复入架
        if let Some(existing) = self
            .library_repo
            .find_by_user_and_book(user.id, book.id)
            .await?
        {
            return Err(ApplicationError::business_rule(format!(
                "Book already in library: {}",
                existing.id
            )));
        }

        let user_book = UserBook::new(user.id, book.id);
        let record = UserBookRecord {
            id: *user_book.id().as_uuid(),
            user_id: user.id,
            book_id: book.id,
            status: user_book.status(),
            progress: user_book.progress(),
            current_page: user_book.current_page(),
            started_at: user_book.started_at(),
            finished_at: user_book.finished_at(),
            created_at: user_book.created_at(),
            updated_at: user_book.updated_at(),
        };
        self.library_repo.save(&record).await?;

        tracing::info!(
            user_id = %user.id,
            book_id = %book.id,
            user_book_id = %record.id,
            deduplicated = book_deduplicated,
            "Book added to library"
        );

        Ok(AddBookToLibraryResponse {
            user_book_id: record.id,
            book_id: book.id,
            book_deduplicated,
        })
    }
}

// ============================================================================
// UpdateReadingStatus
// ============================================================================

/// 更新阅读状态响应
#[derive(Debug, Clone)]
pub struct UpdateReadingStatusResponse {
    pub user_book_id: Uuid,
    pub status: ReadingStatus,
    /// 本次变更触发的自动生成任务
    pub generation_job_id: Option<String>,
}

/// UpdateReadingStatus Handler
///
/// 状态机由领域聚合执行；进入在读/读完且用户开启自动生成时入队任务
pub struct UpdateReadingStatusHandler {
    user_repo: Arc<dyn UserRepositoryPort>,
    library_repo: Arc<dyn LibraryRepositoryPort>,
    job_manager: Arc<dyn JobManagerPort>,
}

impl UpdateReadingStatusHandler {
    pub fn new(
        user_repo: Arc<dyn UserRepositoryPort>,
        library_repo: Arc<dyn LibraryRepositoryPort>,
        job_manager: Arc<dyn JobManagerPort>,
    ) -> Self {
        Self {
            user_repo,
            library_repo,
            job_manager,
        }
    }

    pub async fn handle(
        &self,
        command: UpdateReadingStatus,
    ) -> Result<UpdateReadingStatusResponse, ApplicationError> {
        let record = self
            .library_repo
            .find_by_id(command.user_book_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("UserBook", command.user_book_id))?;

        let status_changed = record.status != command.status;

        // 重建聚合执行状态机，再落回记录
        let mut user_book = UserBook::restore(
            UserBookId::from_uuid(record.id),
            record.user_id,
            record.book_id,
            record.status,
            record.progress,
            record.current_page,
            record.started_at,
            record.finished_at,
            record.created_at,
            record.updated_at,
        );

        user_book.transition(command.status);
        if let Some(progress) = command.progress {
            user_book
                .set_progress(progress)
                .map_err(|e| ApplicationError::validation(e.to_string()))?;
        }
        if let Some(page) = command.current_page {
            user_book.set_current_page(page);
        }

        let updated = UserBookRecord {
            id: record.id,
            user_id: record.user_id,
            book_id: record.book_id,
            status: user_book.status(),
            progress: user_book.progress(),
            current_page: user_book.current_page(),
            started_at: user_book.started_at(),
            finished_at: user_book.finished_at(),
            created_at: record.created_at,
            updated_at: user_book.updated_at(),
        };
        self.library_repo.save(&updated).await?;

        // 自动生成：仅在状态真正变化且进入触发态时
        let mut generation_job_id = None;
        if status_changed && command.status.triggers_generation() {
            let user = self
                .user_repo
                .find_by_id(record.user_id)
                .await?
                .ok_or_else(|| ApplicationError::not_found("User", record.user_id))?;

            if user.preferences.auto_generate_playlists {
                let job = GenerationJob::new(user.id, record.id, false);
                let job_id = self.job_manager.submit(job)?;
                tracing::info!(
                    user_book_id = %record.id,
                    job_id = %job_id,
                    "Auto-generation job enqueued"
                );
                generation_job_id = Some(job_id);
            }
        }

        tracing::info!(
            user_book_id = %record.id,
            status = %command.status,
            "Reading status updated"
        );

        Ok(UpdateReadingStatusResponse {
            user_book_id: record.id,
            status: command.status,
            generation_job_id,
        })
    }
}

// ============================================================================
// RemoveBookFromLibrary
// ============================================================================

/// RemoveBookFromLibrary Handler
pub struct RemoveBookFromLibraryHandler {
    library_repo: Arc<dyn LibraryRepositoryPort>,
    job_manager: Arc<dyn JobManagerPort>,
}

impl RemoveBookFromLibraryHandler {
    pub fn new(
        library_repo: Arc<dyn LibraryRepositoryPort>,
        job_manager: Arc<dyn JobManagerPort>,
    ) -> Self {
        Self {
            library_repo,
            job_manager,
        }
    }

    pub async fn handle(&self, command: RemoveBookFromLibrary) -> Result<(), ApplicationError> {
        let record = self
            .library_repo
            .find_by_id(command.user_book_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("UserBook", command.user_book_id))?;

        // 先取消在途生成任务，再级联删除
        let cancelled = self.job_manager.cancel_pending(record.id);
        self.library_repo.delete(record.id).await?;

        tracing::info!(
            user_book_id = %record.id,
            cancelled_jobs = cancelled,
            "Book removed from library"
        );
        Ok(())
    }
}
