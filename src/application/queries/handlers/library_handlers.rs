//! Library Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{
    AnalysisRecord, AnalysisRepositoryPort, BookRecord, BookRepositoryPort,
    LibraryRepositoryPort, PlaylistRecord, PlaylistRepositoryPort, UserBookRecord,
};
use crate::application::queries::{GetAnalysis, GetLibrary, GetUserBook};

/// 书架条目（含书籍）
#[derive(Debug, Clone)]
pub struct LibraryEntry {
    pub user_book: UserBookRecord,
    pub book: BookRecord,
}

/// 书架条目详情（含派生产物）
#[derive(Debug, Clone)]
pub struct UserBookDetails {
    pub user_book: UserBookRecord,
    pub book: BookRecord,
    pub analysis: Option<AnalysisRecord>,
    pub playlists: Vec<PlaylistRecord>,
}

/// GetLibrary Handler
pub struct GetLibraryHandler {
    library_repo: Arc<dyn LibraryRepositoryPort>,
    book_repo: Arc<dyn BookRepositoryPort>,
}

impl GetLibraryHandler {
    pub fn new(
        library_repo: Arc<dyn LibraryRepositoryPort>,
        book_repo: Arc<dyn BookRepositoryPort>,
    ) -> Self {
        Self {
            library_repo,
            book_repo,
        }
    }

    pub async fn handle(&self, query: GetLibrary) -> Result<Vec<LibraryEntry>, ApplicationError> {
        let user_books = self.library_repo.find_by_user(query.user_id).await?;

        let mut entries = Vec::with_capacity(user_books.len());
        for user_book in user_books {
            let book = self
                .book_repo
                .find_by_id(user_book.book_id)
                .await?
                .ok_or_else(|| ApplicationError::not_found("Book", user_book.book_id))?;
            entries.push(LibraryEntry { user_book, book });
        }

        Ok(entries)
    }
}

/// GetUserBook Handler
pub struct GetUserBookHandler {
    library_repo: Arc<dyn LibraryRepositoryPort>,
    book_repo: Arc<dyn BookRepositoryPort>,
    analysis_repo: Arc<dyn AnalysisRepositoryPort>,
    playlist_repo: Arc<dyn PlaylistRepositoryPort>,
}

impl GetUserBookHandler {
    pub fn new(
        library_repo: Arc<dyn LibraryRepositoryPort>,
        book_repo: Arc<dyn BookRepositoryPort>,
        analysis_repo: Arc<dyn AnalysisRepositoryPort>,
        playlist_repo: Arc<dyn PlaylistRepositoryPort>,
    ) -> Self {
        Self {
            library_repo,
            book_repo,
            analysis_repo,
            playlist_repo,
        }
    }

    pub async fn handle(&self, query: GetUserBook) -> Result<UserBookDetails, ApplicationError> {
        let user_book = self
            .library_repo
            .find_by_id(query.user_book_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("UserBook", query.user_book_id))?;

        let book = self
            .book_repo
            .find_by_id(user_book.book_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Book", user_book.book_id))?;

        let analysis = self.analysis_repo.find_by_user_book(user_book.id).await?;
        let playlists = self.playlist_repo.find_by_user_book(user_book.id).await?;

        Ok(UserBookDetails {
            user_book,
            book,
            analysis,
            playlists,
        })
    }
}

/// GetAnalysis Handler
pub struct GetAnalysisHandler {
    analysis_repo: Arc<dyn AnalysisRepositoryPort>,
}

impl GetAnalysisHandler {
    pub fn new(analysis_repo: Arc<dyn AnalysisRepositoryPort>) -> Self {
        Self { analysis_repo }
    }

    pub async fn handle(&self, query: GetAnalysis) -> Result<AnalysisRecord, ApplicationError> {
        self.analysis_repo
            .find_by_user_book(query.user_book_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("BookAnalysis", query.user_book_id))
    }
}
