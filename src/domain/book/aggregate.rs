//! Book Context - Aggregate Root

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookId, BookSource, BookTitle};

/// Book 聚合根
///
/// 不变量:
/// - authors 保持录入顺序
/// - genres 去重（保序）
/// - (source, external_id) 在携带外部 ID 的来源下全局唯一
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    id: BookId,
    title: BookTitle,
    authors: Vec<String>,
    description: Option<String>,
    cover_image_url: Option<String>,
    genres: Vec<String>,
    source: BookSource,
    external_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Book {
    /// 创建新书籍
    pub fn new(
        title: BookTitle,
        authors: Vec<String>,
        source: BookSource,
        external_id: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: BookId::new(),
            title,
            authors,
            description: None,
            cover_image_url: None,
            genres: Vec::new(),
            source,
            external_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// 设置描述与封面
    pub fn set_metadata(&mut self, description: Option<String>, cover_image_url: Option<String>) {
        self.description = description;
        self.cover_image_url = cover_image_url;
        self.updated_at = Utc::now();
    }

    /// 设置类型标签（去重保序）
    pub fn set_genres(&mut self, genres: Vec<String>) {
        self.genres = dedup_genres(genres);
        self.updated_at = Utc::now();
    }

    /// 去重 key：仅对携带外部 ID 的来源有效
    pub fn dedup_key(&self) -> Option<(BookSource, &str)> {
        if !self.source.has_external_id() {
            return None;
        }
        self.external_id
            .as_deref()
            .map(|external_id| (self.source, external_id))
    }

    // Getters
    pub fn id(&self) -> &BookId {
        &self.id
    }

    pub fn title(&self) -> &BookTitle {
        &self.title
    }

    pub fn authors(&self) -> &[String] {
        &self.authors
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn cover_image_url(&self) -> Option<&str> {
        self.cover_image_url.as_deref()
    }

    pub fn genres(&self) -> &[String] {
        &self.genres
    }

    pub fn source(&self) -> BookSource {
        self.source
    }

    pub fn external_id(&self) -> Option<&str> {
        self.external_id.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// 类型标签去重（保序，忽略大小写与首尾空白）
fn dedup_genres(genres: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut result = Vec::with_capacity(genres.len());

    for genre in genres {
        let genre = genre.trim().to_string();
        if genre.is_empty() {
            continue;
        }
        if seen.insert(genre.to_lowercase()) {
            result.push(genre);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_creation() {
        let title = BookTitle::new("The Night Circus").unwrap();
        let book = Book::new(
            title,
            vec!["Erin Morgenstern".to_string()],
            BookSource::GoogleBooks,
            Some("gb-123".to_string()),
        );

        assert_eq!(book.title().as_str(), "The Night Circus");
        assert_eq!(book.authors().len(), 1);
        assert!(book.genres().is_empty());
    }

    #[test]
    fn test_genres_deduped_case_insensitive() {
        let title = BookTitle::new("Dune").unwrap();
        let mut book = Book::new(title, vec![], BookSource::Manual, None);

        book.set_genres(vec![
            "Sci-Fi".to_string(),
            "sci-fi".to_string(),
            "  Adventure ".to_string(),
            "".to_string(),
        ]);

        assert_eq!(book.genres(), &["Sci-Fi".to_string(), "Adventure".to_string()]);
    }

    #[test]
    fn test_dedup_key_only_for_external_sources() {
        let title = BookTitle::new("Dune").unwrap();
        let manual = Book::new(title.clone(), vec![], BookSource::Manual, None);
        assert!(manual.dedup_key().is_none());

        let external = Book::new(
            title,
            vec![],
            BookSource::Goodreads,
            Some("gr-42".to_string()),
        );
        assert_eq!(
            external.dedup_key(),
            Some((BookSource::Goodreads, "gr-42"))
        );
    }
}
