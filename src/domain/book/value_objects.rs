//! Book Context - Value Objects

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 书籍唯一标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookId(Uuid);

impl BookId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for BookId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 书名
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookTitle(String);

impl BookTitle {
    pub fn new(title: impl Into<String>) -> Result<Self, &'static str> {
        let title = title.into();
        let title = title.trim().to_string();
        if title.is_empty() {
            return Err("书名不能为空");
        }
        if title.len() > 500 {
            return Err("书名长度不能超过500字符");
        }
        Ok(Self(title))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BookTitle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 书籍来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BookSource {
    /// Goodreads 书架同步
    Goodreads,
    /// Kindle 导入
    Kindle,
    /// 手动录入
    Manual,
    /// 文件上传
    Uploaded,
    /// Google Books 检索
    GoogleBooks,
    /// Apple Books 检索
    AppleBooks,
}

impl BookSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookSource::Goodreads => "goodreads",
            BookSource::Kindle => "kindle",
            BookSource::Manual => "manual",
            BookSource::Uploaded => "uploaded",
            BookSource::GoogleBooks => "google-books",
            BookSource::AppleBooks => "apple-books",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "goodreads" => Some(BookSource::Goodreads),
            "kindle" => Some(BookSource::Kindle),
            "manual" => Some(BookSource::Manual),
            "uploaded" => Some(BookSource::Uploaded),
            "google-books" => Some(BookSource::GoogleBooks),
            "apple-books" => Some(BookSource::AppleBooks),
            _ => None,
        }
    }

    /// 该来源是否携带外部 ID（用于去重）
    pub fn has_external_id(&self) -> bool {
        !matches!(self, BookSource::Manual | BookSource::Uploaded)
    }
}

impl std::fmt::Display for BookSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_rejects_empty() {
        assert!(BookTitle::new("").is_err());
        assert!(BookTitle::new("   ").is_err());
    }

    #[test]
    fn test_title_trims_whitespace() {
        let title = BookTitle::new("  呼啸山庄  ").unwrap();
        assert_eq!(title.as_str(), "呼啸山庄");
    }

    #[test]
    fn test_source_roundtrip() {
        for s in [
            BookSource::Goodreads,
            BookSource::Kindle,
            BookSource::Manual,
            BookSource::Uploaded,
            BookSource::GoogleBooks,
            BookSource::AppleBooks,
        ] {
            assert_eq!(BookSource::from_str(s.as_str()), Some(s));
        }
        assert_eq!(BookSource::from_str("unknown"), None);
    }

    #[test]
    fn test_manual_source_has_no_external_id() {
        assert!(!BookSource::Manual.has_external_id());
        assert!(!BookSource::Uploaded.has_external_id());
        assert!(BookSource::GoogleBooks.has_external_id());
    }
}
