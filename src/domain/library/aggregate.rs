//! Library Context - Aggregate Root
//!
//! UserBook 关联一个 User 与一个 Book，承载阅读状态与进度。
//! 派生产物（分析、歌单）挂在 UserBook 下，状态回退时不删除。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::LibraryError;

/// 书架条目唯一标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserBookId(Uuid);

impl UserBookId {
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

impl Default for UserBookId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserBookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 阅读状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadingStatus {
    /// 想读
    WantToRead,
    /// 在读
    CurrentlyReading,
    /// 读完
    Finished,
    /// 弃读
    DidNotFinish,
}

impl ReadingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingStatus::WantToRead => "want-to-read",
            ReadingStatus::CurrentlyReading => "currently-reading",
            ReadingStatus::Finished => "finished",
            ReadingStatus::DidNotFinish => "did-not-finish",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "want-to-read" => Some(ReadingStatus::WantToRead),
            "currently-reading" => Some(ReadingStatus::CurrentlyReading),
            "finished" => Some(ReadingStatus::Finished),
            "did-not-finish" => Some(ReadingStatus::DidNotFinish),
            _ => None,
        }
    }

    /// 进入该状态是否触发自动生成歌单（由用户偏好最终决定）
    pub fn triggers_generation(&self) -> bool {
        matches!(
            self,
            ReadingStatus::CurrentlyReading | ReadingStatus::Finished
        )
    }
}

impl std::fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// UserBook 聚合根
///
/// 不变量:
/// - (user_id, book_id) 唯一
/// - progress 在 0..=100
/// - started_at / finished_at 由状态机维护，不直接赋值
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserBook {
    id: UserBookId,
    user_id: Uuid,
    book_id: Uuid,
    status: ReadingStatus,
    progress: Option<u8>,
    current_page: Option<u32>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserBook {
    /// 将书加入书架（初始状态：想读）
    pub fn new(user_id: Uuid, book_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: UserBookId::new(),
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

    /// 从持久化数据重建聚合
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: UserBookId,
        user_id: Uuid,
        book_id: Uuid,
        status: ReadingStatus,
        progress: Option<u8>,
        current_page: Option<u32>,
        started_at: Option<DateTime<Utc>>,
        finished_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            book_id,
            status,
            progress,
            current_page,
            started_at,
            finished_at,
            created_at,
            updated_at,
        }
    }

    /// 状态迁移
    ///
    /// 任意迁移均允许，时间戳规则:
    /// - 进入在读: started_at 为空则填当前时间
    /// - 进入读完: finished_at 填当前时间，progress 置 100
    /// - 离开读完（回退）: 清空 finished_at，保留派生产物
    pub fn transition(&mut self, to: ReadingStatus) {
        let now = Utc::now();
        let from = self.status;

        if from == ReadingStatus::Finished && to != ReadingStatus::Finished {
            self.finished_at = None;
        }

        match to {
            ReadingStatus::CurrentlyReading => {
                if self.started_at.is_none() {
                    self.started_at = Some(now);
                }
            }
            ReadingStatus::Finished => {
                if self.started_at.is_none() {
                    self.started_at = Some(now);
                }
                self.finished_at = Some(now);
                self.progress = Some(100);
            }
            _ => {}
        }

        self.status = to;
        self.updated_at = now;
    }

    /// 更新阅读进度（百分比）
    pub fn set_progress(&mut self, progress: u8) -> Result<(), LibraryError> {
        if progress > 100 {
            return Err(LibraryError::InvalidProgress(progress));
        }
        self.progress = Some(progress);
        self.updated_at = Utc::now();
        Ok(())
    }

    /// 更新当前页码
    pub fn set_current_page(&mut self, page: u32) {
        self.current_page = Some(page);
        self.updated_at = Utc::now();
    }

    // Getters
    pub fn id(&self) -> &UserBookId {
        &self.id
    }

    pub fn user_id(&self) -> &Uuid {
        &self.user_id
    }

    pub fn book_id(&self) -> &Uuid {
        &self.book_id
    }

    pub fn status(&self) -> ReadingStatus {
        self.status
    }

    pub fn progress(&self) -> Option<u8> {
        self.progress
    }

    pub fn current_page(&self) -> Option<u32> {
        self.current_page
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_book_wants_to_read() {
        let ub = UserBook::new(Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(ub.status(), ReadingStatus::WantToRead);
        assert!(ub.started_at().is_none());
        assert!(ub.finished_at().is_none());
    }

    #[test]
    fn test_start_reading_sets_started_at_once() {
        let mut ub = UserBook::new(Uuid::new_v4(), Uuid::new_v4());

        ub.transition(ReadingStatus::CurrentlyReading);
        let started = ub.started_at().unwrap();

        ub.transition(ReadingStatus::WantToRead);
        ub.transition(ReadingStatus::CurrentlyReading);
        assert_eq!(ub.started_at(), Some(started));
    }

    #[test]
    fn test_finish_sets_finished_at_and_progress() {
        let mut ub = UserBook::new(Uuid::new_v4(), Uuid::new_v4());
        ub.transition(ReadingStatus::CurrentlyReading);
        ub.transition(ReadingStatus::Finished);

        assert!(ub.finished_at().is_some());
        assert_eq!(ub.progress(), Some(100));
    }

    #[test]
    fn test_regression_from_finished_clears_finished_at() {
        let mut ub = UserBook::new(Uuid::new_v4(), Uuid::new_v4());
        ub.transition(ReadingStatus::Finished);
        assert!(ub.finished_at().is_some());

        ub.transition(ReadingStatus::CurrentlyReading);
        assert!(ub.finished_at().is_none());
        assert_eq!(ub.status(), ReadingStatus::CurrentlyReading);
    }

    #[test]
    fn test_finish_without_start_backfills_started_at() {
        let mut ub = UserBook::new(Uuid::new_v4(), Uuid::new_v4());
        ub.transition(ReadingStatus::Finished);
        assert!(ub.started_at().is_some());
    }

    #[test]
    fn test_progress_bounds() {
        let mut ub = UserBook::new(Uuid::new_v4(), Uuid::new_v4());
        assert!(ub.set_progress(100).is_ok());
        assert!(ub.set_progress(101).is_err());
    }

    #[test]
    fn test_generation_trigger_states() {
        assert!(ReadingStatus::CurrentlyReading.triggers_generation());
        assert!(ReadingStatus::Finished.triggers_generation());
        assert!(!ReadingStatus::WantToRead.triggers_generation());
        assert!(!ReadingStatus::DidNotFinish.triggers_generation());
    }
}
