//! Job Manager Port - 歌单生成任务管理
//!
//! 定义生成任务管理的抽象接口，具体实现在 infrastructure/memory 层

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Job Manager 错误
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("Job already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Queue full")]
    QueueFull,
}

/// 任务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// 等待处理
    Pending,
    /// 分析中
    Analyzing,
    /// 选曲中
    Synthesizing,
    /// 已完成
    Ready,
    /// 失败
    Failed,
    /// 已取消
    Cancelled,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Analyzing => "analyzing",
            JobState::Synthesizing => "synthesizing",
            JobState::Ready => "ready",
            JobState::Failed => "failed",
            JobState::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(JobState::Pending),
            "analyzing" => Some(JobState::Analyzing),
            "synthesizing" => Some(JobState::Synthesizing),
            "ready" => Some(JobState::Ready),
            "failed" => Some(JobState::Failed),
            "cancelled" => Some(JobState::Cancelled),
            _ => None,
        }
    }

    /// 是否终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Ready | JobState::Failed | JobState::Cancelled)
    }
}

/// 歌单生成任务
#[derive(Debug, Clone)]
pub struct GenerationJob {
    pub job_id: String,
    pub user_id: Uuid,
    pub user_book_id: Uuid,
    /// 已有分析时是否强制重新分析
    pub force_reanalyze: bool,
    pub state: JobState,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    /// 完成后指向生成的歌单
    pub playlist_id: Option<Uuid>,
}

impl GenerationJob {
    pub fn new(user_id: Uuid, user_book_id: Uuid, force_reanalyze: bool) -> Self {
        Self {
            job_id: Uuid::new_v4().to_string(),
            user_id,
            user_book_id,
            force_reanalyze,
            state: JobState::Pending,
            created_at: Utc::now(),
            completed_at: None,
            error_message: None,
            playlist_id: None,
        }
    }
}

/// Job Manager Port
///
/// 管理生成任务的生命周期，所有状态存储在内存中
pub trait JobManagerPort: Send + Sync {
    /// 提交任务到队列
    fn submit(&self, job: GenerationJob) -> Result<String, JobError>;

    /// 取消书架条目的所有 pending 任务，返回取消数量
    fn cancel_pending(&self, user_book_id: Uuid) -> usize;

    /// 检查任务是否已取消
    fn is_cancelled(&self, job_id: &str) -> bool;

    /// 获取任务状态
    fn get_state(&self, job_id: &str) -> Option<JobState>;

    /// 设置任务状态
    fn set_state(&self, job_id: &str, state: JobState) -> Result<(), JobError>;

    /// 设置任务失败并记录错误
    fn set_failed(&self, job_id: &str, error: String) -> Result<(), JobError>;

    /// 记录任务产出的歌单
    fn set_playlist(&self, job_id: &str, playlist_id: Uuid) -> Result<(), JobError>;

    /// 获取任务
    fn get_job(&self, job_id: &str) -> Option<GenerationJob>;

    /// 获取书架条目的所有任务
    fn get_jobs_by_user_book(&self, user_book_id: Uuid) -> Vec<GenerationJob>;
}
