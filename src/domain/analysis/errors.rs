//! Analysis Context - Errors

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("分析不存在: {0}")]
    NotFound(Uuid),

    #[error("该书架条目已有分析: {0}")]
    AlreadyAnalyzed(Uuid),

    #[error("无效的情绪: {0}")]
    InvalidMood(String),

    #[error("情绪强度越界: {0}（应在 0..=1）")]
    IntensityOutOfRange(f64),

    #[error("置信度越界: {0}（应在 0..=1）")]
    ConfidenceOutOfRange(f64),

    #[error("缺少模型标识")]
    MissingModel,

    #[error("存储错误: {0}")]
    StorageError(String),
}
