//! Analysis Provider Port - AI 书籍分析抽象
//!
//! 定义 AI 内容分析的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::analysis::AnalysisSource;

/// 分析服务错误
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// 分析请求
#[derive(Debug, Clone)]
pub struct AnalysisProviderRequest {
    /// 完整提示词（由 domain::build_analysis_prompt 构造）
    pub prompt: String,
    /// 输入来源（是否含全文）
    pub source: AnalysisSource,
}

/// 模型返回的情绪（未经校验）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderMood {
    pub name: String,
    pub intensity: f64,
}

/// 模型返回的分析结果（未经校验的原始值）
///
/// 边界值、枚举合法性由应用层转换为领域对象时校验。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderAnalysis {
    pub mood: Vec<ProviderMood>,
    pub themes: Vec<String>,
    pub era: Option<String>,
    pub location: Option<String>,
    pub atmosphere: Option<String>,
    pub pace: String,
    pub intensity: String,
    pub time_of_day: Vec<String>,
    pub vibe: String,
    pub music_description: String,
    pub confidence: f64,
    /// 产出该结果的模型标识
    pub model: String,
}

/// Analysis Provider Port
///
/// 外部 AI 分析服务的抽象接口
#[async_trait]
pub trait AnalysisProviderPort: Send + Sync {
    /// 执行书籍分析
    async fn analyze(
        &self,
        request: AnalysisProviderRequest,
    ) -> Result<ProviderAnalysis, ProviderError>;

    /// 当前使用的模型标识
    fn model(&self) -> &str;

    /// 检查分析服务是否可用
    async fn health_check(&self) -> bool {
        true // 默认实现
    }
}
