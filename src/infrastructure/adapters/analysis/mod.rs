//! AI 分析服务适配器

mod fake_analysis_client;
mod http_analysis_client;

pub use fake_analysis_client::{FakeAnalysisClient, FakeAnalysisClientConfig};
pub use http_analysis_client::{HttpAnalysisClient, HttpAnalysisClientConfig};
