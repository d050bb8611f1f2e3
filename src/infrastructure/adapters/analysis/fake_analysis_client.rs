//! Fake Analysis Client - 用于测试的分析客户端
//!
//! 返回固定的分析结果，不实际调用 AI 服务

use async_trait::async_trait;

use crate::application::ports::{
    AnalysisProviderPort, AnalysisProviderRequest, ProviderAnalysis, ProviderError, ProviderMood,
};

/// Fake Analysis Client 配置
#[derive(Debug, Clone)]
pub struct FakeAnalysisClientConfig {
    /// 固定返回的置信度
    pub confidence: f64,
    /// 模型标识
    pub model: String,
    /// 模拟推理延迟（毫秒）
    pub latency_ms: u64,
}

impl Default for FakeAnalysisClientConfig {
    fn default() -> Self {
        Self {
            confidence: 0.85,
            model: "fake-analyzer".to_string(),
            latency_ms: 100,
        }
    }
}

/// Fake Analysis Client
///
/// 用于测试，返回固定的分析结果
pub struct FakeAnalysisClient {
    config: FakeAnalysisClientConfig,
}

impl FakeAnalysisClient {
    pub fn new(config: FakeAnalysisClientConfig) -> Self {
        tracing::info!(
            model = %config.model,
            confidence = config.confidence,
            "FakeAnalysisClient initialized"
        );
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(FakeAnalysisClientConfig::default())
    }
}

#[async_trait]
impl AnalysisProviderPort for FakeAnalysisClient {
    async fn analyze(
        &self,
        request: AnalysisProviderRequest,
    ) -> Result<ProviderAnalysis, ProviderError> {
        tracing::debug!(
            prompt_len = request.prompt.len(),
            source = %request.source.as_str(),
            "FakeAnalysisClient: returning fixed analysis"
        );

        // 模拟推理延迟
        tokio::time::sleep(tokio::time::Duration::from_millis(self.config.latency_ms)).await;

        Ok(ProviderAnalysis {
            mood: vec![
                ProviderMood {
                    name: "melancholic".to_string(),
                    intensity: 0.8,
                },
                ProviderMood {
                    name: "hopeful".to_string(),
                    intensity: 0.4,
                },
            ],
            themes: vec!["memory".to_string(), "loss".to_string()],
            era: Some("contemporary".to_string()),
            location: Some("urban".to_string()),
            atmosphere: Some("cozy".to_string()),
            pace: "slow".to_string(),
            intensity: "moderate".to_string(),
            time_of_day: vec!["evening".to_string(), "night".to_string()],
            vibe: "雨夜窗边的安静阅读".to_string(),
            music_description: "slow ambient piano with soft strings".to_string(),
            confidence: self.config.confidence,
            model: self.config.model.clone(),
        })
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::analysis::AnalysisSource;

    #[tokio::test]
    async fn test_fake_analysis_is_deterministic() {
        let client = FakeAnalysisClient::new(FakeAnalysisClientConfig {
            latency_ms: 0,
            ..Default::default()
        });

        let request = AnalysisProviderRequest {
            prompt: "Title: Test".to_string(),
            source: AnalysisSource::MetadataOnly,
        };

        let first = client.analyze(request.clone()).await.unwrap();
        let second = client.analyze(request).await.unwrap();

        assert_eq!(first.mood.len(), second.mood.len());
        assert_eq!(first.confidence, second.confidence);
        assert_eq!(first.model, "fake-analyzer");
    }
}
