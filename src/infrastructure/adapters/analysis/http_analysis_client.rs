//! HTTP Analysis Client - 调用外部 AI 分析服务
//!
//! 实现 AnalysisProviderPort trait，通过 HTTP 调用外部分析服务
//!
//! 外部分析 API:
//! POST {base_url}/v1/analyze
//! Request: {"prompt": "...", "source": "metadata-only", "model": "..."}  (JSON)
//! Response: 分析结果 JSON

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{
    AnalysisProviderPort, AnalysisProviderRequest, ProviderAnalysis, ProviderError, ProviderMood,
};

/// 分析请求体 (JSON)
#[derive(Debug, Serialize)]
struct AnalysisHttpRequest {
    /// 完整提示词
    prompt: String,
    /// 输入来源标识
    source: String,
    /// 请求使用的模型
    model: String,
}

/// 分析响应体 (JSON)
#[derive(Debug, Deserialize)]
struct AnalysisHttpResponse {
    mood: Vec<MoodDto>,
    #[serde(default)]
    themes: Vec<String>,
    era: Option<String>,
    location: Option<String>,
    atmosphere: Option<String>,
    pace: String,
    intensity: String,
    #[serde(default)]
    time_of_day: Vec<String>,
    #[serde(default)]
    vibe: String,
    #[serde(default)]
    music_description: String,
    confidence: f64,
    /// 服务端实际使用的模型（缺省用请求模型）
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MoodDto {
    name: String,
    intensity: f64,
}

/// HTTP 分析客户端配置
#[derive(Debug, Clone)]
pub struct HttpAnalysisClientConfig {
    /// 分析服务基础 URL
    pub base_url: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    /// 使用的模型标识
    pub model: String,
}

impl Default for HttpAnalysisClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8100".to_string(),
            timeout_secs: 120,
            model: "claude-3-opus".to_string(),
        }
    }
}

impl HttpAnalysisClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// HTTP 分析客户端
///
/// 通过 HTTP 调用外部 AI 分析服务
pub struct HttpAnalysisClient {
    client: Client,
    config: HttpAnalysisClientConfig,
}

impl HttpAnalysisClient {
    /// 创建新的 HTTP 分析客户端
    pub fn new(config: HttpAnalysisClientConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// 使用默认配置创建客户端
    pub fn with_default_config() -> Result<Self, ProviderError> {
        Self::new(HttpAnalysisClientConfig::default())
    }

    /// 获取分析 URL
    fn analyze_url(&self) -> String {
        format!("{}/v1/analyze", self.config.base_url)
    }

    /// 获取健康检查 URL
    fn health_url(&self) -> String {
        format!("{}/health", self.config.base_url)
    }
}

#[async_trait]
impl AnalysisProviderPort for HttpAnalysisClient {
    async fn analyze(
        &self,
        request: AnalysisProviderRequest,
    ) -> Result<ProviderAnalysis, ProviderError> {
        let http_request = AnalysisHttpRequest {
            prompt: request.prompt,
            source: request.source.as_str().to_string(),
            model: self.config.model.clone(),
        };

        tracing::debug!(
            url = %self.analyze_url(),
            prompt_len = http_request.prompt.len(),
            source = %http_request.source,
            model = %http_request.model,
            "Sending analysis request"
        );

        let response = self
            .client
            .post(&self.analyze_url())
            .json(&http_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout
                } else if e.is_connect() {
                    ProviderError::NetworkError(format!(
                        "Cannot connect to analysis service: {}",
                        e
                    ))
                } else {
                    ProviderError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::ServiceError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body: AnalysisHttpResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse analysis: {}", e)))?;

        let model = body.model.unwrap_or_else(|| self.config.model.clone());

        tracing::info!(
            mood_count = body.mood.len(),
            confidence = body.confidence,
            model = %model,
            "Analysis completed"
        );

        Ok(ProviderAnalysis {
            mood: body
                .mood
                .into_iter()
                .map(|m| ProviderMood {
                    name: m.name,
                    intensity: m.intensity,
                })
                .collect(),
            themes: body.themes,
            era: body.era,
            location: body.location,
            atmosphere: body.atmosphere,
            pace: body.pace,
            intensity: body.intensity,
            time_of_day: body.time_of_day,
            vibe: body.vibe,
            music_description: body.music_description,
            confidence: body.confidence,
            model,
        })
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(&self.health_url())
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = HttpAnalysisClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8100");
        assert_eq!(config.timeout_secs, 120);
        assert_eq!(config.model, "claude-3-opus");
    }

    #[test]
    fn test_config_builder() {
        let config = HttpAnalysisClientConfig::new("http://ai:9000")
            .with_timeout(60)
            .with_model("claude-3-sonnet");
        assert_eq!(config.base_url, "http://ai:9000");
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.model, "claude-3-sonnet");
    }

    #[test]
    fn test_response_parsing_defaults() {
        let json = r#"{
            "mood": [{"name": "tense", "intensity": 0.9}],
            "pace": "fast",
            "intensity": "intense",
            "confidence": 0.8
        }"#;
        let parsed: AnalysisHttpResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.mood.len(), 1);
        assert!(parsed.themes.is_empty());
        assert!(parsed.model.is_none());
    }
}
