//! HTTP Content Fetcher - 调用外部音频渲染服务
//!
//! 实现 ContentFetchPort trait
//!
//! 外部渲染 API:
//! POST {base_url}/api/audio/render
//! Request: {"content_id": "...", "variant": "summary", "mode": "chunk"}  (JSON)
//! Response: 音频二进制

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;

use crate::application::ports::{ContentFetchPort, FetchError};
use crate::domain::playback::{ContentRef, RenderMode, TextVariant};

/// 渲染请求体 (JSON)
#[derive(Debug, Serialize)]
struct RenderRequest<'a> {
    content_id: &'a str,
    variant: TextVariant,
    mode: RenderMode,
}

/// HTTP 获取器配置
#[derive(Debug, Clone)]
pub struct HttpContentFetcherConfig {
    /// 渲染服务基础 URL
    pub base_url: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for HttpContentFetcherConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 120,
        }
    }
}

impl HttpContentFetcherConfig {
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
}

/// HTTP 内容获取器
pub struct HttpContentFetcher {
    client: Client,
    config: HttpContentFetcherConfig,
}

impl HttpContentFetcher {
    pub fn new(config: HttpContentFetcherConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FetchError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn render_url(&self) -> String {
        format!("{}/api/audio/render", self.config.base_url.trim_end_matches('/'))
    }

    fn health_url(&self) -> String {
        format!("{}/health", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ContentFetchPort for HttpContentFetcher {
    async fn fetch_audio(
        &self,
        content: &ContentRef,
        mode: RenderMode,
    ) -> Result<Vec<u8>, FetchError> {
        let request = RenderRequest {
            content_id: content.content_id(),
            variant: content.variant(),
            mode,
        };

        tracing::debug!(
            url = %self.render_url(),
            content = %content,
            mode = %mode,
            "Sending render request"
        );

        let response = self
            .client
            .post(self.render_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout
                } else if e.is_connect() {
                    FetchError::NetworkError(format!("Cannot connect to render service: {}", e))
                } else {
                    FetchError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::ContentNotFound(content.to_string()));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(FetchError::ServiceError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout
                } else {
                    FetchError::InvalidResponse(format!("Failed to read audio: {}", e))
                }
            })?
            .to_vec();

        tracing::info!(
            content = %content,
            mode = %mode,
            audio_size = audio.len(),
            "Render completed"
        );

        Ok(audio)
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(self.health_url())
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
    fn test_config_builder() {
        let config = HttpContentFetcherConfig::new("http://example.com:9000").with_timeout(30);
        assert_eq!(config.base_url, "http://example.com:9000");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_render_url_trims_trailing_slash() {
        let fetcher =
            HttpContentFetcher::new(HttpContentFetcherConfig::new("http://example.com/")).unwrap();
        assert_eq!(fetcher.render_url(), "http://example.com/api/audio/render");
    }

    #[test]
    fn test_render_request_body() {
        let content = ContentRef::new("lesson-7", TextVariant::Summary).unwrap();
        let request = RenderRequest {
            content_id: content.content_id(),
            variant: content.variant(),
            mode: RenderMode::Chunk,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["content_id"], "lesson-7");
        assert_eq!(json["variant"], "summary");
        assert_eq!(json["mode"], "chunk");
    }

    #[tokio::test]
    async fn test_unreachable_service_is_network_error() {
        let fetcher = HttpContentFetcher::new(
            HttpContentFetcherConfig::new("http://127.0.0.1:9").with_timeout(2),
        )
        .unwrap();
        let content = ContentRef::new("lesson-7", TextVariant::Original).unwrap();

        let err = fetcher
            .fetch_audio(&content, RenderMode::Full)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::NetworkError(_) | FetchError::Timeout));
        assert!(!fetcher.health_check().await);
    }
}
