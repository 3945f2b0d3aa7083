//! Content Fetch Port - 内容音频获取抽象
//!
//! 给定内容和渲染模式，返回原始音频字节。具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::playback::{ContentRef, RenderMode};

/// 内容获取错误
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Content not found: {0}")]
    ContentNotFound(String),
}

/// Content Fetch Port
///
/// 同一会话内每种渲染模式最多调用一次，对 (content, mode) 幂等
#[async_trait]
pub trait ContentFetchPort: Send + Sync {
    /// 获取指定渲染模式的音频字节
    async fn fetch_audio(
        &self,
        content: &ContentRef,
        mode: RenderMode,
    ) -> Result<Vec<u8>, FetchError>;

    /// 检查内容服务是否可用
    async fn health_check(&self) -> bool {
        true // 默认实现
    }
}
