//! Fake Content Fetcher - 用于测试和离线演示的内容获取器
//!
//! 每种渲染模式返回固定的静音 WAV，可配置延迟和失败，不访问网络

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::application::ports::{ContentFetchPort, FetchError};
use crate::domain::playback::{ContentRef, RenderMode};

/// 生成指定时长的静音 WAV (16-bit PCM, 单声道)
pub fn silent_wav(duration_ms: u64, sample_rate: u32) -> Vec<u8> {
    let frames = (sample_rate as u64 * duration_ms / 1000) as u32;
    let data_len = frames * 2;

    let mut wav = Vec::with_capacity(44 + data_len as usize);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&1u16.to_le_bytes()); // mono
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    wav.extend_from_slice(&2u16.to_le_bytes());
    wav.extend_from_slice(&16u16.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.resize(44 + data_len as usize, 0);
    wav
}

#[derive(Debug, Clone)]
enum FakeResponse {
    Audio(Vec<u8>),
    Fail(String),
}

#[derive(Debug, Clone)]
struct FakeRender {
    response: FakeResponse,
    delay: Duration,
}

/// Fake Content Fetcher
pub struct FakeContentFetcher {
    chunk: FakeRender,
    full: FakeRender,
    chunk_calls: AtomicUsize,
    full_calls: AtomicUsize,
}

impl FakeContentFetcher {
    /// 采样率
    pub const SAMPLE_RATE: u32 = 8000;

    /// 创建获取器：预览片段与完整音频分别为指定时长的静音
    pub fn new(chunk_ms: u64, full_ms: u64) -> Self {
        Self {
            chunk: FakeRender {
                response: FakeResponse::Audio(silent_wav(chunk_ms, Self::SAMPLE_RATE)),
                delay: Duration::ZERO,
            },
            full: FakeRender {
                response: FakeResponse::Audio(silent_wav(full_ms, Self::SAMPLE_RATE)),
                delay: Duration::ZERO,
            },
            chunk_calls: AtomicUsize::new(0),
            full_calls: AtomicUsize::new(0),
        }
    }

    /// 替换某个模式返回的字节
    pub fn with_payload(mut self, mode: RenderMode, payload: Vec<u8>) -> Self {
        self.render_mut(mode).response = FakeResponse::Audio(payload);
        self
    }

    /// 让某个模式的请求失败
    pub fn with_failure(mut self, mode: RenderMode, message: impl Into<String>) -> Self {
        self.render_mut(mode).response = FakeResponse::Fail(message.into());
        self
    }

    /// 模拟渲染耗时
    pub fn with_delay(mut self, mode: RenderMode, delay: Duration) -> Self {
        self.render_mut(mode).delay = delay;
        self
    }

    /// 某个模式被请求的次数
    pub fn calls(&self, mode: RenderMode) -> usize {
        match mode {
            RenderMode::Chunk => self.chunk_calls.load(Ordering::SeqCst),
            RenderMode::Full => self.full_calls.load(Ordering::SeqCst),
        }
    }

    fn render(&self, mode: RenderMode) -> &FakeRender {
        match mode {
            RenderMode::Chunk => &self.chunk,
            RenderMode::Full => &self.full,
        }
    }

    fn render_mut(&mut self, mode: RenderMode) -> &mut FakeRender {
        match mode {
            RenderMode::Chunk => &mut self.chunk,
            RenderMode::Full => &mut self.full,
        }
    }
}

#[async_trait]
impl ContentFetchPort for FakeContentFetcher {
    async fn fetch_audio(
        &self,
        content: &ContentRef,
        mode: RenderMode,
    ) -> Result<Vec<u8>, FetchError> {
        match mode {
            RenderMode::Chunk => self.chunk_calls.fetch_add(1, Ordering::SeqCst),
            RenderMode::Full => self.full_calls.fetch_add(1, Ordering::SeqCst),
        };

        let render = self.render(mode);
        tracing::debug!(
            content = %content,
            mode = %mode,
            delay_ms = render.delay.as_millis() as u64,
            "FakeContentFetcher: returning fixed audio"
        );

        if !render.delay.is_zero() {
            tokio::time::sleep(render.delay).await;
        }

        match &render.response {
            FakeResponse::Audio(bytes) => Ok(bytes.clone()),
            FakeResponse::Fail(message) => Err(FetchError::ServiceError(message.clone())),
        }
    }
}
