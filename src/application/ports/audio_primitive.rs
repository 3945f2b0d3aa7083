//! Audio Primitive Port - 平台音频对象抽象
//!
//! 对平台音频对象的薄封装：加载、播放、暂停、跳转、轮询状态、卸载。
//! 所有调用都是异步的，并且可能各自独立失败

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// 平台音频错误
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Audio decode failed: {0}")]
    Decode(String),

    #[error("Native audio load failed: {0}")]
    Load(String),

    #[error("Audio handle not loaded: {0}")]
    NotLoaded(NativeHandle),

    #[error("IO error: {0}")]
    Io(String),
}

/// 平台音频对象句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeHandle(u64);

impl NativeHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for NativeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sound-{}", self.0)
    }
}

/// 平台音频状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NativeStatus {
    pub is_loaded: bool,
    pub is_playing: bool,
    pub position_ms: u64,
    pub duration_ms: u64,
    /// 仅在播放到结尾后的第一次状态查询中为 true
    pub did_just_finish: bool,
}

/// Audio Primitive Port
#[async_trait]
pub trait AudioPrimitivePort: Send + Sync {
    /// 从已写入的临时文件加载音频，返回已初始化但未开始播放的句柄
    async fn load(&self, path: &Path) -> Result<NativeHandle, AudioError>;

    async fn play(&self, handle: NativeHandle) -> Result<(), AudioError>;

    async fn pause(&self, handle: NativeHandle) -> Result<(), AudioError>;

    async fn seek(&self, handle: NativeHandle, position_ms: u64) -> Result<(), AudioError>;

    async fn status(&self, handle: NativeHandle) -> Result<NativeStatus, AudioError>;

    async fn unload(&self, handle: NativeHandle) -> Result<(), AudioError>;
}
