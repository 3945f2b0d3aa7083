//! Segment Loader - 单个片段的获取、落盘与加载
//!
//! fetch bytes -> 写入临时文件 -> 构造已加载但未播放的平台句柄

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::application::ports::{
    AudioError, AudioPrimitivePort, ContentFetchPort, FetchError, NativeHandle, ScratchError,
    ScratchStoragePort,
};
use crate::domain::playback::{ContentRef, ErrorKind, LoadCause, RenderMode, SegmentKind};

/// 片段加载错误
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Audio decode failed: {0}")]
    Decode(String),

    #[error("Scratch write failed: {0}")]
    Io(String),

    #[error("Native audio load failed: {0}")]
    NativeLoad(String),

    #[error("Load cancelled")]
    Cancelled,
}

impl LoadError {
    /// 对 UI 暴露的错误分类，取消不属于错误
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Fetch(_) => Some(ErrorKind::Fetch),
            Self::Decode(_) => Some(ErrorKind::Decode),
            Self::Io(_) => Some(ErrorKind::Io),
            Self::NativeLoad(_) => Some(ErrorKind::NativeLoad),
            Self::Cancelled => None,
        }
    }

    pub fn cause(&self) -> Option<LoadCause> {
        match self {
            Self::Fetch(_) => Some(LoadCause::Network),
            Self::Decode(_) | Self::NativeLoad(_) => Some(LoadCause::Decode),
            Self::Io(_) => Some(LoadCause::Io),
            Self::Cancelled => None,
        }
    }
}

impl From<FetchError> for LoadError {
    fn from(err: FetchError) -> Self {
        Self::Fetch(err.to_string())
    }
}

impl From<ScratchError> for LoadError {
    fn from(err: ScratchError) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<AudioError> for LoadError {
    fn from(err: AudioError) -> Self {
        match err {
            AudioError::Decode(msg) => Self::Decode(msg),
            AudioError::Io(msg) => Self::Io(msg),
            other => Self::NativeLoad(other.to_string()),
        }
    }
}

/// 可播放的片段句柄
#[derive(Debug, Clone)]
pub struct SegmentHandle {
    pub session_id: Uuid,
    pub kind: SegmentKind,
    pub native: NativeHandle,
    pub path: PathBuf,
    pub duration_ms: u64,
    pub size_bytes: usize,
}

/// 片段加载器
pub struct SegmentLoader {
    fetcher: Arc<dyn ContentFetchPort>,
    storage: Arc<dyn ScratchStoragePort>,
    audio: Arc<dyn AudioPrimitivePort>,
}

impl SegmentLoader {
    pub fn new(
        fetcher: Arc<dyn ContentFetchPort>,
        storage: Arc<dyn ScratchStoragePort>,
        audio: Arc<dyn AudioPrimitivePort>,
    ) -> Self {
        Self {
            fetcher,
            storage,
            audio,
        }
    }

    /// 加载一个片段
    ///
    /// 每次调用恰好返回一个句柄或一个错误；被取消的加载不会交付句柄，
    /// 途中产生的临时文件和平台句柄都会被释放
    pub async fn load(
        &self,
        session_id: Uuid,
        content: &ContentRef,
        mode: RenderMode,
        cancel: &CancellationToken,
    ) -> Result<SegmentHandle, LoadError> {
        tracing::debug!(
            session_id = %session_id,
            content = %content,
            mode = %mode,
            "Loading segment"
        );

        let bytes = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(LoadError::Cancelled),
            result = self.fetcher.fetch_audio(content, mode) => result?,
        };

        if bytes.is_empty() {
            return Err(LoadError::Decode("empty audio payload".to_string()));
        }
        if cancel.is_cancelled() {
            return Err(LoadError::Cancelled);
        }

        let size_bytes = bytes.len();
        let path = self.storage.write_segment(session_id, mode, &bytes).await?;
        drop(bytes);

        if cancel.is_cancelled() {
            self.discard_file(session_id, mode).await;
            return Err(LoadError::Cancelled);
        }

        let native = match self.audio.load(&path).await {
            Ok(handle) => handle,
            Err(e) => {
                self.discard_file(session_id, mode).await;
                return Err(e.into());
            }
        };

        if cancel.is_cancelled() {
            self.unload_quietly(native).await;
            self.discard_file(session_id, mode).await;
            return Err(LoadError::Cancelled);
        }

        let duration_ms = match self.audio.status(native).await {
            Ok(status) => status.duration_ms,
            Err(e) => {
                self.unload_quietly(native).await;
                self.discard_file(session_id, mode).await;
                return Err(LoadError::NativeLoad(e.to_string()));
            }
        };

        tracing::info!(
            session_id = %session_id,
            mode = %mode,
            handle = %native,
            duration_ms = duration_ms,
            size_bytes = size_bytes,
            "Segment loaded"
        );

        Ok(SegmentHandle {
            session_id,
            kind: mode,
            native,
            path,
            duration_ms,
            size_bytes,
        })
    }

    /// 释放不再需要的句柄：卸载平台对象并删除其临时文件
    pub async fn release(&self, handle: SegmentHandle) {
        self.unload_quietly(handle.native).await;
        self.discard_file(handle.session_id, handle.kind).await;
    }

    /// 释放已失效会话的句柄，顺带清理该会话的临时目录
    pub async fn release_orphan(&self, handle: SegmentHandle) {
        let session_id = handle.session_id;
        self.release(handle).await;
        self.discard_session(session_id).await;
    }

    /// 删除已失效会话的整个临时目录
    pub async fn discard_session(&self, session_id: Uuid) {
        if let Err(e) = self.storage.delete_session(session_id).await {
            tracing::debug!(session_id = %session_id, error = %e, "Failed to remove orphan scratch dir");
        }
    }

    async fn unload_quietly(&self, native: NativeHandle) {
        if let Err(e) = self.audio.unload(native).await {
            tracing::debug!(handle = %native, error = %e, "Unload failed, ignoring");
        }
    }

    async fn discard_file(&self, session_id: Uuid, mode: RenderMode) {
        if let Err(e) = self.storage.delete_segment(session_id, mode).await {
            tracing::warn!(
                session_id = %session_id,
                mode = %mode,
                error = %e,
                "Failed to delete scratch file"
            );
        }
    }
}
