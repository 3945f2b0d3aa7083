//! Scratch Storage Port - 出站端口
//!
//! 每个会话每个片段一个临时音频文件，路径按 session + segment 唯一

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::playback::SegmentKind;

/// 临时存储错误
#[derive(Debug, Error)]
pub enum ScratchError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Scratch Storage Port
#[async_trait]
pub trait ScratchStoragePort: Send + Sync {
    /// 获取会话的临时目录
    fn session_dir(&self, session_id: Uuid) -> PathBuf;

    /// 获取片段文件路径
    fn segment_path(&self, session_id: Uuid, segment: SegmentKind) -> PathBuf;

    /// 写入片段音频，写入完成后才返回路径
    async fn write_segment(
        &self,
        session_id: Uuid,
        segment: SegmentKind,
        data: &[u8],
    ) -> Result<PathBuf, ScratchError>;

    /// 删除片段文件（不存在时视为成功）
    async fn delete_segment(
        &self,
        session_id: Uuid,
        segment: SegmentKind,
    ) -> Result<(), ScratchError>;

    /// 删除会话的所有临时文件，返回删除的文件数
    async fn delete_session(&self, session_id: Uuid) -> Result<u64, ScratchError>;

    /// 检查片段文件是否存在
    async fn segment_exists(&self, session_id: Uuid, segment: SegmentKind) -> bool;
}
