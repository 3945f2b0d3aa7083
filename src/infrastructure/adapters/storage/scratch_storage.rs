//! File Scratch Storage - 文件系统临时片段存储
//!
//! 实现 ScratchStoragePort trait
//!
//! 目录布局: `<base_dir>/<session_id>/<chunk|full>.audio`

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use crate::application::ports::{ScratchError, ScratchStoragePort};
use crate::domain::playback::SegmentKind;

const SEGMENT_EXTENSION: &str = "audio";
const PARTIAL_EXTENSION: &str = "part";

/// 文件系统临时存储
pub struct FileScratchStorage {
    /// 存储根目录
    base_dir: PathBuf,
}

impl FileScratchStorage {
    /// 创建新的临时存储
    pub async fn new(base_dir: impl AsRef<Path>) -> Result<Self, ScratchError> {
        let base_dir = base_dir.as_ref().to_path_buf();

        // 确保目录存在
        fs::create_dir_all(&base_dir)
            .await
            .map_err(|e| ScratchError::IoError(e.to_string()))?;

        Ok(Self { base_dir })
    }

    /// 获取存储根目录
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn partial_path(&self, session_id: Uuid, segment: SegmentKind) -> PathBuf {
        self.segment_path(session_id, segment)
            .with_extension(PARTIAL_EXTENSION)
    }
}

#[async_trait]
impl ScratchStoragePort for FileScratchStorage {
    fn session_dir(&self, session_id: Uuid) -> PathBuf {
        self.base_dir.join(session_id.to_string())
    }

    fn segment_path(&self, session_id: Uuid, segment: SegmentKind) -> PathBuf {
        self.session_dir(session_id)
            .join(format!("{}.{}", segment.as_str(), SEGMENT_EXTENSION))
    }

    async fn write_segment(
        &self,
        session_id: Uuid,
        segment: SegmentKind,
        data: &[u8],
    ) -> Result<PathBuf, ScratchError> {
        let session_dir = self.session_dir(session_id);

        fs::create_dir_all(&session_dir)
            .await
            .map_err(|e| ScratchError::IoError(e.to_string()))?;

        // 先写 .part 再改名，被引用的路径上不会出现写了一半的文件
        let partial = self.partial_path(session_id, segment);
        let path = self.segment_path(session_id, segment);

        fs::write(&partial, data)
            .await
            .map_err(|e| ScratchError::IoError(e.to_string()))?;
        if let Err(e) = fs::rename(&partial, &path).await {
            let _ = fs::remove_file(&partial).await;
            return Err(ScratchError::IoError(e.to_string()));
        }

        tracing::debug!(
            session_id = %session_id,
            segment = %segment,
            size_bytes = data.len(),
            "Scratch segment written"
        );

        Ok(path)
    }

    async fn delete_segment(
        &self,
        session_id: Uuid,
        segment: SegmentKind,
    ) -> Result<(), ScratchError> {
        let path = self.segment_path(session_id, segment);

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(session_id = %session_id, segment = %segment, "Scratch segment deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ScratchError::IoError(e.to_string())),
        }
    }

    async fn delete_session(&self, session_id: Uuid) -> Result<u64, ScratchError> {
        let session_dir = self.session_dir(session_id);

        let mut entries = match fs::read_dir(&session_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(ScratchError::IoError(e.to_string())),
        };

        let mut deleted_count = 0u64;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ScratchError::IoError(e.to_string()))?
        {
            let path = entry.path();
            let is_scratch = path
                .extension()
                .is_some_and(|ext| ext == SEGMENT_EXTENSION || ext == PARTIAL_EXTENSION);
            if is_scratch {
                fs::remove_file(&path)
                    .await
                    .map_err(|e| ScratchError::IoError(e.to_string()))?;
                deleted_count += 1;
            }
        }

        // 尝试删除空目录
        let _ = fs::remove_dir(&session_dir).await;

        tracing::debug!(
            session_id = %session_id,
            files = deleted_count,
            "Scratch session deleted"
        );

        Ok(deleted_count)
    }

    async fn segment_exists(&self, session_id: Uuid, segment: SegmentKind) -> bool {
        fs::try_exists(self.segment_path(session_id, segment))
            .await
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_write_and_delete_segment() {
        let temp_dir = tempdir().unwrap();
        let storage = FileScratchStorage::new(temp_dir.path()).await.unwrap();
        let session_id = Uuid::new_v4();

        let path = storage
            .write_segment(session_id, SegmentKind::Chunk, b"fake audio")
            .await
            .unwrap();
        assert_eq!(path, storage.segment_path(session_id, SegmentKind::Chunk));
        assert!(path.ends_with("chunk.audio"));
        assert_eq!(std::fs::read(&path).unwrap(), b"fake audio");
        assert!(storage.segment_exists(session_id, SegmentKind::Chunk).await);
        assert!(!storage.segment_exists(session_id, SegmentKind::Full).await);

        // 写入完成后不留 .part 文件
        assert!(!path.with_extension("part").exists());

        storage
            .delete_segment(session_id, SegmentKind::Chunk)
            .await
            .unwrap();
        assert!(!storage.segment_exists(session_id, SegmentKind::Chunk).await);
    }

    #[tokio::test]
    async fn test_delete_missing_segment_is_ok() {
        let temp_dir = tempdir().unwrap();
        let storage = FileScratchStorage::new(temp_dir.path()).await.unwrap();

        storage
            .delete_segment(Uuid::new_v4(), SegmentKind::Full)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_session() {
        let temp_dir = tempdir().unwrap();
        let storage = FileScratchStorage::new(temp_dir.path()).await.unwrap();
        let session_id = Uuid::new_v4();
        let other_session = Uuid::new_v4();

        for segment in [SegmentKind::Chunk, SegmentKind::Full] {
            storage
                .write_segment(session_id, segment, b"data")
                .await
                .unwrap();
        }
        storage
            .write_segment(other_session, SegmentKind::Chunk, b"data")
            .await
            .unwrap();

        let deleted = storage.delete_session(session_id).await.unwrap();
        assert_eq!(deleted, 2);
        assert!(!storage.session_dir(session_id).exists());

        // 其他会话不受影响
        assert!(storage.segment_exists(other_session, SegmentKind::Chunk).await);

        // 再次删除返回 0
        assert_eq!(storage.delete_session(session_id).await.unwrap(), 0);
    }
}
