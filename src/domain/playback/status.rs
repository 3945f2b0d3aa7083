//! Playback Context - 状态快照

use serde::{Deserialize, Serialize};

use super::{ErrorKind, PlaybackState, SegmentKind};

/// 播放状态快照
///
/// 每次状态变化和每次位置轮询都会发布一份，UI 只读取它而不直接访问内部
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PlaybackStatus {
    pub state: PlaybackState,
    /// 当前提供位置/时长的片段，没有会话时为 None
    pub active_segment: Option<SegmentKind>,
    pub position_ms: u64,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl PlaybackStatus {
    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }
}
