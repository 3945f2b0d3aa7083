//! Session Events - 后台任务回送给播放器的事件
//!
//! 所有事件都带 session_id，播放器据此丢弃已失效会话的结果

use uuid::Uuid;

use super::segment_loader::{LoadError, SegmentHandle};
use crate::application::ports::NativeStatus;
use crate::domain::playback::{RenderMode, SegmentKind};

#[derive(Debug)]
pub(crate) enum SessionEvent {
    /// 片段加载完成（成功或失败）
    Loaded {
        session_id: Uuid,
        mode: RenderMode,
        result: Result<SegmentHandle, LoadError>,
    },
    /// 位置轮询
    Tick {
        session_id: Uuid,
        epoch: u64,
        segment: SegmentKind,
        status: NativeStatus,
    },
}

impl SessionEvent {
    pub(crate) fn session_id(&self) -> Uuid {
        match self {
            Self::Loaded { session_id, .. } | Self::Tick { session_id, .. } => *session_id,
        }
    }
}
