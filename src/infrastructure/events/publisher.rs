//! Event Publisher Implementation
//!
//! 播放状态流：broadcast 推送事件给 WebSocket 等订阅者，watch 保存最新快照

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use uuid::Uuid;

use crate::domain::playback::PlaybackStatus;

/// 播放器事件类型
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum PlayerEvent {
    /// 状态变化或位置轮询
    StatusChanged {
        session_id: Uuid,
        status: PlaybackStatus,
    },
    /// 会话被释放
    SessionClosed {
        session_id: Uuid,
        reason: String,
    },
}

/// 事件发布器
///
/// 每个播放器实例一个
pub struct StatusPublisher {
    channel: broadcast::Sender<PlayerEvent>,
    latest: watch::Sender<PlaybackStatus>,
}

impl StatusPublisher {
    pub fn new() -> Self {
        let (channel, _) = broadcast::channel(256);
        let (latest, _) = watch::channel(PlaybackStatus::default());
        Self { channel, latest }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 订阅事件流
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.channel.subscribe()
    }

    /// 订阅最新状态
    pub fn watch(&self) -> watch::Receiver<PlaybackStatus> {
        self.latest.subscribe()
    }

    /// 最新状态快照
    pub fn latest(&self) -> PlaybackStatus {
        self.latest.borrow().clone()
    }

    /// 发布状态
    pub fn publish_status(&self, session_id: Uuid, status: PlaybackStatus) {
        self.latest.send_replace(status.clone());
        self.send(PlayerEvent::StatusChanged { session_id, status });
    }

    /// 发布会话关闭事件
    pub fn publish_session_closed(&self, session_id: Uuid, reason: &str) {
        self.send(PlayerEvent::SessionClosed {
            session_id,
            reason: reason.to_string(),
        });
    }

    fn send(&self, event: PlayerEvent) {
        if let Err(e) = self.channel.send(event) {
            tracing::trace!(error = %e, "Failed to publish player event (no receivers)");
        }
    }
}

impl Default for StatusPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::playback::{PlaybackState, SegmentKind};

    #[tokio::test]
    async fn test_publish_updates_snapshot_and_stream() {
        let publisher = StatusPublisher::new();
        let mut rx = publisher.subscribe();
        let session_id = Uuid::new_v4();

        let status = PlaybackStatus {
            state: PlaybackState::PlayingChunk,
            active_segment: Some(SegmentKind::Chunk),
            position_ms: 500,
            duration_ms: 2000,
            error_kind: None,
        };
        publisher.publish_status(session_id, status.clone());

        assert_eq!(publisher.latest(), status);
        match rx.recv().await.unwrap() {
            PlayerEvent::StatusChanged { session_id: id, status: s } => {
                assert_eq!(id, session_id);
                assert_eq!(s.position_ms, 500);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_publish_without_receivers_is_silent() {
        let publisher = StatusPublisher::new();
        publisher.publish_session_closed(Uuid::new_v4(), "stopped");
        assert_eq!(publisher.latest().state, PlaybackState::Idle);
    }

    #[test]
    fn test_event_json_shape() {
        let event = PlayerEvent::SessionClosed {
            session_id: Uuid::nil(),
            reason: "stopped".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "SessionClosed");
        assert_eq!(json["data"]["reason"], "stopped");
    }
}
