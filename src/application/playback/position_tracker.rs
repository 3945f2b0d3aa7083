//! Position Tracker - 活动片段的位置轮询
//!
//! 播放期间按固定间隔查询平台状态，并把结果作为 Tick 事件送回播放器。
//! 每次启动分配一个新的 epoch，播放器只接受当前 epoch 的 Tick

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::events::SessionEvent;
use crate::application::ports::{AudioError, AudioPrimitivePort, NativeHandle};
use crate::domain::playback::SegmentKind;

/// 默认轮询间隔
pub const DEFAULT_TRACKER_INTERVAL: Duration = Duration::from_millis(500);

struct TrackerRun {
    epoch: u64,
    segment: SegmentKind,
    cancel: CancellationToken,
}

pub(crate) struct PositionTracker {
    audio: Arc<dyn AudioPrimitivePort>,
    events: mpsc::UnboundedSender<SessionEvent>,
    interval: Duration,
    next_epoch: u64,
    current: Option<TrackerRun>,
}

impl PositionTracker {
    pub(crate) fn new(
        audio: Arc<dyn AudioPrimitivePort>,
        events: mpsc::UnboundedSender<SessionEvent>,
        interval: Duration,
    ) -> Self {
        Self {
            audio,
            events,
            interval,
            next_epoch: 0,
            current: None,
        }
    }

    /// 开始轮询指定片段，已有的轮询会先停止
    pub(crate) fn start(
        &mut self,
        session_id: Uuid,
        segment: SegmentKind,
        handle: NativeHandle,
        parent: &CancellationToken,
    ) {
        self.stop();

        self.next_epoch += 1;
        let epoch = self.next_epoch;
        let cancel = parent.child_token();

        tokio::spawn(poll_loop(
            self.audio.clone(),
            self.events.clone(),
            self.interval,
            session_id,
            epoch,
            segment,
            handle,
            cancel.clone(),
        ));

        tracing::trace!(session_id = %session_id, segment = %segment, epoch = epoch, "Tracker started");
        self.current = Some(TrackerRun {
            epoch,
            segment,
            cancel,
        });
    }

    pub(crate) fn stop(&mut self) {
        if let Some(run) = self.current.take() {
            run.cancel.cancel();
            tracing::trace!(segment = %run.segment, epoch = run.epoch, "Tracker stopped");
        }
    }

    pub(crate) fn is_current(&self, epoch: u64) -> bool {
        self.current.as_ref().is_some_and(|run| run.epoch == epoch)
    }
}

impl Drop for PositionTracker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[allow(clippy::too_many_arguments)]
async fn poll_loop(
    audio: Arc<dyn AudioPrimitivePort>,
    events: mpsc::UnboundedSender<SessionEvent>,
    interval: Duration,
    session_id: Uuid,
    epoch: u64,
    segment: SegmentKind,
    handle: NativeHandle,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let status = match audio.status(handle).await {
            Ok(status) => status,
            Err(AudioError::NotLoaded(_)) => break,
            Err(e) => {
                tracing::debug!(session_id = %session_id, handle = %handle, error = %e, "Status poll failed");
                continue;
            }
        };

        if cancel.is_cancelled() {
            break;
        }

        let finished = status.did_just_finish;
        let event = SessionEvent::Tick {
            session_id,
            epoch,
            segment,
            status,
        };
        if events.send(event).is_err() || finished {
            break;
        }
    }
}
