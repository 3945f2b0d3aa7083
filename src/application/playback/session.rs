//! Playback Session - 单次渐进式播放请求
//!
//! 会话独占 chunk/full 两个片段槽位，是 "是否在播放 / 是否在加载 /
//! 哪个片段处于活动状态" 的唯一事实来源。所有修改都发生在播放器的
//! 单个事件循环中

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::events::SessionEvent;
use super::position_tracker::PositionTracker;
use super::segment_loader::{LoadError, SegmentHandle, SegmentLoader};
use super::transition::{TransitionCoordinator, TransitionOutcome};
use crate::application::ports::{AudioPrimitivePort, NativeHandle, NativeStatus, ScratchStoragePort};
use crate::domain::playback::{
    ContentRef, ErrorKind, PlaybackState, PlaybackStatus, RenderMode, SegmentKind,
};
use crate::infrastructure::events::StatusPublisher;

/// 会话共享的依赖
#[derive(Clone)]
pub(crate) struct SessionContext {
    pub loader: Arc<SegmentLoader>,
    pub audio: Arc<dyn AudioPrimitivePort>,
    pub storage: Arc<dyn ScratchStoragePort>,
    pub publisher: Arc<StatusPublisher>,
    pub events: mpsc::UnboundedSender<SessionEvent>,
    pub tracker_interval: Duration,
}

/// 片段槽位
#[derive(Debug)]
pub(crate) enum SegmentSlot {
    Absent,
    Loading,
    Ready(SegmentHandle),
    Failed(ErrorKind),
}

impl SegmentSlot {
    pub(crate) fn handle(&self) -> Option<&SegmentHandle> {
        match self {
            Self::Ready(handle) => Some(handle),
            _ => None,
        }
    }

    pub(crate) fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub(crate) fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// 取出句柄，槽位回到 Absent
    pub(crate) fn take_handle(&mut self) -> Option<SegmentHandle> {
        match std::mem::replace(self, Self::Absent) {
            Self::Ready(handle) => Some(handle),
            other => {
                *self = other;
                None
            }
        }
    }
}

pub(crate) struct PlaybackSession {
    pub(super) id: Uuid,
    pub(super) content: ContentRef,
    pub(super) state: PlaybackState,
    pub(super) active: SegmentKind,
    pub(super) chunk: SegmentSlot,
    pub(super) full: SegmentSlot,
    pub(super) position_ms: u64,
    pub(super) duration_ms: u64,
    pub(super) pending_transition: bool,
    pub(super) error_kind: Option<ErrorKind>,
    pub(super) tracker: PositionTracker,
    pub(super) ctx: SessionContext,
    pub(super) cancel: CancellationToken,
    full_became_ready: bool,
    released: bool,
}

impl PlaybackSession {
    pub(crate) fn new(id: Uuid, content: ContentRef, ctx: SessionContext) -> Self {
        let tracker = PositionTracker::new(
            ctx.audio.clone(),
            ctx.events.clone(),
            ctx.tracker_interval,
        );
        Self {
            id,
            content,
            state: PlaybackState::Idle,
            active: SegmentKind::Chunk,
            chunk: SegmentSlot::Absent,
            full: SegmentSlot::Absent,
            position_ms: 0,
            duration_ms: 0,
            pending_transition: false,
            error_kind: None,
            tracker,
            ctx,
            cancel: CancellationToken::new(),
            full_became_ready: false,
            released: false,
        }
    }

    pub(crate) fn id(&self) -> Uuid {
        self.id
    }

    pub(crate) fn state(&self) -> PlaybackState {
        self.state
    }

    pub(crate) fn status(&self) -> PlaybackStatus {
        PlaybackStatus {
            state: self.state,
            active_segment: Some(self.active),
            position_ms: self.position_ms,
            duration_ms: self.duration_ms,
            error_kind: self.error_kind,
        }
    }

    // ------------------------------------------------------------------
    // 启动
    // ------------------------------------------------------------------

    /// 启动会话：hint 为 Chunk 走渐进式路径，为 Full 直接加载完整音频
    pub(crate) async fn begin(&mut self, hint: RenderMode) {
        tracing::info!(
            session_id = %self.id,
            content = %self.content,
            hint = %hint,
            "Playback session started"
        );

        match hint {
            SegmentKind::Chunk => {
                self.set_state(PlaybackState::LoadingChunk);
                self.spawn_load(SegmentKind::Chunk);
            }
            SegmentKind::Full => {
                self.active = SegmentKind::Full;
                self.set_state(PlaybackState::LoadingFull);
                self.spawn_load(SegmentKind::Full);
            }
        }
    }

    fn spawn_load(&mut self, mode: RenderMode) {
        *self.slot_mut(mode) = SegmentSlot::Loading;

        let loader = self.ctx.loader.clone();
        let events = self.ctx.events.clone();
        let content = self.content.clone();
        let cancel = self.cancel.child_token();
        let session_id = self.id;

        tokio::spawn(async move {
            let result = loader.load(session_id, &content, mode, &cancel).await;

            // 会话已被释放：结果不再交付，释放期间重新出现的临时文件也要清掉
            if cancel.is_cancelled() || matches!(result, Err(LoadError::Cancelled)) {
                tracing::debug!(session_id = %session_id, mode = %mode, "Segment load cancelled");
                match result {
                    Ok(handle) => loader.release_orphan(handle).await,
                    Err(_) => loader.discard_session(session_id).await,
                }
                return;
            }

            let event = SessionEvent::Loaded {
                session_id,
                mode,
                result,
            };
            if let Err(mpsc::error::SendError(event)) = events.send(event) {
                if let SessionEvent::Loaded {
                    result: Ok(handle), ..
                } = event
                {
                    loader.release_orphan(handle).await;
                }
            }
        });
    }

    // ------------------------------------------------------------------
    // 后台事件
    // ------------------------------------------------------------------

    pub(crate) async fn handle_event(&mut self, event: SessionEvent) {
        if self.released {
            return;
        }

        match event {
            SessionEvent::Loaded { mode, result, .. } => match (mode, result) {
                (SegmentKind::Chunk, Ok(handle)) => self.on_chunk_ready(handle).await,
                (SegmentKind::Chunk, Err(e)) => self.on_chunk_failed(e).await,
                (SegmentKind::Full, Ok(handle)) => self.on_full_ready(handle).await,
                (SegmentKind::Full, Err(e)) => self.on_full_failed(e),
            },
            SessionEvent::Tick {
                epoch,
                segment,
                status,
                ..
            } => self.on_tick(epoch, segment, status).await,
        }
    }

    async fn on_chunk_ready(&mut self, handle: SegmentHandle) {
        if self.state != PlaybackState::LoadingChunk {
            tracing::debug!(session_id = %self.id, state = %self.state, "Late chunk discarded");
            self.ctx.loader.release(handle).await;
            return;
        }

        let native = handle.native;
        self.duration_ms = handle.duration_ms;
        self.position_ms = 0;
        self.active = SegmentKind::Chunk;
        self.chunk = SegmentSlot::Ready(handle);

        if let Err(e) = self.ctx.audio.play(native).await {
            tracing::warn!(session_id = %self.id, error = %e, "Chunk playback failed, falling back to full asset");
            if let Some(handle) = self.chunk.take_handle() {
                self.ctx.loader.release(handle).await;
            }
            self.chunk = SegmentSlot::Failed(ErrorKind::NativeLoad);
            self.fall_back_to_full();
            return;
        }

        self.set_state(PlaybackState::PlayingChunk);
        self.tracker
            .start(self.id, SegmentKind::Chunk, native, &self.cancel);

        // 预览开始播放的同时在后台加载完整音频
        self.spawn_load(SegmentKind::Full);
    }

    async fn on_chunk_failed(&mut self, error: LoadError) {
        tracing::warn!(
            session_id = %self.id,
            cause = ?error.cause(),
            error = %error,
            "Chunk load failed, falling back to full asset"
        );
        self.chunk = SegmentSlot::Failed(error.kind().unwrap_or(ErrorKind::Fetch));

        if self.state == PlaybackState::LoadingChunk {
            self.fall_back_to_full();
        }
    }

    fn fall_back_to_full(&mut self) {
        self.active = SegmentKind::Full;
        self.position_ms = 0;
        self.duration_ms = 0;
        self.set_state(PlaybackState::LoadingFull);
        self.spawn_load(SegmentKind::Full);
    }

    async fn on_full_ready(&mut self, handle: SegmentHandle) {
        if self.full_became_ready {
            // 完整音频只会就绪一次，重复的结果只卸载平台句柄，文件属于已就绪的那个
            tracing::debug!(session_id = %self.id, "Duplicate full asset ignored");
            if let Err(e) = self.ctx.audio.unload(handle.native).await {
                tracing::debug!(session_id = %self.id, error = %e, "Unload failed, ignoring");
            }
            return;
        }

        if self.state.is_terminal() || self.state == PlaybackState::Idle {
            self.ctx.loader.release(handle).await;
            return;
        }

        self.full_became_ready = true;
        tracing::info!(
            session_id = %self.id,
            state = %self.state,
            duration_ms = handle.duration_ms,
            "Full asset ready"
        );
        self.full = SegmentSlot::Ready(handle);

        match self.state {
            PlaybackState::LoadingFull => self.play_full_directly().await,
            PlaybackState::WaitingForFull => {
                let outcome = TransitionCoordinator::transition(self).await;
                tracing::debug!(session_id = %self.id, outcome = ?outcome, "Pending transition resolved");
            }
            PlaybackState::PlayingChunk | PlaybackState::Paused if self.pending_transition => {
                let outcome = TransitionCoordinator::transition(self).await;
                tracing::debug!(session_id = %self.id, outcome = ?outcome, "Pending transition resolved");
            }
            _ => {
                // 等待预览片段自然结束后再切换
            }
        }
    }

    async fn play_full_directly(&mut self) {
        let Some((native, duration_ms)) = self.full.handle().map(|h| (h.native, h.duration_ms))
        else {
            return;
        };

        self.active = SegmentKind::Full;
        self.duration_ms = duration_ms;
        self.position_ms = 0;

        if let Err(e) = self.ctx.audio.play(native).await {
            tracing::error!(session_id = %self.id, error = %e, "Full asset playback failed");
            self.error_kind = Some(ErrorKind::NativeLoad);
            self.set_state(PlaybackState::Failed);
            return;
        }

        self.set_state(PlaybackState::PlayingFull);
        self.tracker
            .start(self.id, SegmentKind::Full, native, &self.cancel);
    }

    fn on_full_failed(&mut self, error: LoadError) {
        let kind = error.kind().unwrap_or(ErrorKind::Fetch);
        self.full = SegmentSlot::Failed(kind);

        match self.state {
            PlaybackState::LoadingFull => {
                tracing::error!(
                    session_id = %self.id,
                    cause = ?error.cause(),
                    error = %error,
                    "No playable audio for session"
                );
                self.error_kind = Some(kind);
                self.set_state(PlaybackState::Failed);
            }
            PlaybackState::WaitingForFull => {
                tracing::warn!(
                    session_id = %self.id,
                    error = %error,
                    "Full asset failed after chunk finished, ending playback"
                );
                self.pending_transition = false;
                self.tracker.stop();
                self.set_state(PlaybackState::Ended);
            }
            PlaybackState::PlayingChunk | PlaybackState::Paused => {
                tracing::warn!(
                    session_id = %self.id,
                    error = %error,
                    "Full asset failed, staying on chunk"
                );
                self.pending_transition = false;
            }
            _ => {
                tracing::debug!(session_id = %self.id, state = %self.state, error = %error, "Full asset failure ignored");
            }
        }
    }

    async fn on_tick(&mut self, epoch: u64, segment: SegmentKind, status: NativeStatus) {
        if !self.tracker.is_current(epoch) || segment != self.active {
            return;
        }

        self.position_ms = status.position_ms;
        if status.duration_ms > 0 {
            self.duration_ms = status.duration_ms;
        }
        self.publish();

        if status.did_just_finish {
            self.on_segment_finished(segment).await;
        }
    }

    async fn on_segment_finished(&mut self, segment: SegmentKind) {
        self.tracker.stop();

        match segment {
            SegmentKind::Chunk => {
                if self.state != PlaybackState::PlayingChunk {
                    return;
                }
                if self.full.is_ready() {
                    let outcome = TransitionCoordinator::transition(self).await;
                    tracing::debug!(session_id = %self.id, outcome = ?outcome, "Chunk finished, handed off");
                } else if self.full.is_loading() {
                    tracing::info!(session_id = %self.id, "Chunk finished, waiting for full asset");
                    self.pending_transition = true;
                    self.set_state(PlaybackState::WaitingForFull);
                } else {
                    tracing::info!(session_id = %self.id, "Chunk finished without full asset, playback complete");
                    self.set_state(PlaybackState::Ended);
                }
            }
            SegmentKind::Full => {
                if self.state == PlaybackState::PlayingFull {
                    self.position_ms = self.duration_ms;
                    tracing::info!(session_id = %self.id, "Playback finished");
                    self.set_state(PlaybackState::Ended);
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // 用户操作
    // ------------------------------------------------------------------

    pub(crate) async fn pause(&mut self) {
        if !self.state.is_playing() {
            tracing::debug!(session_id = %self.id, state = %self.state, "Pause ignored");
            return;
        }
        let Some(native) = self.active_native() else {
            return;
        };

        if let Err(e) = self.ctx.audio.pause(native).await {
            tracing::debug!(session_id = %self.id, error = %e, "Pause failed, ignoring");
            return;
        }
        self.tracker.stop();

        let status = self.ctx.audio.status(native).await.ok();
        if let Some(status) = status {
            self.position_ms = status.position_ms;

            // 片段在两次轮询之间播完：完成信号只报告一次，这里必须接住
            if status.did_just_finish {
                tracing::debug!(
                    session_id = %self.id,
                    segment = %self.active,
                    "Segment finished before pause"
                );
                self.publish();
                self.on_segment_finished(self.active).await;

                // 已切换到完整音频并开始播放时，暂停作用在完整音频上
                if self.state == PlaybackState::PlayingFull {
                    self.pause_full_after_transition().await;
                }
                return;
            }
        }

        self.set_state(PlaybackState::Paused);
    }

    async fn pause_full_after_transition(&mut self) {
        let Some(native) = self.active_native() else {
            return;
        };
        if let Err(e) = self.ctx.audio.pause(native).await {
            tracing::debug!(session_id = %self.id, error = %e, "Pause failed, ignoring");
            return;
        }
        self.tracker.stop();
        if let Ok(status) = self.ctx.audio.status(native).await {
            self.position_ms = status.position_ms;
        }
        self.set_state(PlaybackState::Paused);
    }

    pub(crate) async fn resume(&mut self) {
        if self.state != PlaybackState::Paused {
            tracing::debug!(session_id = %self.id, state = %self.state, "Resume ignored");
            return;
        }
        if self.chunk_exhausted() {
            self.resume_at_chunk_end().await;
            return;
        }
        let Some(native) = self.active_native() else {
            return;
        };

        if let Err(e) = self.ctx.audio.play(native).await {
            tracing::debug!(session_id = %self.id, error = %e, "Resume failed, ignoring");
            return;
        }

        let next = match self.active {
            SegmentKind::Chunk => PlaybackState::PlayingChunk,
            SegmentKind::Full => PlaybackState::PlayingFull,
        };
        self.set_state(next);
        self.tracker.start(self.id, self.active, native, &self.cancel);
    }

    /// 预览片段已停在结尾（暂停时被跳转夹到结尾），恢复播放等同于预览播完，
    /// 不能让平台对象从头重播
    async fn resume_at_chunk_end(&mut self) {
        if self.full.is_ready() {
            self.set_state(PlaybackState::PlayingChunk);
            let outcome = TransitionCoordinator::transition(self).await;
            tracing::debug!(session_id = %self.id, outcome = ?outcome, "Resumed at chunk end");
        } else if self.full.is_loading() {
            tracing::info!(session_id = %self.id, "Resumed at chunk end, waiting for full asset");
            self.pending_transition = true;
            self.set_state(PlaybackState::WaitingForFull);
        } else {
            tracing::info!(session_id = %self.id, "Resumed at chunk end without full asset, playback complete");
            self.set_state(PlaybackState::Ended);
        }
    }

    /// 在活动片段内跳转
    ///
    /// 预览片段只能在自身时长内跳转，超出时：完整音频已就绪则提前切换后
    /// 再把目标位置作用到完整音频上；否则夹到预览结尾并挂起切换
    pub(crate) async fn seek(&mut self, target_ms: u64) {
        if !(self.state.is_playing() || self.state == PlaybackState::Paused) {
            tracing::debug!(session_id = %self.id, state = %self.state, "Seek ignored");
            return;
        }

        match self.active {
            SegmentKind::Chunk => self.seek_chunk(target_ms).await,
            SegmentKind::Full => self.seek_full(target_ms).await,
        }
    }

    async fn seek_chunk(&mut self, target_ms: u64) {
        let Some((native, bound)) = self.chunk.handle().map(|h| (h.native, h.duration_ms)) else {
            return;
        };

        if target_ms < bound {
            if let Err(e) = self.ctx.audio.seek(native, target_ms).await {
                tracing::debug!(session_id = %self.id, error = %e, "Seek failed, ignoring");
                return;
            }
            self.position_ms = target_ms;
            self.publish();
            return;
        }

        if self.full.is_ready() {
            tracing::debug!(session_id = %self.id, target_ms = target_ms, "Seek past chunk, transitioning early");
            if TransitionCoordinator::transition(self).await == TransitionOutcome::Completed {
                self.seek_full(target_ms).await;
            }
            return;
        }

        if let Err(e) = self.ctx.audio.seek(native, bound).await {
            tracing::debug!(session_id = %self.id, error = %e, "Seek failed, ignoring");
            return;
        }
        self.position_ms = bound;
        if self.full.is_loading() {
            self.pending_transition = true;
        }
        tracing::debug!(
            session_id = %self.id,
            target_ms = target_ms,
            clamped_ms = bound,
            pending = self.pending_transition,
            "Seek clamped to chunk end"
        );
        self.publish();
    }

    async fn seek_full(&mut self, target_ms: u64) {
        let Some((native, duration_ms)) = self.full.handle().map(|h| (h.native, h.duration_ms))
        else {
            return;
        };

        let target_ms = target_ms.min(duration_ms);
        if let Err(e) = self.ctx.audio.seek(native, target_ms).await {
            tracing::debug!(session_id = %self.id, error = %e, "Seek failed, ignoring");
            return;
        }
        self.position_ms = target_ms;
        self.publish();
    }

    /// 释放会话：取消加载、停止轮询、卸载两个片段并删除临时文件
    pub(crate) async fn dispose(&mut self, reason: &str) {
        if self.released {
            return;
        }
        self.released = true;
        self.cancel.cancel();
        self.tracker.stop();
        self.pending_transition = false;

        for slot in [&mut self.chunk, &mut self.full] {
            if let Some(handle) = slot.take_handle() {
                if let Err(e) = self.ctx.audio.pause(handle.native).await {
                    tracing::debug!(handle = %handle.native, error = %e, "Pause on dispose failed");
                }
                if let Err(e) = self.ctx.audio.unload(handle.native).await {
                    tracing::debug!(handle = %handle.native, error = %e, "Unload on dispose failed");
                }
            }
        }

        match self.ctx.storage.delete_session(self.id).await {
            Ok(files) => {
                tracing::debug!(session_id = %self.id, files = files, "Scratch files removed")
            }
            Err(e) => {
                tracing::warn!(session_id = %self.id, error = %e, "Failed to remove scratch files")
            }
        }

        self.set_state(PlaybackState::Ended);
        self.ctx.publisher.publish_session_closed(self.id, reason);
        tracing::info!(session_id = %self.id, reason = %reason, "Playback session disposed");
    }

    // ------------------------------------------------------------------
    // 内部工具
    // ------------------------------------------------------------------

    fn slot_mut(&mut self, segment: SegmentKind) -> &mut SegmentSlot {
        match segment {
            SegmentKind::Chunk => &mut self.chunk,
            SegmentKind::Full => &mut self.full,
        }
    }

    /// 预览片段是活动片段并且位置已在其结尾
    fn chunk_exhausted(&self) -> bool {
        self.active == SegmentKind::Chunk
            && self
                .chunk
                .handle()
                .is_some_and(|h| self.position_ms >= h.duration_ms)
    }

    fn active_native(&self) -> Option<NativeHandle> {
        let slot = match self.active {
            SegmentKind::Chunk => &self.chunk,
            SegmentKind::Full => &self.full,
        };
        slot.handle().map(|h| h.native)
    }

    /// 状态迁移并发布；非法迁移只记录不生效
    pub(super) fn set_state(&mut self, next: PlaybackState) {
        if !self.state.can_transition_to(next) {
            tracing::warn!(
                session_id = %self.id,
                from = %self.state,
                to = %next,
                "Illegal state transition rejected"
            );
            return;
        }
        if self.state != next {
            tracing::debug!(session_id = %self.id, from = %self.state, to = %next, "State changed");
        }
        self.state = next;
        self.publish();
    }

    pub(super) fn publish(&self) {
        self.ctx.publisher.publish_status(self.id, self.status());
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
