//! Transition Coordinator - 从预览片段切换到完整音频
//!
//! 在预览片段当前的位置上接续完整音频，切换前后位置不回退到 0，
//! 任一时刻至多一个片段处于播放状态

use super::session::PlaybackSession;
use crate::domain::playback::{ErrorKind, PlaybackState, SegmentKind};

/// 切换结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransitionOutcome {
    /// 已切换到完整音频
    Completed,
    /// 完整音频尚未就绪，已挂起
    Deferred,
    /// 已经在完整音频上
    AlreadyTransitioned,
    /// 完整音频比预览位置还短，已夹到结尾并结束
    Inconsistent,
    /// 完整音频无法播放
    Failed,
}

pub(crate) struct TransitionCoordinator;

impl TransitionCoordinator {
    pub(crate) async fn transition(session: &mut PlaybackSession) -> TransitionOutcome {
        if session.active == SegmentKind::Full {
            return TransitionOutcome::AlreadyTransitioned;
        }

        let Some((full_native, full_duration)) =
            session.full.handle().map(|h| (h.native, h.duration_ms))
        else {
            session.pending_transition = true;
            tracing::debug!(session_id = %session.id, "Full asset not ready, transition deferred");
            return TransitionOutcome::Deferred;
        };

        let paused = session.state == PlaybackState::Paused;
        let resume_at = Self::chunk_position(session).await;

        // 先停掉预览片段，保证不会与完整音频同时发声
        session.tracker.stop();
        if let Some(chunk) = session.chunk.take_handle() {
            if let Err(e) = session.ctx.audio.pause(chunk.native).await {
                tracing::debug!(session_id = %session.id, error = %e, "Chunk pause failed");
            }
            session.ctx.loader.release(chunk).await;
        }

        session.active = SegmentKind::Full;
        session.pending_transition = false;
        session.duration_ms = full_duration;

        if resume_at > full_duration {
            tracing::warn!(
                session_id = %session.id,
                resume_at_ms = resume_at,
                full_duration_ms = full_duration,
                "Full asset shorter than chunk position, ending playback"
            );
            if let Err(e) = session.ctx.audio.seek(full_native, full_duration).await {
                tracing::debug!(session_id = %session.id, error = %e, "Seek to end failed");
            }
            session.position_ms = full_duration;
            session.error_kind = Some(ErrorKind::InconsistentAsset);
            session.set_state(PlaybackState::Ended);
            return TransitionOutcome::Inconsistent;
        }

        if let Err(e) = session.ctx.audio.seek(full_native, resume_at).await {
            tracing::warn!(session_id = %session.id, error = %e, "Seek on full asset failed");
        }
        session.position_ms = resume_at;

        if paused {
            tracing::info!(
                session_id = %session.id,
                position_ms = resume_at,
                "Transitioned to full asset while paused"
            );
            session.publish();
            return TransitionOutcome::Completed;
        }

        if let Err(e) = session.ctx.audio.play(full_native).await {
            tracing::error!(session_id = %session.id, error = %e, "Full asset playback failed");
            session.error_kind = Some(ErrorKind::NativeLoad);
            session.set_state(PlaybackState::Failed);
            return TransitionOutcome::Failed;
        }

        session.tracker.start(
            session.id,
            SegmentKind::Full,
            full_native,
            &session.cancel,
        );
        session.set_state(PlaybackState::PlayingFull);

        tracing::info!(
            session_id = %session.id,
            position_ms = resume_at,
            "Transitioned to full asset"
        );
        TransitionOutcome::Completed
    }

    /// 预览片段当前位置；读取失败时退回到最近一次记录的位置
    async fn chunk_position(session: &PlaybackSession) -> u64 {
        let Some(chunk) = session.chunk.handle() else {
            return session.position_ms;
        };

        match session.ctx.audio.status(chunk.native).await {
            Ok(status) if status.did_just_finish => status.duration_ms.max(status.position_ms),
            Ok(status) => status.position_ms,
            Err(e) => {
                tracing::debug!(session_id = %session.id, error = %e, "Chunk status unavailable, using last known position");
                session.position_ms
            }
        }
    }
}
