//! Playback Context - 播放状态机

use serde::{Deserialize, Serialize};

/// 播放会话状态
///
/// 初始状态 Idle，终止状态 Ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    #[default]
    Idle,
    /// 正在加载预览片段
    LoadingChunk,
    /// 直接加载完整音频（预览失败回退，或调用方指定 full）
    LoadingFull,
    PlayingChunk,
    /// 预览片段已播完，完整音频尚未就绪
    WaitingForFull,
    PlayingFull,
    Paused,
    Failed,
    Ended,
}

impl PlaybackState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::LoadingChunk => "loading_chunk",
            Self::LoadingFull => "loading_full",
            Self::PlayingChunk => "playing_chunk",
            Self::WaitingForFull => "waiting_for_full",
            Self::PlayingFull => "playing_full",
            Self::Paused => "paused",
            Self::Failed => "failed",
            Self::Ended => "ended",
        }
    }

    /// UI 是否应显示加载指示
    pub fn is_loading(&self) -> bool {
        matches!(
            self,
            Self::LoadingChunk | Self::LoadingFull | Self::WaitingForFull
        )
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, Self::PlayingChunk | Self::PlayingFull)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed | Self::Ended)
    }

    /// 状态迁移表
    ///
    /// 任意状态都可以进入 Ended（stop/dispose），相同状态视为合法
    pub fn can_transition_to(&self, next: PlaybackState) -> bool {
        use PlaybackState::*;

        if *self == next || next == Ended {
            return true;
        }

        match (*self, next) {
            (Idle, LoadingChunk | LoadingFull) => true,
            (LoadingChunk, PlayingChunk | LoadingFull) => true,
            (LoadingFull, PlayingFull | Failed) => true,
            (PlayingChunk, Paused | WaitingForFull | PlayingFull | Failed) => true,
            (Paused, PlayingChunk | PlayingFull | WaitingForFull | Failed) => true,
            (WaitingForFull, PlayingFull | Failed) => true,
            (PlayingFull, Paused | Failed) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
