//! Playback Clock - 基于 tokio 时钟的播放位置
//!
//! 不输出声音，只按时间推进位置，行为与平台音频对象一致：
//! 播放到结尾后自动停止，并且只在下一次状态查询中报告一次 did_just_finish

use tokio::time::Instant;

use crate::application::ports::NativeStatus;

#[derive(Debug, Clone)]
pub struct PlaybackClock {
    duration_ms: u64,
    /// 上次暂停/跳转时的位置
    base_ms: u64,
    /// 播放中时为开始计时的时刻
    started_at: Option<Instant>,
    played: bool,
    finish_reported: bool,
}

impl PlaybackClock {
    pub fn new(duration_ms: u64) -> Self {
        Self {
            duration_ms,
            base_ms: 0,
            started_at: None,
            played: false,
            finish_reported: false,
        }
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn position_ms(&self) -> u64 {
        let elapsed = self
            .started_at
            .map(|at| at.elapsed().as_millis() as u64)
            .unwrap_or(0);
        (self.base_ms + elapsed).min(self.duration_ms)
    }

    pub fn is_playing(&self) -> bool {
        self.started_at.is_some() && self.position_ms() < self.duration_ms
    }

    pub fn play(&mut self) {
        if self.started_at.is_some() {
            return;
        }
        // 已在结尾时从头播放
        if self.base_ms >= self.duration_ms {
            self.base_ms = 0;
        }
        self.started_at = Some(Instant::now());
        self.played = true;
        self.finish_reported = false;
    }

    pub fn pause(&mut self) {
        self.base_ms = self.position_ms();
        self.started_at = None;
    }

    pub fn seek(&mut self, position_ms: u64) {
        self.base_ms = position_ms.min(self.duration_ms);
        if self.started_at.is_some() {
            self.started_at = Some(Instant::now());
        }
        self.finish_reported = false;
    }

    /// 查询状态，播放到结尾时停止计时并报告一次完成
    pub fn poll(&mut self) -> NativeStatus {
        let position_ms = self.position_ms();
        let at_end = position_ms >= self.duration_ms;

        let did_just_finish = self.played && at_end && !self.finish_reported;
        if at_end && self.started_at.is_some() {
            self.base_ms = self.duration_ms;
            self.started_at = None;
        }
        if did_just_finish {
            self.finish_reported = true;
        }

        NativeStatus {
            is_loaded: true,
            is_playing: self.started_at.is_some(),
            position_ms,
            duration_ms: self.duration_ms,
            did_just_finish,
        }
    }
}
