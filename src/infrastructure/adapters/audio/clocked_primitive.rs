//! Clocked Audio Primitive - 无声输出的平台音频实现
//!
//! 实现 AudioPrimitivePort trait。加载时用 symphonia 探测音频并得到时长，
//! 之后由 PlaybackClock 推进播放位置，适用于服务端和测试环境

use async_trait::async_trait;
use dashmap::DashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::clock::PlaybackClock;
use crate::application::ports::{AudioError, AudioPrimitivePort, NativeHandle, NativeStatus};

/// 探测音频时长（毫秒），无法识别的数据返回 Decode 错误
pub fn read_duration_ms(data: &[u8]) -> Result<u64, AudioError> {
    if data.is_empty() {
        return Err(AudioError::Decode("empty audio data".to_string()));
    }

    let cursor = Cursor::new(data.to_vec());
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let detected = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AudioError::Decode(format!("Format detection failed: {}", e)))?;

    let mut format = detected.format;
    let track = format
        .default_track()
        .ok_or_else(|| AudioError::Decode("No audio track found".to_string()))?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .filter(|rate| *rate > 0)
        .ok_or_else(|| AudioError::Decode("Unknown sample rate".to_string()))?;

    let frames = match track.codec_params.n_frames {
        Some(frames) => frames,
        None => {
            // 头部没有总帧数时累加包时长
            let mut frames = 0u64;
            loop {
                match format.next_packet() {
                    Ok(packet) if packet.track_id() == track_id => frames += packet.dur,
                    Ok(_) => continue,
                    Err(symphonia::core::errors::Error::IoError(e))
                        if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                    {
                        break;
                    }
                    Err(e) => {
                        return Err(AudioError::Decode(format!("Packet read error: {}", e)));
                    }
                }
            }
            frames
        }
    };

    Ok(frames * 1000 / sample_rate as u64)
}

/// 基于时钟的音频对象集合
pub struct ClockedAudioPrimitive {
    sounds: DashMap<NativeHandle, PlaybackClock>,
    next_id: AtomicU64,
}

impl ClockedAudioPrimitive {
    pub fn new() -> Self {
        Self {
            sounds: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// 从内存中的音频字节创建句柄
    pub fn load_bytes(&self, data: &[u8]) -> Result<NativeHandle, AudioError> {
        let duration_ms = read_duration_ms(data)?;
        let handle = NativeHandle::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.sounds.insert(handle, PlaybackClock::new(duration_ms));

        tracing::debug!(handle = %handle, duration_ms = duration_ms, "Sound loaded");
        Ok(handle)
    }

    /// 已加载的句柄数
    pub fn loaded_count(&self) -> usize {
        self.sounds.len()
    }

    /// 正在播放的句柄数
    pub fn playing_count(&self) -> usize {
        self.sounds
            .iter()
            .filter(|entry| entry.value().is_playing())
            .count()
    }

    pub fn is_loaded(&self, handle: NativeHandle) -> bool {
        self.sounds.contains_key(&handle)
    }

    fn with_clock<T>(
        &self,
        handle: NativeHandle,
        f: impl FnOnce(&mut PlaybackClock) -> T,
    ) -> Result<T, AudioError> {
        let mut clock = self
            .sounds
            .get_mut(&handle)
            .ok_or(AudioError::NotLoaded(handle))?;
        Ok(f(clock.value_mut()))
    }
}

impl Default for ClockedAudioPrimitive {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioPrimitivePort for ClockedAudioPrimitive {
    async fn load(&self, path: &Path) -> Result<NativeHandle, AudioError> {
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| AudioError::Io(format!("{}: {}", path.display(), e)))?;
        self.load_bytes(&data)
    }

    async fn play(&self, handle: NativeHandle) -> Result<(), AudioError> {
        self.with_clock(handle, PlaybackClock::play)
    }

    async fn pause(&self, handle: NativeHandle) -> Result<(), AudioError> {
        self.with_clock(handle, PlaybackClock::pause)
    }

    async fn seek(&self, handle: NativeHandle, position_ms: u64) -> Result<(), AudioError> {
        self.with_clock(handle, |clock| clock.seek(position_ms))
    }

    async fn status(&self, handle: NativeHandle) -> Result<NativeStatus, AudioError> {
        self.with_clock(handle, PlaybackClock::poll)
    }

    async fn unload(&self, handle: NativeHandle) -> Result<(), AudioError> {
        self.sounds
            .remove(&handle)
            .map(|_| tracing::debug!(handle = %handle, "Sound unloaded"))
            .ok_or(AudioError::NotLoaded(handle))
    }
}
