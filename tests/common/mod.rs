//! 播放集成测试的公共夹具
//!
//! 全部在内存中运行，测试可以在暂停的 tokio 时钟上驱动播放器

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use lectio::application::playback::{PlayerConfig, PlayerDeps, ProgressivePlayer};
use lectio::application::ports::{
    AudioError, AudioPrimitivePort, NativeHandle, NativeStatus, ScratchError, ScratchStoragePort,
};
use lectio::domain::playback::{ContentRef, PlaybackState, PlaybackStatus, SegmentKind, TextVariant};
use lectio::infrastructure::adapters::{ClockedAudioPrimitive, FakeContentFetcher};
use lectio::infrastructure::events::PlayerEvent;

pub const TRACKER_INTERVAL: Duration = Duration::from_millis(500);

// ============================================================================
// 内存临时存储
// ============================================================================

#[derive(Default)]
pub struct MemoryScratch {
    files: DashMap<PathBuf, Vec<u8>>,
}

impl MemoryScratch {
    pub fn read(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.get(path).map(|entry| entry.value().clone())
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn session_file_count(&self, session_id: Uuid) -> usize {
        let dir = self.session_dir(session_id);
        self.files.iter().filter(|e| e.key().starts_with(&dir)).count()
    }
}

#[async_trait]
impl ScratchStoragePort for MemoryScratch {
    fn session_dir(&self, session_id: Uuid) -> PathBuf {
        PathBuf::from("/scratch").join(session_id.to_string())
    }

    fn segment_path(&self, session_id: Uuid, segment: SegmentKind) -> PathBuf {
        self.session_dir(session_id)
            .join(format!("{}.audio", segment.as_str()))
    }

    async fn write_segment(
        &self,
        session_id: Uuid,
        segment: SegmentKind,
        data: &[u8],
    ) -> Result<PathBuf, ScratchError> {
        let path = self.segment_path(session_id, segment);
        self.files.insert(path.clone(), data.to_vec());
        Ok(path)
    }

    async fn delete_segment(
        &self,
        session_id: Uuid,
        segment: SegmentKind,
    ) -> Result<(), ScratchError> {
        self.files.remove(&self.segment_path(session_id, segment));
        Ok(())
    }

    async fn delete_session(&self, session_id: Uuid) -> Result<u64, ScratchError> {
        let dir = self.session_dir(session_id);
        let before = self.files.len();
        self.files.retain(|path, _| !path.starts_with(&dir));
        Ok((before - self.files.len()) as u64)
    }

    async fn segment_exists(&self, session_id: Uuid, segment: SegmentKind) -> bool {
        self.files
            .contains_key(&self.segment_path(session_id, segment))
    }
}

// ============================================================================
// 可编排的平台音频
// ============================================================================

/// 从 `MemoryScratch` 读取数据的时钟音频，可按需让播放失败，
/// 并记录同一时刻发声的最大数量
pub struct ScriptedAudio {
    inner: ClockedAudioPrimitive,
    scratch: Arc<MemoryScratch>,
    failing_plays: AtomicUsize,
    plays: AtomicUsize,
    max_playing: AtomicUsize,
}

impl ScriptedAudio {
    pub fn new(scratch: Arc<MemoryScratch>) -> Self {
        Self {
            inner: ClockedAudioPrimitive::new(),
            scratch,
            failing_plays: AtomicUsize::new(0),
            plays: AtomicUsize::new(0),
            max_playing: AtomicUsize::new(0),
        }
    }

    /// 接下来的 `count` 次播放调用失败
    pub fn fail_next_plays(&self, count: usize) {
        self.failing_plays.store(count, Ordering::SeqCst);
    }

    pub fn plays(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }

    pub fn max_playing(&self) -> usize {
        self.max_playing.load(Ordering::SeqCst)
    }

    pub fn playing_count(&self) -> usize {
        self.inner.playing_count()
    }

    pub fn loaded_count(&self) -> usize {
        self.inner.loaded_count()
    }
}

#[async_trait]
impl AudioPrimitivePort for ScriptedAudio {
    async fn load(&self, path: &Path) -> Result<NativeHandle, AudioError> {
        let data = self
            .scratch
            .read(path)
            .ok_or_else(|| AudioError::Io(format!("missing {}", path.display())))?;
        self.inner.load_bytes(&data)
    }

    async fn play(&self, handle: NativeHandle) -> Result<(), AudioError> {
        let failing = self
            .failing_plays
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(AudioError::Load("scripted play failure".to_string()));
        }

        self.inner.play(handle).await?;
        self.plays.fetch_add(1, Ordering::SeqCst);
        self.max_playing
            .fetch_max(self.inner.playing_count(), Ordering::SeqCst);
        Ok(())
    }

    async fn pause(&self, handle: NativeHandle) -> Result<(), AudioError> {
        self.inner.pause(handle).await
    }

    async fn seek(&self, handle: NativeHandle, position_ms: u64) -> Result<(), AudioError> {
        self.inner.seek(handle, position_ms).await
    }

    async fn status(&self, handle: NativeHandle) -> Result<NativeStatus, AudioError> {
        self.inner.status(handle).await
    }

    async fn unload(&self, handle: NativeHandle) -> Result<(), AudioError> {
        self.inner.unload(handle).await
    }
}

// ============================================================================
// 测试夹具
// ============================================================================

pub struct Harness {
    pub player: ProgressivePlayer,
    pub fetcher: Arc<FakeContentFetcher>,
    pub audio: Arc<ScriptedAudio>,
    pub scratch: Arc<MemoryScratch>,
    pub events: broadcast::Receiver<PlayerEvent>,
}

impl Harness {
    pub fn new(fetcher: FakeContentFetcher) -> Self {
        let fetcher = Arc::new(fetcher);
        let scratch = Arc::new(MemoryScratch::default());
        let audio = Arc::new(ScriptedAudio::new(scratch.clone()));

        let deps = PlayerDeps {
            fetcher: fetcher.clone(),
            audio: audio.clone(),
            storage: scratch.clone(),
        };
        let config = PlayerConfig {
            tracker_interval: TRACKER_INTERVAL,
            command_buffer: 16,
        };
        let player = ProgressivePlayer::spawn(config, deps);
        let events = player.subscribe();

        Self {
            player,
            fetcher,
            audio,
            scratch,
            events,
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        self.player.status()
    }

    /// 取出目前为止发布的所有事件
    pub fn drain(&mut self) -> Vec<PlayerEvent> {
        let mut events = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(event) => events.push(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
        events
    }
}

pub fn content(id: &str) -> ContentRef {
    ContentRef::new(id, TextVariant::Summary).unwrap()
}

pub async fn sleep_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

/// 某个会话按顺序发布的状态
pub fn statuses(events: &[PlayerEvent], session_id: Uuid) -> Vec<PlaybackStatus> {
    events
        .iter()
        .filter_map(|event| match event {
            PlayerEvent::StatusChanged { session_id: id, status } if *id == session_id => {
                Some(status.clone())
            }
            _ => None,
        })
        .collect()
}

/// 会话依次经过的状态（相邻重复合并）
pub fn states(events: &[PlayerEvent], session_id: Uuid) -> Vec<PlaybackState> {
    let mut states: Vec<PlaybackState> = statuses(events, session_id)
        .into_iter()
        .map(|s| s.state)
        .collect();
    states.dedup();
    states
}
