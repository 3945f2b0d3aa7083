//! Progressive Player - 渐进式播放的控制入口
//!
//! `ProgressivePlayer` 是对外的句柄，命令经 mpsc 发送给后台的
//! `PlayerWorker`。Worker 独占当前会话，命令与后台事件在同一个循环中
//! 逐个处理，因此不存在并发修改

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::events::SessionEvent;
use super::position_tracker::DEFAULT_TRACKER_INTERVAL;
use super::segment_loader::SegmentLoader;
use super::session::{PlaybackSession, SessionContext};
use crate::application::error::PlayerError;
use crate::application::ports::{AudioPrimitivePort, ContentFetchPort, ScratchStoragePort};
use crate::domain::playback::{ContentRef, PlaybackStatus, RenderMode};
use crate::infrastructure::events::{PlayerEvent, StatusPublisher};

/// 播放器配置
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    /// 位置轮询间隔
    pub tracker_interval: Duration,
    /// 命令队列容量
    pub command_buffer: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            tracker_interval: DEFAULT_TRACKER_INTERVAL,
            command_buffer: 64,
        }
    }
}

/// 播放器依赖的外部协作者
#[derive(Clone)]
pub struct PlayerDeps {
    pub fetcher: Arc<dyn ContentFetchPort>,
    pub audio: Arc<dyn AudioPrimitivePort>,
    pub storage: Arc<dyn ScratchStoragePort>,
}

enum PlayerCommand {
    Start {
        content: ContentRef,
        hint: RenderMode,
        ack: oneshot::Sender<Uuid>,
    },
    Pause {
        ack: oneshot::Sender<()>,
    },
    Resume {
        ack: oneshot::Sender<()>,
    },
    Seek {
        position_ms: u64,
        ack: oneshot::Sender<()>,
    },
    Stop {
        ack: oneshot::Sender<()>,
    },
    Shutdown {
        ack: oneshot::Sender<()>,
    },
}

/// 渐进式播放器
pub struct ProgressivePlayer {
    commands: mpsc::Sender<PlayerCommand>,
    publisher: Arc<StatusPublisher>,
    shutdown: CancellationToken,
}

impl ProgressivePlayer {
    /// 创建播放器并启动后台 Worker，需要在 tokio 运行时内调用
    pub fn spawn(config: PlayerConfig, deps: PlayerDeps) -> Self {
        let (command_tx, command_rx) = mpsc::channel(config.command_buffer.max(1));
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let publisher = StatusPublisher::new().arc();
        let shutdown = CancellationToken::new();

        let ctx = SessionContext {
            loader: Arc::new(SegmentLoader::new(
                deps.fetcher,
                deps.storage.clone(),
                deps.audio.clone(),
            )),
            audio: deps.audio,
            storage: deps.storage,
            publisher: publisher.clone(),
            events: event_tx,
            tracker_interval: config.tracker_interval,
        };

        let worker = PlayerWorker {
            commands: command_rx,
            events: event_rx,
            ctx,
            session: None,
            shutdown: shutdown.clone(),
        };
        tokio::spawn(worker.run());

        Self {
            commands: command_tx,
            publisher,
            shutdown,
        }
    }

    /// 开始播放新内容，返回新会话 ID；之前的会话会先被释放
    pub async fn start(&self, content: ContentRef, hint: RenderMode) -> Result<Uuid, PlayerError> {
        self.request(|ack| PlayerCommand::Start { content, hint, ack })
            .await
    }

    pub async fn pause(&self) -> Result<(), PlayerError> {
        self.request(|ack| PlayerCommand::Pause { ack }).await
    }

    pub async fn resume(&self) -> Result<(), PlayerError> {
        self.request(|ack| PlayerCommand::Resume { ack }).await
    }

    pub async fn seek(&self, position_ms: u64) -> Result<(), PlayerError> {
        self.request(|ack| PlayerCommand::Seek { position_ms, ack })
            .await
    }

    pub async fn stop(&self) -> Result<(), PlayerError> {
        self.request(|ack| PlayerCommand::Stop { ack }).await
    }

    /// 释放当前会话并停止 Worker
    pub async fn shutdown(&self) -> Result<(), PlayerError> {
        self.request(|ack| PlayerCommand::Shutdown { ack }).await
    }

    /// 订阅状态事件流
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.publisher.subscribe()
    }

    /// 订阅最新状态
    pub fn watch_status(&self) -> watch::Receiver<PlaybackStatus> {
        self.publisher.watch()
    }

    /// 最新状态快照
    pub fn status(&self) -> PlaybackStatus {
        self.publisher.latest()
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> PlayerCommand,
    ) -> Result<T, PlayerError> {
        let (ack, reply) = oneshot::channel();
        self.commands
            .send(build(ack))
            .await
            .map_err(|_| PlayerError::Closed)?;
        reply.await.map_err(|_| PlayerError::Closed)
    }
}

impl Drop for ProgressivePlayer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// 播放器 Worker
///
/// 独占会话的后台任务
struct PlayerWorker {
    commands: mpsc::Receiver<PlayerCommand>,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    ctx: SessionContext,
    session: Option<PlaybackSession>,
    shutdown: CancellationToken,
}

impl PlayerWorker {
    async fn run(mut self) {
        tracing::debug!("PlayerWorker started");

        let mut shutdown_ack = None;
        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                command = self.commands.recv() => match command {
                    Some(PlayerCommand::Shutdown { ack }) => {
                        shutdown_ack = Some(ack);
                        break;
                    }
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
                Some(event) = self.events.recv() => self.handle_event(event).await,
            }
        }

        self.close_session("shutdown").await;
        self.commands.close();
        if let Some(ack) = shutdown_ack {
            let _ = ack.send(());
        }

        // 丢弃已排队的后台结果，释放其中的句柄
        while let Ok(event) = self.events.try_recv() {
            self.release_stale(event).await;
        }

        tracing::debug!("PlayerWorker stopped");
    }

    async fn handle_command(&mut self, command: PlayerCommand) {
        match command {
            PlayerCommand::Start { content, hint, ack } => {
                self.close_session("superseded").await;

                let mut session =
                    PlaybackSession::new(Uuid::new_v4(), content, self.ctx.clone());
                session.begin(hint).await;
                let session_id = session.id();
                self.session = Some(session);
                let _ = ack.send(session_id);
            }
            PlayerCommand::Pause { ack } => {
                if let Some(session) = self.session.as_mut() {
                    session.pause().await;
                }
                let _ = ack.send(());
            }
            PlayerCommand::Resume { ack } => {
                if let Some(session) = self.session.as_mut() {
                    session.resume().await;
                }
                let _ = ack.send(());
            }
            PlayerCommand::Seek { position_ms, ack } => {
                if let Some(session) = self.session.as_mut() {
                    session.seek(position_ms).await;
                }
                let _ = ack.send(());
            }
            PlayerCommand::Stop { ack } => {
                self.close_session("stopped").await;
                let _ = ack.send(());
            }
            PlayerCommand::Shutdown { ack } => {
                let _ = ack.send(());
            }
        }
    }

    async fn handle_event(&mut self, event: SessionEvent) {
        match self.session.as_mut() {
            Some(session) if session.id() == event.session_id() => {
                session.handle_event(event).await;
            }
            _ => self.release_stale(event).await,
        }
    }

    async fn release_stale(&self, event: SessionEvent) {
        if let SessionEvent::Loaded {
            session_id,
            result: Ok(handle),
            ..
        } = event
        {
            tracing::debug!(session_id = %session_id, kind = %handle.kind, "Releasing segment of stale session");
            self.ctx.loader.release_orphan(handle).await;
        }
    }

    async fn close_session(&mut self, reason: &str) {
        if let Some(mut session) = self.session.take() {
            session.dispose(reason).await;
        }
    }
}
