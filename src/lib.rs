//! Lectio - 渐进式 TTS 播放
//!
//! 架构设计: Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Playback Context: 播放状态、片段类型、状态快照
//!
//! 应用层 (application/):
//! - Ports: 端口定义（ContentFetch, AudioPrimitive, ScratchStorage）
//! - Playback: 片段加载、位置轮询、切换协调、播放会话与播放器
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API + WebSocket
//! - Memory: PlayerRegistry 内存实现
//! - Adapters: 内容获取、平台音频、临时文件存储
//! - Events: 播放状态发布

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
