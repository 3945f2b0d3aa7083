//! 渐进式播放
//!
//! - segment_loader: 片段获取、落盘与加载
//! - position_tracker: 活动片段位置轮询
//! - transition: 预览片段到完整音频的切换
//! - session: 单次播放会话与状态机
//! - player: 对外控制入口与后台 Worker

mod events;
mod position_tracker;
mod session;
mod transition;

pub mod player;
pub mod segment_loader;

pub use player::{PlayerConfig, PlayerDeps, ProgressivePlayer};
pub use position_tracker::DEFAULT_TRACKER_INTERVAL;
pub use segment_loader::{LoadError, SegmentHandle, SegmentLoader};
