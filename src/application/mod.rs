//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（ContentFetch、AudioPrimitive、ScratchStorage）
//! - playback: 渐进式播放协调
//! - error: 应用层错误定义

pub mod error;
pub mod playback;
pub mod ports;

pub use error::PlayerError;
pub use playback::{PlayerConfig, PlayerDeps, ProgressivePlayer};
