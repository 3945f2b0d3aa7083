//! Domain Layer - 领域层
//!
//! - Playback Context: 渐进式播放

pub mod playback;
