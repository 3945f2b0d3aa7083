//! Events - 播放状态事件推送

mod publisher;

pub use publisher::{PlayerEvent, StatusPublisher};
