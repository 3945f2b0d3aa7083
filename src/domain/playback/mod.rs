//! Playback Context - 渐进式播放领域模型
//!
//! - value_objects: ContentRef, TextVariant, SegmentKind
//! - state: PlaybackState 状态机
//! - status: 对 UI 暴露的播放状态快照
//! - errors: 错误分类

mod errors;
mod state;
mod status;
mod value_objects;

pub use errors::{ErrorKind, LoadCause};
pub use state::PlaybackState;
pub use status::PlaybackStatus;
pub use value_objects::{ContentRef, RenderMode, SegmentKind, TextVariant};
