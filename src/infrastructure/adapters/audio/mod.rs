//! Audio Adapter - 平台音频对象实现

mod clock;
mod clocked_primitive;

pub use clock::PlaybackClock;
pub use clocked_primitive::{read_duration_ms, ClockedAudioPrimitive};
