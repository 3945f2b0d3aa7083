//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_primitive;
mod content_fetch;
mod scratch_storage;

pub use audio_primitive::{AudioError, AudioPrimitivePort, NativeHandle, NativeStatus};
pub use content_fetch::{ContentFetchPort, FetchError};
pub use scratch_storage::{ScratchError, ScratchStoragePort};
