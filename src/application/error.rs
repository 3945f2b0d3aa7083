//! 应用层错误定义

use thiserror::Error;

/// 播放器错误
///
/// 会话内部的失败通过状态流上报，这里只有控制通道本身的错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayerError {
    /// 播放器已关闭
    #[error("Player is closed")]
    Closed,
}
