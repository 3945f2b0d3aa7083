//! Playback Context - Errors

use serde::{Deserialize, Serialize};

/// 播放错误分类（通过状态流暴露给 UI）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// 内容服务获取音频失败
    Fetch,
    /// 音频数据无效
    Decode,
    /// 临时文件写入失败
    Io,
    /// 平台音频对象初始化失败
    NativeLoad,
    /// 完整音频比已播放的预览位置还短
    InconsistentAsset,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Decode => "decode",
            Self::Io => "io",
            Self::NativeLoad => "native_load",
            Self::InconsistentAsset => "inconsistent_asset",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 片段加载失败的原因标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadCause {
    Network,
    Decode,
    Io,
}

impl std::fmt::Display for LoadCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::Decode => write!(f, "decode"),
            Self::Io => write!(f, "io"),
        }
    }
}
