//! Playback Context - Value Objects

use serde::{Deserialize, Serialize};

/// 朗读的文本版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextVariant {
    /// 原文
    #[default]
    Original,
    /// 摘要
    Summary,
}

impl TextVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Summary => "summary",
        }
    }
}

impl std::fmt::Display for TextVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TextVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "original" => Ok(Self::Original),
            "summary" => Ok(Self::Summary),
            other => Err(format!("unknown text variant: {}", other)),
        }
    }
}

/// 内容引用 - 被朗读的内容及其文本版本
///
/// 对协调器而言是不透明的，只用于请求音频和日志追踪
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentRef {
    content_id: String,
    variant: TextVariant,
}

impl ContentRef {
    pub fn new(content_id: impl Into<String>, variant: TextVariant) -> Result<Self, &'static str> {
        let content_id = content_id.into();
        if content_id.trim().is_empty() {
            return Err("内容 ID 不能为空");
        }
        Ok(Self {
            content_id,
            variant,
        })
    }

    pub fn content_id(&self) -> &str {
        &self.content_id
    }

    pub fn variant(&self) -> TextVariant {
        self.variant
    }
}

impl std::fmt::Display for ContentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.content_id, self.variant)
    }
}

/// 音频片段类型
///
/// - Chunk: 短小、快速合成的预览片段，立即播放
/// - Full: 完整渲染，后台加载
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Chunk,
    Full,
}

/// 请求内容服务时使用的渲染模式，与片段类型一一对应
pub type RenderMode = SegmentKind;

impl SegmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chunk => "chunk",
            Self::Full => "full",
        }
    }
}

impl std::fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SegmentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chunk" => Ok(Self::Chunk),
            "full" => Ok(Self::Full),
            other => Err(format!("unknown render mode: {}", other)),
        }
    }
}
