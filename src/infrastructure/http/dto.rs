//! Data Transfer Objects

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::playback::{PlaybackStatus, RenderMode, TextVariant};

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

/// 空数据响应
#[derive(Debug, Serialize)]
pub struct Empty {}

impl ApiResponse<Empty> {
    /// 成功但无数据
    pub fn ok() -> Self {
        Self::success(Empty {})
    }
}

// ============================================================================
// Player DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CreatePlayerResponse {
    pub player_id: String,
}

/// 只携带 player_id 的请求（pause / resume / stop / status / close）
#[derive(Debug, Deserialize)]
pub struct PlayerRequest {
    pub player_id: String,
}

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    pub player_id: String,
    pub content_id: String,
    #[serde(default)]
    pub variant: TextVariant,
    /// 缺省为 chunk（渐进式播放）
    #[serde(default)]
    pub mode: Option<RenderMode>,
}

#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub player_id: String,
    pub session_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct SeekRequest {
    pub player_id: String,
    pub position_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub player_id: String,
    #[serde(flatten)]
    pub status: PlaybackStatus,
}
