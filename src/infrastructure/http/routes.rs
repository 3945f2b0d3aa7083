//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping              GET   健康检查
//! - /api/player/create     POST  创建播放器
//! - /api/player/start      POST  开始播放内容（渐进式或直接完整音频）
//! - /api/player/pause      POST  暂停
//! - /api/player/resume     POST  恢复
//! - /api/player/seek       POST  跳转位置
//! - /api/player/stop       POST  停止并释放当前会话
//! - /api/player/status     POST  获取最新状态
//! - /api/player/close      POST  关闭播放器
//! - /ws/player/{id}        WS    播放器状态事件

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api", api_routes())
        .route(
            "/ws/player/:player_id",
            get(handlers::player_websocket_handler),
        )
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/player", player_routes())
}

/// Player 路由
fn player_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/create", post(handlers::create_player))
        .route("/start", post(handlers::start))
        .route("/pause", post(handlers::pause))
        .route("/resume", post(handlers::resume))
        .route("/seek", post(handlers::seek))
        .route("/stop", post(handlers::stop))
        .route("/status", post(handlers::status))
        .route("/close", post(handlers::close_player))
}
