//! Player Handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::domain::playback::{ContentRef, RenderMode};
use crate::infrastructure::http::dto::{
    ApiResponse, CreatePlayerResponse, Empty, PlayerRequest, SeekRequest, StartRequest,
    StartResponse, StatusResponse,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

// ============================================================================
// Create / Close
// ============================================================================

pub async fn create_player(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<CreatePlayerResponse>>, ApiError> {
    let player_id = state.registry.create()?;
    Ok(Json(ApiResponse::success(CreatePlayerResponse { player_id })))
}

pub async fn close_player(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PlayerRequest>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    state.registry.close(&req.player_id).await?;
    Ok(Json(ApiResponse::ok()))
}

// ============================================================================
// Start
// ============================================================================

pub async fn start(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StartRequest>,
) -> Result<Json<ApiResponse<StartResponse>>, ApiError> {
    let content = ContentRef::new(req.content_id, req.variant)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let player = state.registry.get(&req.player_id)?;

    let session_id = player
        .start(content, req.mode.unwrap_or(RenderMode::Chunk))
        .await?;

    Ok(Json(ApiResponse::success(StartResponse {
        player_id: req.player_id,
        session_id,
    })))
}

// ============================================================================
// Controls
// ============================================================================

pub async fn pause(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PlayerRequest>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    state.registry.get(&req.player_id)?.pause().await?;
    Ok(Json(ApiResponse::ok()))
}

pub async fn resume(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PlayerRequest>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    state.registry.get(&req.player_id)?.resume().await?;
    Ok(Json(ApiResponse::ok()))
}

pub async fn seek(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SeekRequest>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    state
        .registry
        .get(&req.player_id)?
        .seek(req.position_ms)
        .await?;
    Ok(Json(ApiResponse::ok()))
}

pub async fn stop(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PlayerRequest>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    state.registry.get(&req.player_id)?.stop().await?;
    Ok(Json(ApiResponse::ok()))
}

// ============================================================================
// Status
// ============================================================================

pub async fn status(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PlayerRequest>,
) -> Result<Json<ApiResponse<StatusResponse>>, ApiError> {
    let player = state.registry.get(&req.player_id)?;
    Ok(Json(ApiResponse::success(StatusResponse {
        player_id: req.player_id,
        status: player.status(),
    })))
}
