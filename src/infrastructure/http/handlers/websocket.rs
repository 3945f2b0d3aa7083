//! WebSocket Handler
//!
//! 推送播放器的状态事件，连接建立时先发送一次当前快照

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use crate::infrastructure::events::PlayerEvent;
use crate::infrastructure::http::state::AppState;

/// 播放器 WebSocket 连接处理
pub async fn player_websocket_handler(
    ws: WebSocketUpgrade,
    Path(player_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_player_socket(socket, player_id, state))
}

fn encode(event: &PlayerEvent) -> Option<Message> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Message::Text(json)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize event");
            None
        }
    }
}

async fn handle_player_socket(socket: WebSocket, player_id: String, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let player = match state.registry.get(&player_id) {
        Ok(player) => player,
        Err(_) => {
            tracing::warn!(player_id = %player_id, "WebSocket connection rejected: unknown player");
            let _ = sender.close().await;
            return;
        }
    };

    let mut event_rx = player.subscribe();
    let snapshot = player.status();
    drop(player);

    tracing::info!(player_id = %player_id, "WebSocket connected");

    let forward_id = player_id.clone();
    let forward_task = tokio::spawn(async move {
        // 快照没有会话 ID，用 nil 表示
        let initial = PlayerEvent::StatusChanged {
            session_id: uuid::Uuid::nil(),
            status: snapshot,
        };
        if let Some(msg) = encode(&initial) {
            if sender.send(msg).await.is_err() {
                return;
            }
        }

        loop {
            let event = match event_rx.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(player_id = %forward_id, skipped = skipped, "WebSocket subscriber lagged");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            let Some(msg) = encode(&event) else {
                continue;
            };
            if let Err(e) = sender.send(msg).await {
                tracing::debug!(player_id = %forward_id, error = %e, "Failed to send WebSocket message");
                break;
            }
        }
        let _ = sender.close().await;
    });

    // 接收客户端消息（心跳），刷新播放器活动时间
    let receive_id = player_id.clone();
    let registry = state.registry.clone();
    let receive_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    tracing::info!(player_id = %receive_id, "WebSocket closed by client");
                    break;
                }
                Err(e) => {
                    tracing::debug!(player_id = %receive_id, error = %e, "WebSocket error");
                    break;
                }
                Ok(_) => {
                    if registry.get(&receive_id).is_err() {
                        break;
                    }
                }
            }
        }
    });

    tokio::select! {
        _ = forward_task => {}
        _ = receive_task => {}
    }

    tracing::info!(player_id = %player_id, "WebSocket disconnected");
}
