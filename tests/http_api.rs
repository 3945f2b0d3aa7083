use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::Router;
use http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use lectio::application::playback::{PlayerConfig, PlayerDeps};
use lectio::domain::playback::RenderMode;
use lectio::infrastructure::adapters::{ClockedAudioPrimitive, FakeContentFetcher, FileScratchStorage};
use lectio::infrastructure::http::{build_router, AppState};
use lectio::infrastructure::memory::PlayerRegistry;

struct TestApp {
    router: Router,
    scratch: tempfile::TempDir,
}

async fn app(max_players: usize) -> TestApp {
    let scratch = tempfile::tempdir().unwrap();
    let fetcher = FakeContentFetcher::new(2000, 30000)
        .with_delay(RenderMode::Full, Duration::from_secs(60));

    let deps = PlayerDeps {
        fetcher: Arc::new(fetcher),
        audio: Arc::new(ClockedAudioPrimitive::new()),
        storage: Arc::new(FileScratchStorage::new(scratch.path()).await.unwrap()),
    };
    let config = PlayerConfig {
        tracker_interval: Duration::from_millis(50),
        command_buffer: 8,
    };
    let registry = PlayerRegistry::new(config, deps, max_players).arc();

    TestApp {
        router: build_router(Arc::new(AppState::new(registry))),
        scratch,
    }
}

async fn send(router: &Router, request: Request<Body>) -> Value {
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn post(router: &Router, uri: &str, body: Value) -> Value {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(router, request).await
}

async fn create_player(router: &Router) -> String {
    let resp = post(router, "/api/player/create", json!({})).await;
    assert_eq!(resp["errno"], 0);
    resp["data"]["player_id"].as_str().unwrap().to_string()
}

async fn wait_for_state(router: &Router, player_id: &str, state: &str) -> Value {
    for _ in 0..100 {
        let resp = post(router, "/api/player/status", json!({ "player_id": player_id })).await;
        if resp["data"]["state"] == state {
            return resp["data"].clone();
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("player {} never reached {}", player_id, state);
}

#[tokio::test]
async fn test_ping_reports_player_count() {
    let app = app(4).await;
    create_player(&app.router).await;

    let request = Request::builder()
        .uri("/api/ping")
        .body(Body::empty())
        .unwrap();
    let resp = send(&app.router, request).await;
    assert_eq!(resp["status"], "ok");
    assert_eq!(resp["players"], 1);
}

#[tokio::test]
async fn test_playback_controls_over_http() {
    let app = app(4).await;
    let player_id = create_player(&app.router).await;

    let resp = post(
        &app.router,
        "/api/player/start",
        json!({ "player_id": player_id, "content_id": "lesson-1", "variant": "summary" }),
    )
    .await;
    assert_eq!(resp["errno"], 0);
    assert!(resp["data"]["session_id"].is_string());

    let status = wait_for_state(&app.router, &player_id, "playing_chunk").await;
    assert_eq!(status["active_segment"], "chunk");
    assert_eq!(status["duration_ms"], 2000);

    let resp = post(&app.router, "/api/player/pause", json!({ "player_id": player_id })).await;
    assert_eq!(resp["errno"], 0);
    wait_for_state(&app.router, &player_id, "paused").await;

    let resp = post(
        &app.router,
        "/api/player/seek",
        json!({ "player_id": player_id, "position_ms": 1500 }),
    )
    .await;
    assert_eq!(resp["errno"], 0);
    let status = wait_for_state(&app.router, &player_id, "paused").await;
    assert_eq!(status["position_ms"], 1500);

    post(&app.router, "/api/player/resume", json!({ "player_id": player_id })).await;
    wait_for_state(&app.router, &player_id, "playing_chunk").await;

    post(&app.router, "/api/player/stop", json!({ "player_id": player_id })).await;
    wait_for_state(&app.router, &player_id, "ended").await;

    // 停止后临时文件已清理
    let leftover = std::fs::read_dir(app.scratch.path()).unwrap().count();
    assert_eq!(leftover, 0);
}

#[tokio::test]
async fn test_full_mode_start_loads_full_asset() {
    let app = app(4).await;
    let player_id = create_player(&app.router).await;

    let resp = post(
        &app.router,
        "/api/player/start",
        json!({ "player_id": player_id, "content_id": "lesson-2", "mode": "full" }),
    )
    .await;
    assert_eq!(resp["errno"], 0);

    let status = post(&app.router, "/api/player/status", json!({ "player_id": player_id })).await;
    assert_eq!(status["data"]["state"], "loading_full");
    assert_eq!(status["data"]["active_segment"], "full");
}

#[tokio::test]
async fn test_request_errors() {
    let app = app(1).await;
    let player_id = create_player(&app.router).await;

    let resp = post(
        &app.router,
        "/api/player/start",
        json!({ "player_id": player_id, "content_id": "  " }),
    )
    .await;
    assert_eq!(resp["errno"], 400);

    let resp = post(&app.router, "/api/player/pause", json!({ "player_id": "missing" })).await;
    assert_eq!(resp["errno"], 404);

    let resp = post(&app.router, "/api/player/create", json!({})).await;
    assert_eq!(resp["errno"], 503);

    let resp = post(&app.router, "/api/player/close", json!({ "player_id": player_id })).await;
    assert_eq!(resp["errno"], 0);

    let resp = post(&app.router, "/api/player/status", json!({ "player_id": player_id })).await;
    assert_eq!(resp["errno"], 404);

    // 关闭后可以重新创建
    create_player(&app.router).await;
}
