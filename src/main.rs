//! Lectio - 渐进式 TTS 播放服务
//!
//! 先播放快速合成的预览片段，同时在后台加载完整音频，就绪后无缝切换

use std::sync::Arc;
use std::time::Duration;

use lectio::application::playback::PlayerDeps;
use lectio::application::ports::ContentFetchPort;
use lectio::config::{load_config, print_config, AppConfig};
use lectio::domain::playback::RenderMode;
use lectio::infrastructure::adapters::{
    ClockedAudioPrimitive, FakeContentFetcher, FileScratchStorage, HttpContentFetcher,
    HttpContentFetcherConfig,
};
use lectio::infrastructure::http::{AppState, HttpServer, ServerConfig};
use lectio::infrastructure::memory::PlayerRegistry;

fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},lectio={},tower_http=debug",
        config.log.level, config.log.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn build_fetcher(config: &AppConfig) -> anyhow::Result<Arc<dyn ContentFetchPort>> {
    if config.fetch.fake {
        let fetcher = FakeContentFetcher::new(config.fetch.fake_chunk_ms, config.fetch.fake_full_ms)
            .with_delay(
                RenderMode::Full,
                Duration::from_millis(config.fetch.fake_full_delay_ms),
            );
        return Ok(Arc::new(fetcher));
    }

    let fetch_config =
        HttpContentFetcherConfig::new(&config.fetch.url).with_timeout(config.fetch.timeout_secs);
    Ok(Arc::new(HttpContentFetcher::new(fetch_config)?))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);
    tracing::info!("Lectio - progressive TTS playback");
    print_config(&config);

    // 上次运行遗留的临时文件没有会话会再引用
    if tokio::fs::try_exists(&config.storage.scratch_dir).await? {
        tokio::fs::remove_dir_all(&config.storage.scratch_dir).await?;
    }
    let storage = Arc::new(FileScratchStorage::new(&config.storage.scratch_dir).await?);

    let deps = PlayerDeps {
        fetcher: build_fetcher(&config)?,
        audio: Arc::new(ClockedAudioPrimitive::new()),
        storage,
    };

    let registry = PlayerRegistry::new(
        config.playback.player_config(),
        deps,
        config.registry.max_players,
    )
    .arc();

    // 空闲播放器清理
    let sweeper = {
        let registry = registry.clone();
        let idle_expire_secs = config.registry.idle_expire_secs;
        let mut ticker =
            tokio::time::interval(Duration::from_secs(config.registry.sweep_interval_secs));
        tokio::spawn(async move {
            loop {
                ticker.tick().await;
                registry.sweep_expired(idle_expire_secs).await;
            }
        })
    };

    let server_config = ServerConfig::new(&config.server.host, config.server.port);
    let server = HttpServer::new(server_config, AppState::new(registry.clone()));

    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    sweeper.abort();
    registry.close_all().await;

    tracing::info!("Server shutdown complete");

    Ok(())
}
