//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 环境变量前缀
const ENV_PREFIX: &str = "LECTIO";

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `LECTIO_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `LECTIO_SERVER__PORT=8080`
/// - `LECTIO_FETCH__URL=http://render-server:8000`
/// - `LECTIO_FETCH__FAKE=true`
/// - `LECTIO_PLAYBACK__TRACKER_INTERVAL_MS=250`
/// - `LECTIO_STORAGE__SCRATCH_DIR=/tmp/lectio`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5070)?
        .set_default("fetch.url", "http://localhost:8000")?
        .set_default("fetch.timeout_secs", 120)?
        .set_default("fetch.fake", false)?
        .set_default("playback.tracker_interval_ms", 500)?
        .set_default("playback.command_buffer", 64)?
        .set_default("storage.scratch_dir", "data/scratch")?
        .set_default("registry.max_players", 256)?
        .set_default("registry.idle_expire_secs", 1800)?
        .set_default("registry.sweep_interval_secs", 60)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 例如: LECTIO_FETCH__URL=http://render-server:8000
    // 注意: 环境变量名会被转换为小写
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if !config.fetch.fake && config.fetch.url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "Fetch URL cannot be empty".to_string(),
        ));
    }

    if config.fetch.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Fetch timeout cannot be 0".to_string(),
        ));
    }

    if config.playback.tracker_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "Tracker interval cannot be 0".to_string(),
        ));
    }

    if config.playback.command_buffer == 0 {
        return Err(ConfigError::ValidationError(
            "Command buffer cannot be 0".to_string(),
        ));
    }

    if config.storage.scratch_dir.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "Scratch directory cannot be empty".to_string(),
        ));
    }

    if config.registry.max_players == 0 {
        return Err(ConfigError::ValidationError(
            "Max players cannot be 0".to_string(),
        ));
    }

    if config.registry.sweep_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Registry sweep interval cannot be 0".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    if config.fetch.fake {
        tracing::info!(
            "Fetch: fake (chunk {}ms, full {}ms, delay {}ms)",
            config.fetch.fake_chunk_ms,
            config.fetch.fake_full_ms,
            config.fetch.fake_full_delay_ms
        );
    } else {
        tracing::info!("Fetch URL: {}", config.fetch.url);
        tracing::info!("Fetch Timeout: {}s", config.fetch.timeout_secs);
    }
    tracing::info!("Tracker Interval: {}ms", config.playback.tracker_interval_ms);
    tracing::info!("Scratch Directory: {:?}", config.storage.scratch_dir);
    tracing::info!("Max Players: {}", config.registry.max_players);
    tracing::info!("Player Idle Expire: {}s", config.registry.idle_expire_secs);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_empty_fetch_url_allowed_in_fake_mode() {
        let mut config = AppConfig::default();
        config.fetch.url = String::new();
        assert!(validate_config(&config).is_err());

        config.fetch.fake = true;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_tracker_interval() {
        let mut config = AppConfig::default();
        config.playback.tracker_interval_ms = 0;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[server]\nport = 6001\n\n[storage]\nscratch_dir = \"/tmp/lectio-scratch\""
        )
        .unwrap();

        let config = load_config_from_path(Some(file.path())).unwrap();
        assert_eq!(config.server.port, 6001);
        assert_eq!(
            config.storage.scratch_dir,
            std::path::PathBuf::from("/tmp/lectio-scratch")
        );
        assert_eq!(config.playback.tracker_interval_ms, 500);
    }
}
