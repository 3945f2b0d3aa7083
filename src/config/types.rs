//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::application::playback::PlayerConfig;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 内容获取配置
    #[serde(default)]
    pub fetch: FetchConfig,

    /// 播放配置
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// 临时存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 播放器注册表配置
    #[serde(default)]
    pub registry: RegistryConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5070
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 内容获取配置
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// 渲染服务基础 URL
    #[serde(default = "default_fetch_url")]
    pub url: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,

    /// 使用本地生成的静音音频代替渲染服务（离线演示）
    #[serde(default)]
    pub fake: bool,

    /// fake 模式下预览片段时长（毫秒）
    #[serde(default = "default_fake_chunk_ms")]
    pub fake_chunk_ms: u64,

    /// fake 模式下完整音频时长（毫秒）
    #[serde(default = "default_fake_full_ms")]
    pub fake_full_ms: u64,

    /// fake 模式下完整音频的渲染耗时（毫秒）
    #[serde(default = "default_fake_full_delay_ms")]
    pub fake_full_delay_ms: u64,
}

fn default_fetch_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_fetch_timeout() -> u64 {
    120
}

fn default_fake_chunk_ms() -> u64 {
    3000
}

fn default_fake_full_ms() -> u64 {
    30000
}

fn default_fake_full_delay_ms() -> u64 {
    5000
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            url: default_fetch_url(),
            timeout_secs: default_fetch_timeout(),
            fake: false,
            fake_chunk_ms: default_fake_chunk_ms(),
            fake_full_ms: default_fake_full_ms(),
            fake_full_delay_ms: default_fake_full_delay_ms(),
        }
    }
}

/// 播放配置
#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackConfig {
    /// 位置轮询间隔（毫秒）
    #[serde(default = "default_tracker_interval")]
    pub tracker_interval_ms: u64,

    /// 每个播放器的命令队列容量
    #[serde(default = "default_command_buffer")]
    pub command_buffer: usize,
}

fn default_tracker_interval() -> u64 {
    500
}

fn default_command_buffer() -> usize {
    64
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tracker_interval_ms: default_tracker_interval(),
            command_buffer: default_command_buffer(),
        }
    }
}

impl PlaybackConfig {
    pub fn player_config(&self) -> PlayerConfig {
        PlayerConfig {
            tracker_interval: Duration::from_millis(self.tracker_interval_ms),
            command_buffer: self.command_buffer,
        }
    }
}

/// 临时存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// 片段临时文件目录
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,
}

fn default_scratch_dir() -> PathBuf {
    PathBuf::from("data/scratch")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            scratch_dir: default_scratch_dir(),
        }
    }
}

/// 播放器注册表配置
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    /// 最大播放器数量
    #[serde(default = "default_max_players")]
    pub max_players: usize,

    /// 播放器空闲过期时间（秒）
    #[serde(default = "default_idle_expire")]
    pub idle_expire_secs: u64,

    /// 过期清理间隔（秒）
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

fn default_max_players() -> usize {
    256
}

fn default_idle_expire() -> u64 {
    1800 // 30 分钟
}

fn default_sweep_interval() -> u64 {
    60
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_players: default_max_players(),
            idle_expire_secs: default_idle_expire(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.addr(), "0.0.0.0:5070");
        assert_eq!(config.fetch.url, "http://localhost:8000");
        assert!(!config.fetch.fake);
        assert_eq!(config.playback.tracker_interval_ms, 500);
        assert_eq!(config.storage.scratch_dir, PathBuf::from("data/scratch"));
        assert_eq!(config.registry.idle_expire_secs, 1800);
    }

    #[test]
    fn test_player_config_conversion() {
        let playback = PlaybackConfig {
            tracker_interval_ms: 250,
            command_buffer: 8,
        };
        let player = playback.player_config();
        assert_eq!(player.tracker_interval, Duration::from_millis(250));
        assert_eq!(player.command_buffer, 8);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [fetch]
            fake = true
            fake_full_delay_ms = 1200

            [playback]
            tracker_interval_ms = 200
            "#,
        )
        .unwrap();

        assert!(config.fetch.fake);
        assert_eq!(config.fetch.fake_full_delay_ms, 1200);
        assert_eq!(config.fetch.fake_chunk_ms, 3000);
        assert_eq!(config.playback.tracker_interval_ms, 200);
        assert_eq!(config.playback.command_buffer, 64);
        assert_eq!(config.server.port, 5070);
    }
}
