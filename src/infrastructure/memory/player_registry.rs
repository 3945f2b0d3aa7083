//! In-Memory Player Registry
//!
//! 按 player_id 保存播放器实例，记录最近活动时间，空闲过久的播放器由
//! 后台清理任务关闭

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::application::playback::{PlayerConfig, PlayerDeps, ProgressivePlayer};

/// 注册表错误
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Player not found: {0}")]
    NotFound(String),

    #[error("Player limit reached: {0}")]
    LimitReached(usize),
}

struct PlayerEntry {
    player: Arc<ProgressivePlayer>,
    last_activity: DateTime<Utc>,
}

/// 播放器注册表
pub struct PlayerRegistry {
    players: DashMap<String, PlayerEntry>,
    config: PlayerConfig,
    deps: PlayerDeps,
    max_players: usize,
}

impl PlayerRegistry {
    pub fn new(config: PlayerConfig, deps: PlayerDeps, max_players: usize) -> Self {
        Self {
            players: DashMap::new(),
            config,
            deps,
            max_players,
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 创建播放器，返回 player_id
    pub fn create(&self) -> Result<String, RegistryError> {
        if self.players.len() >= self.max_players {
            return Err(RegistryError::LimitReached(self.max_players));
        }

        let player_id = Uuid::new_v4().to_string();
        let player = ProgressivePlayer::spawn(self.config.clone(), self.deps.clone());
        self.players.insert(
            player_id.clone(),
            PlayerEntry {
                player: Arc::new(player),
                last_activity: Utc::now(),
            },
        );

        tracing::info!(player_id = %player_id, "Player created");
        Ok(player_id)
    }

    /// 获取播放器并刷新活动时间
    pub fn get(&self, id: &str) -> Result<Arc<ProgressivePlayer>, RegistryError> {
        let mut entry = self
            .players
            .get_mut(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        entry.last_activity = Utc::now();
        Ok(entry.player.clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.players.contains_key(id)
    }

    /// 关闭并移除播放器，会话资源在返回前释放
    pub async fn close(&self, id: &str) -> Result<(), RegistryError> {
        let (_, entry) = self
            .players
            .remove(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;

        if let Err(e) = entry.player.shutdown().await {
            tracing::debug!(player_id = %id, error = %e, "Player already stopped");
        }
        tracing::info!(player_id = %id, "Player closed");
        Ok(())
    }

    /// 空闲超过指定秒数的播放器
    ///
    /// 正在播放或加载的播放器不算空闲，长音频播放期间不会有控制请求
    pub fn expired_players(&self, idle_timeout_secs: u64) -> Vec<String> {
        let now = Utc::now();
        let timeout = chrono::Duration::seconds(idle_timeout_secs as i64);

        self.players
            .iter()
            .filter_map(|entry| {
                let elapsed = now - entry.last_activity;
                let state = entry.player.status().state;
                if state.is_playing() || state.is_loading() {
                    return None;
                }
                if elapsed > timeout {
                    Some(entry.key().clone())
                } else {
                    None
                }
            })
            .collect()
    }

    /// 关闭所有空闲超时的播放器，返回关闭数量
    pub async fn sweep_expired(&self, idle_timeout_secs: u64) -> usize {
        let expired = self.expired_players(idle_timeout_secs);
        let mut closed = 0;
        for id in expired {
            if self.close(&id).await.is_ok() {
                closed += 1;
            }
        }
        if closed > 0 {
            tracing::info!(closed = closed, "Expired players swept");
        }
        closed
    }

    /// 关闭所有播放器
    pub async fn close_all(&self) {
        for id in self.list_all() {
            let _ = self.close(&id).await;
        }
    }

    pub fn list_all(&self) -> Vec<String> {
        self.players.iter().map(|e| e.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    #[cfg(test)]
    fn backdate(&self, id: &str, secs: i64) {
        if let Some(mut entry) = self.players.get_mut(id) {
            entry.last_activity = Utc::now() - chrono::Duration::seconds(secs);
        }
    }
}
