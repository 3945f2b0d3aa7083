//! Application State

use std::sync::Arc;

use crate::infrastructure::memory::PlayerRegistry;

/// 应用状态
pub struct AppState {
    pub registry: Arc<PlayerRegistry>,
}

impl AppState {
    pub fn new(registry: Arc<PlayerRegistry>) -> Self {
        Self { registry }
    }
}
