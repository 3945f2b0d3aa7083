//! Memory Layer - In-Memory State Management
//!
//! 管理播放器实例的内存状态

mod player_registry;

pub use player_registry::{PlayerRegistry, RegistryError};
