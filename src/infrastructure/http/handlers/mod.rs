//! HTTP Handlers

mod ping;
mod player;
mod websocket;

pub use ping::*;
pub use player::*;
pub use websocket::*;
