//! Fetch Adapter - 内容音频获取实现

mod fake_content_fetcher;
mod http_content_fetcher;

pub use fake_content_fetcher::{silent_wav, FakeContentFetcher};
pub use http_content_fetcher::*;
