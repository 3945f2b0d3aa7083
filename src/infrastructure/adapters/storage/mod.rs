//! Storage Adapter - 临时片段文件存储

mod scratch_storage;

pub use scratch_storage::FileScratchStorage;
