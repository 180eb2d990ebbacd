use anyhow::Result;
use async_trait::async_trait;

pub mod file;
pub mod memory;

pub use file::FileArchive;
pub use memory::MemoryArchive;

/// Where a world's encoded disguise data lives between runs.
#[async_trait]
pub trait DisguiseArchive: Send + Sync {
    /// Replace the stored blob.
    async fn save(&self, data: &[u8]) -> Result<()>;

    /// `Ok(None)` when nothing has been saved yet (fresh world).
    async fn load(&self) -> Result<Option<Vec<u8>>>;
}
