use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;

use crate::DisguiseArchive;

/// Keeps the blob in memory. For tests and hosts without a save folder.
#[derive(Default)]
pub struct MemoryArchive {
    data: Mutex<Option<Vec<u8>>>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            data: Mutex::new(Some(data)),
        }
    }

    pub fn contents(&self) -> Option<Vec<u8>> {
        self.data.lock().clone()
    }
}

#[async_trait]
impl DisguiseArchive for MemoryArchive {
    async fn save(&self, data: &[u8]) -> Result<()> {
        *self.data.lock() = Some(data.to_vec());
        Ok(())
    }

    async fn load(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.data.lock().clone())
    }
}
