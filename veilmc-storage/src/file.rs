use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::DisguiseArchive;

/// One file per world save folder: `<world>/<mod_id>_data.dat`.
pub struct FileArchive {
    path: PathBuf,
}

impl FileArchive {
    pub fn new(world_folder: impl AsRef<Path>, mod_id: &str) -> Self {
        Self {
            path: world_folder.as_ref().join(format!("{mod_id}_data.dat")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("dat.tmp")
    }
}

#[async_trait]
impl DisguiseArchive for FileArchive {
    async fn save(&self, data: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        // Write beside the target and rename so a crash never leaves half a file.
        let temp = self.temp_path();
        tokio::fs::write(&temp, data)
            .await
            .with_context(|| format!("Failed to write {}", temp.display()))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .with_context(|| format!("Failed to move {} into place", temp.display()))?;

        log::debug!("Saved {} bytes of disguise data to {}", data.len(), self.path.display());
        Ok(())
    }

    async fn load(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("{} not found. Assuming world creation", self.path.display());
                Ok(None)
            }
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", self.path.display())),
        }
    }
}
