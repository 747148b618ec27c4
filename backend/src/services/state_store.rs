use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Opaque blob storage for state kept between sessions.
pub trait StateStore: Send + Sync {
    fn save(&self, blob: &[u8]) -> Result<()>;

    /// `None` when nothing has been saved yet.
    fn load(&self) -> Result<Option<Vec<u8>>>;
}

pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl StateStore for FileStateStore {
    fn save(&self, blob: &[u8]) -> Result<()> {
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, blob)
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }

    fn load(&self) -> Result<Option<Vec<u8>>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let blob = fs::read(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        Ok(Some(blob))
    }
}
