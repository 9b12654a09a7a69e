use anyhow::{bail, Context};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// Path-addressed blob storage. Paths are relative, `/`-separated.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    async fn get_file(&self, path: &str) -> anyhow::Result<Vec<u8>>;
    async fn save_file(&self, path: &str, data: &[u8]) -> anyhow::Result<()>;
    async fn does_file_exist(&self, path: &str) -> anyhow::Result<bool>;
}

pub struct DiskStorageProvider {
    base_path: PathBuf,
}

impl DiskStorageProvider {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn resolve(&self, asset_path: &str) -> anyhow::Result<PathBuf> {
        let relative = Path::new(asset_path);
        if asset_path.is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_)))
        {
            bail!("Invalid asset path: {}", asset_path);
        }
        Ok(self.base_path.join(relative))
    }
}

#[async_trait]
impl StorageProvider for DiskStorageProvider {
    async fn get_file(&self, path: &str) -> anyhow::Result<Vec<u8>> {
        let full = self.resolve(path)?;
        fs::read(&full)
            .await
            .with_context(|| format!("Failed to read {}", full.display()))
    }

    async fn save_file(&self, path: &str, data: &[u8]) -> anyhow::Result<()> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&full, data)
            .await
            .with_context(|| format!("Failed to write {}", full.display()))?;
        tracing::debug!(path, bytes = data.len(), "saved file");
        Ok(())
    }

    async fn does_file_exist(&self, path: &str) -> anyhow::Result<bool> {
        let full = self.resolve(path)?;
        Ok(fs::try_exists(&full).await?)
    }
}
