use crate::error::StoreError;
use crate::model::LinkMap;
use crate::store::LinkStore;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Persists the mapping as a pretty printed JSON document keyed by token.
#[derive(Debug, Clone)]
pub struct FileLinkStore {
    path: PathBuf,
}

impl FileLinkStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temporary_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl LinkStore for FileLinkStore {
    async fn load(&self) -> Result<LinkMap, StoreError> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(LinkMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    async fn save(&self, links: &LinkMap) -> Result<(), StoreError> {
        let document = serde_json::to_vec_pretty(links)?;
        let temporary = self.temporary_path();
        if let Err(err) = write_then_rename(&temporary, &self.path, &document).await {
            if let Err(cleanup) = fs::remove_file(&temporary).await {
                if cleanup.kind() != ErrorKind::NotFound {
                    tracing::warn!("Removing {} failed: {}", temporary.display(), cleanup);
                }
            }
            return Err(err.into());
        }
        Ok(())
    }
}

async fn write_then_rename(temporary: &Path, target: &Path, document: &[u8]) -> std::io::Result<()> {
    fs::write(temporary, document).await?;
    fs::rename(temporary, target).await
}
