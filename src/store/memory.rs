use crate::error::StoreError;
use crate::model::LinkMap;
use crate::store::LinkStore;
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Keeps the mapping in process memory. Every instance starts empty and is
/// independent of every other instance.
#[derive(Debug, Default)]
pub struct MemoryLinkStore {
    links: RwLock<LinkMap>,
}

impl MemoryLinkStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LinkStore for MemoryLinkStore {
    async fn load(&self) -> Result<LinkMap, StoreError> {
        Ok(self.links.read().await.clone())
    }

    async fn save(&self, links: &LinkMap) -> Result<(), StoreError> {
        *self.links.write().await = links.clone();
        Ok(())
    }
}
