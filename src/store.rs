pub mod file;
pub mod memory;

pub use file::FileLinkStore;
pub use memory::MemoryLinkStore;

use crate::error::StoreError;
use crate::model::LinkMap;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Persistence contract for the whole token -> record mapping.
///
/// The engine serializes all read-modify-write cycles itself, so backends
/// only need to make a single `load` or `save` consistent.
#[async_trait]
pub trait LinkStore: Send + Sync + 'static {
    async fn load(&self) -> Result<LinkMap, StoreError>;

    async fn save(&self, links: &LinkMap) -> Result<(), StoreError>;
}

/// Returns only the records that are still live at `now`.
pub fn sweep_expired(links: &LinkMap, now: DateTime<Utc>) -> LinkMap {
    links
        .iter()
        .filter(|(_, record)| !record.is_expired(now))
        .map(|(token, record)| (token.clone(), record.clone()))
        .collect()
}
