//! Link lifecycle: create, redeem, inspect, delete, list and sweep.
//!
//! Every operation that reads the mapping in order to write it back runs
//! under `guard`, so concurrent redemptions of one token can neither lose an
//! increment nor resurrect a record that a concurrent delete removed.

use crate::clock::{Clock, SystemClock};
use crate::crypto::Codec;
use crate::error::{LinkError, Result, StoreError};
use crate::model::{
    CreatedLink, LinkList, LinkMap, LinkMetadata, LinkRecord, RedeemedLink,
};
use crate::store::{sweep_expired, LinkStore};
use crate::token;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use url::Url;

const TOKEN_GENERATION_ATTEMPTS: u32 = 5;

pub struct LinkEngine {
    store: Arc<dyn LinkStore>,
    codec: Codec,
    clock: Arc<dyn Clock>,
    guard: Mutex<()>,
}

impl LinkEngine {
    pub fn new(store: Arc<dyn LinkStore>, codec: Codec) -> Self {
        Self::with_clock(store, codec, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn LinkStore>, codec: Codec, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            codec,
            clock,
            guard: Mutex::new(()),
        }
    }

    pub async fn create(&self, url: &str, expiry: Option<Duration>) -> Result<CreatedLink> {
        Url::parse(url).map_err(|_| LinkError::InvalidInput("Invalid URL format".into()))?;

        let _guard = self.guard.lock().await;
        let now = self.clock.now();
        let expires_at = match expiry.filter(|expiry| *expiry > Duration::zero()) {
            Some(expiry) => Some(
                now.checked_add_signed(expiry)
                    .ok_or_else(|| LinkError::InvalidInput("Invalid expiry".into()))?,
            ),
            None => None,
        };

        let (mut links, _) = self.load_swept(now).await?;
        let token = Self::unused_token(&links, now)?;
        let record = LinkRecord {
            token: token.clone(),
            encrypted_payload: self.codec.encrypt(url),
            created_at: now,
            expires_at,
            access_count: 0,
            last_accessed_at: None,
        };
        links.insert(token.clone(), record);
        self.store.save(&links).await?;

        match expires_at {
            Some(expires_at) => tracing::info!("Created secure link: {} (expires: {})", token, expires_at),
            None => tracing::info!("Created secure link: {} (expires: never)", token),
        }
        Ok(CreatedLink { token, expires_at })
    }

    pub async fn redeem(&self, token: &str) -> Result<RedeemedLink> {
        let token = token::validate(token)?;

        let _guard = self.guard.lock().await;
        let now = self.clock.now();
        let mut links = self.store.load().await?;
        // resolve the requested record before pruning, so a lapsed token
        // reports Expired instead of NotFound
        let target = links.remove(token);
        let before = links.len();
        let mut links = sweep_expired(&links, now);
        let pruned = before - links.len();

        let Some(mut record) = target else {
            self.persist_pruned(&links, pruned).await;
            return Err(LinkError::NotFound);
        };

        if record.is_expired(now) {
            self.store.save(&links).await?;
            tracing::info!("Removed expired secure link: {}", token);
            return Err(LinkError::Expired);
        }

        let url = match self.codec.decrypt(&record.encrypted_payload) {
            Ok(url) => url,
            Err(err) => {
                tracing::error!("Failed to decrypt secure link {}: {}", token, err);
                links.insert(token.to_owned(), record);
                self.persist_pruned(&links, pruned).await;
                return Err(LinkError::DecryptionFailure);
            }
        };

        record.access_count += 1;
        record.last_accessed_at = Some(now);
        let redeemed = RedeemedLink {
            url,
            expires_at: record.expires_at,
            access_count: record.access_count,
        };
        links.insert(token.to_owned(), record);
        self.store.save(&links).await?;

        tracing::info!(
            "Served secure link: {} (access count: {})",
            token,
            redeemed.access_count
        );
        Ok(redeemed)
    }

    /// Reads a record's metadata without touching the store or the payload.
    pub async fn inspect(&self, token: &str) -> Result<LinkMetadata> {
        let token = token::validate(token)?;
        let now = self.clock.now();
        let links = self.store.load().await?;
        links
            .get(token)
            .map(|record| record.metadata(now))
            .ok_or(LinkError::NotFound)
    }

    pub async fn delete(&self, token: &str) -> Result<()> {
        let token = token::validate(token)?;

        let _guard = self.guard.lock().await;
        let now = self.clock.now();
        let (mut links, pruned) = self.load_swept(now).await?;
        if links.remove(token).is_none() {
            self.persist_pruned(&links, pruned).await;
            return Err(LinkError::NotFound);
        }
        self.store.save(&links).await?;

        tracing::info!("Deleted secure link: {}", token);
        Ok(())
    }

    pub async fn list(&self) -> Result<LinkList> {
        let _guard = self.guard.lock().await;
        let now = self.clock.now();
        let (links, pruned) = self.load_swept(now).await?;
        self.persist_pruned(&links, pruned).await;

        let mut metadata: Vec<LinkMetadata> =
            links.values().map(|record| record.metadata(now)).collect();
        metadata.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.token.cmp(&b.token))
        });
        Ok(LinkList {
            total_count: metadata.len(),
            links: metadata,
        })
    }

    /// Purges every expired record and persists the result. Returns how many
    /// records were removed.
    pub async fn sweep(&self) -> Result<usize> {
        let _guard = self.guard.lock().await;
        let now = self.clock.now();
        let links = self.store.load().await?;
        let swept = sweep_expired(&links, now);
        let pruned = links.len() - swept.len();
        if pruned > 0 {
            for token in links.keys().filter(|token| !swept.contains_key(*token)) {
                tracing::info!("Cleaned expired link: {}", token);
            }
            self.store.save(&swept).await?;
        }
        Ok(pruned)
    }

    async fn load_swept(&self, now: DateTime<Utc>) -> Result<(LinkMap, usize), StoreError> {
        let links = self.store.load().await?;
        let swept = sweep_expired(&links, now);
        let pruned = links.len() - swept.len();
        Ok((swept, pruned))
    }

    /// Best-effort write-back of a pruned mapping on paths that otherwise
    /// would not persist anything.
    async fn persist_pruned(&self, links: &LinkMap, pruned: usize) {
        if pruned == 0 {
            return;
        }
        match self.store.save(links).await {
            Ok(()) => tracing::debug!("Pruned {} expired links", pruned),
            Err(err) => tracing::warn!("Saving pruned links failed: {}", err),
        }
    }

    fn unused_token(links: &LinkMap, now: DateTime<Utc>) -> Result<String, StoreError> {
        for _ in 0..TOKEN_GENERATION_ATTEMPTS {
            let token = token::generate(now);
            if !links.contains_key(&token) {
                return Ok(token);
            }
        }
        tracing::error!("Could not create secure link. Exhausted all retries of generating a unique token");
        Err(StoreError::TokenExhausted(TOKEN_GENERATION_ATTEMPTS))
    }
}
