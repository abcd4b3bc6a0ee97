use crate::crypto::Codec;
use crate::error::ConfigError;
use crate::store::{FileLinkStore, LinkStore, MemoryLinkStore};
use crate::utils::get_env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

const DEFAULT_SERVER_ADDRESS: &str = "0.0.0.0:3000";
const DEFAULT_STORAGE_FILE: &str = "secure_links.json";
/// Top of every hour.
const DEFAULT_SWEEP_CRON: &str = "0 0 * * * *";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: SocketAddr,
    pub encryption_key: Option<String>,
    pub storage: StorageBackend,
    pub sweep_cron: String,
    pub admin_api_key_sha3: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(get_env)
    }

    /// Builds the configuration from any variable lookup; blank values count
    /// as unset.
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| var(name).filter(|value| !value.trim().is_empty());
        let var_or = |name: &str, default: &str| var(name).unwrap_or_else(|| default.to_string());

        let address = var_or("SERVER_ADDRESS", DEFAULT_SERVER_ADDRESS);
        let server_address = address
            .parse()
            .map_err(|err| ConfigError::InvalidAddress(address.clone(), err))?;

        let storage = match var_or("STORAGE_BACKEND", "file").to_lowercase().as_str() {
            "memory" => StorageBackend::Memory,
            "file" => StorageBackend::File(var_or("STORAGE_FILE", DEFAULT_STORAGE_FILE).into()),
            other => return Err(ConfigError::UnknownBackend(other.to_string())),
        };

        Ok(Self {
            server_address,
            encryption_key: var("ENCRYPTION_KEY"),
            storage,
            sweep_cron: var_or("SWEEP_CRON", DEFAULT_SWEEP_CRON),
            admin_api_key_sha3: var("ADMIN_API_KEY_SHA3").map(|hash| hash.trim().to_lowercase()),
        })
    }

    pub fn codec(&self) -> Codec {
        match &self.encryption_key {
            Some(key) => Codec::new(key),
            None => Codec::insecure_default(),
        }
    }

    pub fn store(&self) -> Arc<dyn LinkStore> {
        match &self.storage {
            StorageBackend::Memory => Arc::new(MemoryLinkStore::new()),
            StorageBackend::File(path) => Arc::new(FileLinkStore::new(path.clone())),
        }
    }
}
