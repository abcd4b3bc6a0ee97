use thiserror::Error;

pub type Result<T, E = LinkError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("Secure link not found")]
    NotFound,
    #[error("Secure link has expired")]
    Expired,
    #[error("Failed to decrypt URL")]
    DecryptionFailure,
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("could not allocate a unique token after {0} attempts")]
    TokenExhausted(u32),
}

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("payload is not of the form <iv>:<ciphertext>")]
    MalformedPayload,
    #[error("payload is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("ciphertext could not be decrypted")]
    BadCiphertext,
    #[error("decrypted plaintext is not valid utf-8")]
    InvalidUtf8,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown storage backend: {0}")]
    UnknownBackend(String),
    #[error("invalid server address {0}: {1}")]
    InvalidAddress(String, std::net::AddrParseError),
}
