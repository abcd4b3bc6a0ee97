//! AES-256-CBC encryption of destination URLs at rest.
//!
//! Payloads are `<hex iv>:<hex ciphertext>`. Every call to [`Codec::encrypt`]
//! draws a fresh IV and the cipher is initialised with exactly that IV;
//! [`Codec::decrypt`] reads it back from the payload.

use crate::error::CryptoError;
use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::rngs::OsRng;
use rand::RngCore;
use sha3::{Digest, Sha3_256};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Key used when no secret is configured. Only fit for local testing.
pub const DEFAULT_ENCRYPTION_KEY: &str = "default-key-change-in-production";

pub const IV_LEN: usize = 16;
const KEY_LEN: usize = 32;
const SEPARATOR: char = ':';

#[derive(Clone)]
pub struct Codec {
    key: [u8; KEY_LEN],
}

impl Codec {
    /// Derives the AES key as the SHA3-256 digest of `secret`.
    pub fn new(secret: &str) -> Self {
        let mut hasher = Sha3_256::new();
        hasher.update(secret.as_bytes());
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(&hasher.finalize());
        Self { key }
    }

    pub fn insecure_default() -> Self {
        tracing::warn!(
            "ENCRYPTION_KEY is not set, falling back to the built-in default key. \
             Stored URLs are NOT confidential; never run like this in production"
        );
        Self::new(DEFAULT_ENCRYPTION_KEY)
    }

    pub fn encrypt(&self, plaintext: &str) -> String {
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);
        let ciphertext = Aes256CbcEnc::new(&self.key.into(), &iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
        format!("{}{}{}", hex::encode(iv), SEPARATOR, hex::encode(ciphertext))
    }

    pub fn decrypt(&self, payload: &str) -> Result<String, CryptoError> {
        let (iv_hex, ciphertext_hex) = payload
            .split_once(SEPARATOR)
            .ok_or(CryptoError::MalformedPayload)?;
        let iv: [u8; IV_LEN] = hex::decode(iv_hex)?
            .try_into()
            .map_err(|_| CryptoError::MalformedPayload)?;
        let ciphertext = hex::decode(ciphertext_hex)?;
        if ciphertext.is_empty() {
            return Err(CryptoError::MalformedPayload);
        }
        let plaintext = Aes256CbcDec::new(&self.key.into(), &iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
            .map_err(|_| CryptoError::BadCiphertext)?;
        String::from_utf8(plaintext).map_err(|_| CryptoError::InvalidUtf8)
    }
}

impl std::fmt::Debug for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codec").finish_non_exhaustive()
    }
}
