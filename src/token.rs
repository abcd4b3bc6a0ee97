use crate::error::{LinkError, Result};
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::RngCore;

pub const TOKEN_PREFIX: &str = "sv_";
const RANDOM_BYTES: usize = 16;
const BASE36_DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Mints `sv_<32 hex chars>_<base36 unix millis>`.
///
/// The random part carries the unguessability; the suffix only keeps tokens
/// roughly sortable by creation time.
pub fn generate(now: DateTime<Utc>) -> String {
    let mut random = [0u8; RANDOM_BYTES];
    OsRng.fill_bytes(&mut random);
    let millis = u64::try_from(now.timestamp_millis()).unwrap_or_default();
    format!("{TOKEN_PREFIX}{}_{}", hex::encode(random), to_base36(millis))
}

/// Cheap namespace check performed before any store lookup.
pub fn validate(token: &str) -> Result<&str> {
    if token.starts_with(TOKEN_PREFIX) {
        Ok(token)
    } else {
        Err(LinkError::InvalidInput("Invalid secure ID format".into()))
    }
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".into();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36_DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}
