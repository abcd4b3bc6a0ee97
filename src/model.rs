use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

pub type LinkMap = HashMap<String, LinkRecord>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkRecord {
    pub token: String,
    pub encrypted_payload: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub access_count: u64,
    pub last_accessed_at: Option<DateTime<Utc>>,
}

impl LinkRecord {
    /// A record whose expiry is at or before `now` is logically gone.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }

    pub fn metadata(&self, now: DateTime<Utc>) -> LinkMetadata {
        LinkMetadata {
            token: self.token.clone(),
            created_at: self.created_at,
            expires_at: self.expires_at,
            access_count: self.access_count,
            last_accessed_at: self.last_accessed_at,
            is_expired: self.is_expired(now),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedLink {
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemedLink {
    pub url: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub access_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkMetadata {
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub access_count: u64,
    pub last_accessed_at: Option<DateTime<Utc>>,
    pub is_expired: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkList {
    pub links: Vec<LinkMetadata>,
    pub total_count: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkSpecification {
    pub url: Option<Value>,
    pub expiry_hours: Option<f64>,
}

impl LinkSpecification {
    /// The destination as submitted. Absent, null or empty is "required";
    /// any non-string JSON value is a malformed URL.
    pub fn url(&self) -> Result<&str, &'static str> {
        match &self.url {
            None | Some(Value::Null) => Err("URL is required"),
            Some(Value::String(url)) if url.is_empty() => Err("URL is required"),
            Some(Value::String(url)) => Ok(url),
            Some(_) => Err("Invalid URL format"),
        }
    }

    /// Converts `expiryHours` into a lifetime. Zero, negative or missing hours
    /// mean the link never expires.
    pub fn expiry(&self) -> Result<Option<Duration>, String> {
        let Some(hours) = self.expiry_hours else {
            return Ok(None);
        };
        if !hours.is_finite() {
            return Err("Invalid expiry".into());
        }
        if hours <= 0.0 {
            return Ok(None);
        }
        let millis = (hours * 3_600_000.0).round();
        if millis >= i64::MAX as f64 {
            return Err("Invalid expiry".into());
        }
        Duration::try_milliseconds(millis as i64)
            .map(Some)
            .ok_or_else(|| "Invalid expiry".into())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkResponse {
    #[serde(flatten)]
    pub link: CreatedLink,
    pub message: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemQuery {
    pub secure_id: Option<String>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}
