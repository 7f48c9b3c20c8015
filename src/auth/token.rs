use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

use crate::error::{ClientError, Result};

/// Claims carried in the access token payload
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenClaims {
    /// Expiry as seconds since the epoch
    pub exp: i64,
    pub id: String,
}

impl TokenClaims {
    /// Reads the payload segment of a JWT. The signature is not checked.
    pub fn decode(token: &str) -> Result<Self> {
        let mut segments = token.split('.');
        let payload = match (segments.next(), segments.next(), segments.next()) {
            (Some(_), Some(payload), Some(_)) => payload,
            _ => return Err(ClientError::MalformedToken("expected three segments".to_string())),
        };
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| ClientError::MalformedToken(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::MalformedToken(e.to_string()))
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at() {
            Some(expiry) => expiry <= now,
            None => true,
        }
    }
}
