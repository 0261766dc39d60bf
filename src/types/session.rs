//! Session and server-time records returned by the token endpoints

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Access-token session as returned by the token issuance endpoint
///
/// Owned exclusively by the session manager; once expired it is replaced
/// wholesale by a fresh login, never patched in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// OAuth client id the token belongs to
    pub client_id: String,

    /// Short-lived bearer token
    pub access_token: String,

    /// Absolute expiry of the token in unix milliseconds
    pub access_token_expiration_timestamp_ms: i64,

    /// Whether the provider treated the request as anonymous
    pub is_anonymous: bool,

    /// Free-form notes the provider sometimes attaches
    #[serde(rename = "_notes", default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Whether the submitted TOTP version was already expired
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub totp_ver_expired: Option<String>,

    /// How long the submitted TOTP version remains accepted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub totp_valid_until: Option<String>,
}

impl Session {
    /// Check whether the token has passed its expiration timestamp
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp_millis() >= self.access_token_expiration_timestamp_ms
    }
}

/// Server-reported clock, `GET /api/server-time`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerTime {
    /// Unix seconds on the provider's clock
    pub server_time: i64,
}

impl ServerTime {
    /// Server clock in unix milliseconds, the unit the TOTP counter and the
    /// token request both expect
    pub fn as_millis(&self) -> i64 {
        self.server_time * 1000
    }
}
