//! Server-side configuration embedded in the web-player landing page
//!
//! The landing page carries a base64 JSON blob inside a marked script tag.
//! The provider reshuffles this record between releases, so every field is
//! optional and unknown fields are ignored.

use serde::{Deserialize, Serialize};

/// Decoded `appServerConfig` record from the landing page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppServerConfig {
    /// Live client version string, e.g. `1.2.83.117.g3a8e4785`
    pub client_version: Option<String>,

    /// Build version identifier
    pub build_version: Option<String>,

    /// ISO build date, e.g. `2026-01-27`
    pub build_date: Option<String>,

    /// Storefront market code
    pub market: Option<String>,

    /// Country the provider geolocated the request to
    pub user_country: Option<String>,

    /// Whether the landing-page request was treated as anonymous
    pub is_anonymous: Option<bool>,

    /// Whether the account carries a premium subscription
    pub is_premium: Option<bool>,

    /// Per-request correlation id
    pub correlation_id: Option<String>,

    /// Server clock at page render, unix seconds
    pub server_time: Option<i64>,

    /// Locale block
    pub locale: Option<LocaleConfig>,
}

/// Locale sub-record of [`AppServerConfig`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocaleConfig {
    /// BCP 47-ish locale tag
    pub locale: Option<String>,

    /// Whether the locale renders right-to-left
    pub rtl: Option<bool>,

    /// Text direction, `ltr` or `rtl`
    pub text_direction: Option<String>,
}
