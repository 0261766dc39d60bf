//! Configuration settings structure
//!
//! Defines the main settings structure and loading logic for the session provider.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Pinned web-player client version, used whenever the live value has not
/// been extracted from the landing page yet.
pub const DEFAULT_CLIENT_VERSION: &str = "1.2.83.117.g3a8e4785";

/// Main configuration settings for the session provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Provider endpoint configuration
    pub endpoints: EndpointSettings,
    /// Secret mirror configuration
    pub secrets: SecretSettings,
    /// HTTP client configuration
    pub http: HttpSettings,
}

/// Provider endpoints used during login and bundle extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointSettings {
    /// Landing page of the web player
    pub home_url: String,
    /// Token issuance endpoint
    pub token_url: String,
    /// Server-reported clock endpoint
    pub server_time_url: String,
    /// CDN base path for web-player chunk files
    pub cdn_base_url: String,
}

/// Secret mirror list, queried concurrently on every resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretSettings {
    /// Mirror URLs in declaration order; on an exact version-key collision
    /// the later mirror wins.
    pub mirrors: Vec<String>,
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Per-request timeout in seconds, bounds every network call
    pub timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoints: EndpointSettings {
                home_url: "https://open.spotify.com/".to_string(),
                token_url: "https://open.spotify.com/api/token".to_string(),
                server_time_url: "https://open.spotify.com/api/server-time".to_string(),
                cdn_base_url: "https://open.spotifycdn.com/cdn/build/web-player/".to_string(),
            },
            secrets: SecretSettings {
                mirrors: vec![
                    "https://raw.githubusercontent.com/Thereallo1026/spotify-secrets/main/secrets/secretDict.json"
                        .to_string(),
                    "https://cdn.jsdelivr.net/gh/Thereallo1026/spotify-secrets@main/secrets/secretDict.json"
                        .to_string(),
                    "https://rawcdn.githack.com/Thereallo1026/spotify-secrets/main/secrets/secretDict.json"
                        .to_string(),
                ],
            },
            http: HttpSettings { timeout_secs: 30 },
        }
    }
}

impl Settings {
    /// Create new settings with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-request timeout as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }

    /// Load settings from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::Error::config(format!("Invalid TOML: {}", e)))
    }

    /// Load settings from environment variables on top of defaults
    pub fn from_env() -> crate::Result<Self> {
        Self::default().merge_with_env()
    }

    /// Apply environment variable overrides to these settings
    ///
    /// Recognized variables:
    /// - `SPOTIFY_SECRET_MIRRORS`: comma-separated mirror URL list
    /// - `SPOTIFY_HTTP_TIMEOUT`: per-request timeout in seconds
    pub fn merge_with_env(mut self) -> crate::Result<Self> {
        if let Ok(mirrors) = std::env::var("SPOTIFY_SECRET_MIRRORS") {
            self.secrets.mirrors = mirrors
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Ok(timeout) = std::env::var("SPOTIFY_HTTP_TIMEOUT") {
            self.http.timeout_secs = timeout
                .parse()
                .map_err(|e| crate::Error::config(format!("Invalid timeout: {}", e)))?;
        }

        Ok(self)
    }

    /// Validate the final configuration
    pub fn validate(&self) -> crate::Result<()> {
        for (name, value) in [
            ("home_url", &self.endpoints.home_url),
            ("token_url", &self.endpoints.token_url),
            ("server_time_url", &self.endpoints.server_time_url),
            ("cdn_base_url", &self.endpoints.cdn_base_url),
        ] {
            Url::parse(value)
                .map_err(|e| crate::Error::config(format!("Invalid {}: {}", name, e)))?;
        }

        if self.secrets.mirrors.is_empty() {
            return Err(crate::Error::config("At least one secret mirror required"));
        }
        for mirror in &self.secrets.mirrors {
            Url::parse(mirror)
                .map_err(|e| crate::Error::config(format!("Invalid mirror URL: {}", e)))?;
        }

        if self.http.timeout_secs == 0 {
            return Err(crate::Error::config("HTTP timeout must be non-zero"));
        }

        Ok(())
    }
}
