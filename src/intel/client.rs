//! The long-lived bundle intelligence client
//!
//! One [`BundleIntel`] instance owns the fetched landing-page config, the
//! located main bundle URL and the concatenated bundle text. There is no
//! ambient or static state, so independent instances never interfere.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures::future::join_all;
use reqwest::Client;
use reqwest::header::HeaderMap;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::Settings;
use crate::config::settings::DEFAULT_CLIENT_VERSION;
use crate::intel::extract;
use crate::types::AppServerConfig;
use crate::{Error, Result, headers};

/// Reverse-extracts persisted-operation hashes and session metadata from
/// the provider's live web-player bundle
#[derive(Debug)]
pub struct BundleIntel {
    /// HTTP client with the landing-page header set baked in
    client: Client,
    /// Endpoint configuration
    settings: Settings,
    /// Parsed server config from the landing page, when present
    server_config: Option<AppServerConfig>,
    /// URL of the main web-player bundle
    bundle_url: Option<String>,
    /// Concatenated main bundle + chunk text; lookups are substring
    /// searches over this buffer, O(buffer) per lookup by design
    bundle_text: Option<String>,
}

impl BundleIntel {
    /// Create a new intel client against the configured endpoints
    pub fn new(settings: Settings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .default_headers(headers::page_headers())
            .build()
            .map_err(Error::Network)?;

        Ok(Self {
            client,
            settings,
            server_config: None,
            bundle_url: None,
            bundle_text: None,
        })
    }

    /// Fetch the landing page, locate the main bundle and pick up the
    /// server config blob
    ///
    /// A missing or undecodable config blob is tolerated; the config just
    /// stays unset. A missing main-bundle link is only fatal later, when a
    /// hash lookup actually needs the bundle.
    pub async fn get_session(&mut self) -> Result<()> {
        let html = fetch_text(&self.client, &self.settings.endpoints.home_url)
            .await
            .map_err(|e| Error::bundle_format(format!("landing page fetch failed: {}", e)))?;

        let links = extract::extract_script_links(&html);
        debug!("Landing page carries {} script link(s)", links.len());

        match extract::find_main_bundle(&links) {
            Some(link) => {
                // Links may be relative to the landing page
                let absolute = Url::parse(&self.settings.endpoints.home_url)
                    .and_then(|base| base.join(link))
                    .map_err(|e| Error::bundle_format(format!("bad bundle link: {}", e)))?;
                info!("Located main web-player bundle: {}", absolute);
                self.bundle_url = Some(absolute.into());
            }
            None => warn!("No main web-player bundle link on the landing page"),
        }

        match extract::extract_config_blob(&html) {
            Some(blob) => match BASE64.decode(blob) {
                Ok(decoded) => match serde_json::from_slice::<AppServerConfig>(&decoded) {
                    Ok(config) => {
                        debug!(
                            "Parsed server config, client version {:?}",
                            config.client_version
                        );
                        self.server_config = Some(config);
                    }
                    Err(e) => warn!("Server config blob is not valid JSON: {}", e),
                },
                Err(e) => warn!("Server config blob is not valid base64: {}", e),
            },
            None => debug!("Landing page carries no server config blob"),
        }

        Ok(())
    }

    /// Current client version string
    ///
    /// With `use_latest` the live value is taken from the landing page,
    /// fetching it on first need; without it, or when the page carries no
    /// config, the pinned [`DEFAULT_CLIENT_VERSION`] is returned.
    pub async fn client_version(&mut self, use_latest: bool) -> Result<String> {
        if !use_latest {
            return Ok(DEFAULT_CLIENT_VERSION.to_string());
        }

        if self.server_config.is_none() {
            self.get_session().await?;
        }

        Ok(self
            .server_config
            .as_ref()
            .and_then(|config| config.client_version.clone())
            .unwrap_or_else(|| DEFAULT_CLIENT_VERSION.to_string()))
    }

    /// API header set carrying the current client version
    pub async fn api_headers(&mut self, use_latest: bool) -> Result<HeaderMap> {
        let version = self.client_version(use_latest).await?;
        Ok(headers::api_headers(&version))
    }

    /// Parsed server config, if the landing page carried one
    pub fn server_config(&self) -> Option<&AppServerConfig> {
        self.server_config.as_ref()
    }

    /// Resolve an operation name to its current persisted hash
    ///
    /// Lazy: the bundle and its chunks are fetched and concatenated on the
    /// first lookup and reused for the lifetime of this instance. The name
    /// is searched in the query namespace first, then mutation.
    ///
    /// # Errors
    ///
    /// - [`Error::BundleFormatChanged`] when the bundle cannot be located
    ///   or its mapping tables no longer parse
    /// - [`Error::OperationHashNotFound`] when the name is absent from
    ///   both namespaces
    pub async fn resolve_operation_hash(&mut self, name: &str) -> Result<String> {
        self.ensure_bundle_text().await?;
        let text = self
            .bundle_text
            .as_deref()
            .ok_or_else(|| Error::bundle_format("bundle text unavailable"))?;

        extract::find_operation_hash(text, name, "query")
            .or_else(|| extract::find_operation_hash(text, name, "mutation"))
            .inspect(|hash| debug!("Resolved hash for {}: {}", name, hash))
            .ok_or_else(|| Error::hash_not_found(name))
    }

    /// Fetch and concatenate the main bundle and all of its chunk files
    async fn ensure_bundle_text(&mut self) -> Result<()> {
        if self.bundle_text.is_some() {
            return Ok(());
        }

        if self.bundle_url.is_none() {
            self.get_session().await?;
        }
        let bundle_url = self
            .bundle_url
            .clone()
            .ok_or_else(|| Error::bundle_format("main web-player bundle not located"))?;

        let mut buffer = fetch_text(&self.client, &bundle_url)
            .await
            .map_err(|e| Error::bundle_format(format!("bundle fetch failed: {}", e)))?;

        let (hashes, names) = extract::extract_mappings(&buffer)?;
        let files = extract::combine_chunks(&names, &hashes);
        info!("Reconstructed {} chunk file name(s)", files.len());

        let cdn_base = Url::parse(&self.settings.endpoints.cdn_base_url)
            .map_err(|e| Error::config(format!("Invalid CDN base: {}", e)))?;

        let client = &self.client;
        let fetches = files.iter().filter_map(|file| {
            let url = cdn_base.join(file).ok()?;
            Some(async move { (file.clone(), fetch_text(client, url.as_str()).await) })
        });

        // Best effort: a failing chunk is skipped, ordering is irrelevant
        // since the buffer is only ever substring-searched
        for (file, outcome) in join_all(fetches).await {
            match outcome {
                Ok(text) => buffer.push_str(&text),
                Err(e) => warn!("Failed to fetch chunk {}: {}", file, e),
            }
        }

        self.bundle_text = Some(buffer);
        Ok(())
    }
}

/// GET a URL and return its body as text, treating HTTP error statuses as
/// failures
async fn fetch_text(client: &Client, url: &str) -> Result<String> {
    Ok(client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?)
}
