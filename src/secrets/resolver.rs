//! Secret mirror fetching, merging and deobfuscation

use std::collections::{BTreeMap, HashMap};

use futures::future::join_all;
use reqwest::Client;
use tracing::{debug, warn};

use crate::{Error, Result, config::Settings};

/// A secret version resolved to its raw HMAC key bytes
///
/// Created once per login attempt and discarded after use; a mirror may
/// rotate between calls, so nothing is cached across resolutions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSecret {
    /// Version number submitted alongside the code as `totpVer`
    pub version: u32,
    /// Raw HMAC-SHA1 key bytes
    pub key: Vec<u8>,
}

/// Resolves the current TOTP secret from the configured mirrors
#[derive(Debug)]
pub struct SecretResolver {
    /// HTTP client, bounded by the configured timeout
    client: Client,
    /// Mirror URLs in declaration order
    mirrors: Vec<String>,
}

impl SecretResolver {
    /// Create a resolver from the configured mirror list
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(Error::Network)?;
        Ok(Self::with_client(client, settings.secrets.mirrors.clone()))
    }

    /// Create a resolver around an existing client and mirror list
    pub fn with_client(client: Client, mirrors: Vec<String>) -> Self {
        Self { client, mirrors }
    }

    /// Resolve the newest secret version across all mirrors
    ///
    /// All mirrors are fetched concurrently and awaited jointly; one
    /// mirror's failure or timeout never cancels the others, and the merge
    /// happens only after every fetch has settled, since a single mirror
    /// may be version-incomplete. On an exact version-key collision the
    /// later-declared mirror wins.
    ///
    /// # Errors
    ///
    /// [`Error::SecretUnavailable`] when every mirror is unreachable or
    /// unparseable, or the merged version table ends up empty.
    pub async fn resolve(&self) -> Result<ResolvedSecret> {
        let fetches = self.mirrors.iter().map(|url| self.fetch_mirror(url));
        let settled = join_all(fetches).await;

        let mut merged: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
        let mut reachable = 0usize;
        for (url, outcome) in self.mirrors.iter().zip(settled) {
            match outcome {
                Ok(table) => {
                    debug!("Mirror {} returned {} version(s)", url, table.len());
                    reachable += 1;
                    merged.extend(table);
                }
                Err(e) => warn!("Secret mirror {} failed: {}", url, e),
            }
        }

        if reachable == 0 {
            return Err(Error::secret_unavailable("every secret mirror failed"));
        }

        let (version, digits) = merged
            .iter()
            .next_back()
            .map(|(v, d)| (*v, d.clone()))
            .ok_or_else(|| Error::secret_unavailable("merged secret table is empty"))?;

        let key = deobfuscate(&digits)?;
        debug!("Resolved secret version {} ({} key bytes)", version, key.len());
        Ok(ResolvedSecret { version, key })
    }

    /// Fetch and parse one mirror's version table
    ///
    /// Mirror payload shape: a JSON object mapping decimal-string version
    /// numbers to arrays of obfuscated digits. Non-numeric keys are skipped.
    async fn fetch_mirror(&self, url: &str) -> Result<BTreeMap<u32, Vec<u32>>> {
        let raw: HashMap<String, Vec<u32>> = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut table = BTreeMap::new();
        for (key, digits) in raw {
            match key.parse::<u32>() {
                Ok(version) => {
                    table.insert(version, digits);
                }
                Err(_) => warn!("Mirror {} carries non-numeric version key {:?}", url, key),
            }
        }
        Ok(table)
    }
}

/// Deobfuscate a mirror digit sequence into raw HMAC key bytes
///
/// The provider's obfuscation round-trips the secret through a textual/hex
/// detour; both stages must be reproduced exactly or every generated code
/// will be rejected:
/// 1. XOR digit `i` with `(i % 33) + 9`.
/// 2. Concatenate the results as decimal text, no per-element padding.
/// 3. Hex-encode that text's UTF-8 bytes, then hex-decode back into the
///    final key bytes.
pub fn deobfuscate(digits: &[u32]) -> Result<Vec<u8>> {
    if digits.is_empty() {
        return Err(Error::secret_unavailable(
            "chosen version has no digit sequence",
        ));
    }

    let joined: String = digits
        .iter()
        .enumerate()
        .map(|(i, d)| (d ^ ((i as u32 % 33) + 9)).to_string())
        .collect();

    let detour = hex::encode(joined.as_bytes());
    hex::decode(&detour)
        .map_err(|e| Error::secret_unavailable(format!("hex detour failed: {}", e)))
}
