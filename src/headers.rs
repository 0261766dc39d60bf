//! Browser-mimicking header sets
//!
//! Every request to the provider carries a stable header set matching the
//! official web client, plus the rotating `spotify-app-version` value on
//! API calls. Header values were captured from the live web player.

use reqwest::header::{HeaderMap, HeaderValue};

use crate::config::settings::DEFAULT_CLIENT_VERSION;

/// User agent of the impersonated browser
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/127.0.0.0 Safari/537.36";

const HOME_PAGE: &str = "https://open.spotify.com/";
const SEC_CH_UA: &str = r#""Not)A;Brand";v="99", "Google Chrome";v="127", "Chromium";v="127""#;

/// Shared browser fingerprint headers
fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("accept-language", HeaderValue::from_static("en-US"));
    headers.insert("content-type", HeaderValue::from_static("application/json"));
    headers.insert("origin", HeaderValue::from_static(HOME_PAGE));
    headers.insert("referer", HeaderValue::from_static(HOME_PAGE));
    headers.insert("sec-ch-ua", HeaderValue::from_static(SEC_CH_UA));
    headers.insert("sec-ch-ua-mobile", HeaderValue::from_static("?0"));
    headers.insert("sec-ch-ua-platform", HeaderValue::from_static("\"Windows\""));
    headers.insert("sec-fetch-dest", HeaderValue::from_static("empty"));
    headers.insert("sec-fetch-mode", HeaderValue::from_static("cors"));
    headers.insert("sec-fetch-site", HeaderValue::from_static("same-site"));
    headers.insert("user-agent", HeaderValue::from_static(USER_AGENT));
    headers
}

/// Header set for landing-page and chunk fetches
pub fn page_headers() -> HeaderMap {
    browser_headers()
}

/// Header set for authenticated API calls, carrying the rotating client
/// version
///
/// A client version string that is not a valid header value falls back to
/// the pinned [`DEFAULT_CLIENT_VERSION`].
pub fn api_headers(client_version: &str) -> HeaderMap {
    let mut headers = browser_headers();
    headers.insert("accept", HeaderValue::from_static("application/json"));
    headers.insert("priority", HeaderValue::from_static("u=1, i"));
    headers.insert("app-platform", HeaderValue::from_static("WebPlayer"));
    headers.insert(
        "spotify-app-version",
        HeaderValue::from_str(client_version)
            .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CLIENT_VERSION)),
    );
    headers
}
