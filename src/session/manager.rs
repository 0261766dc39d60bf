//! Access-token lifecycle over the provider's TOTP-proof login
//!
//! State machine over a single session record:
//! `NoSession -> Active -> (Expired -> Active)*`. An expired session is
//! replaced wholesale by a fresh login, never patched. Freshness is
//! enforced at the call boundary via [`SessionManager::refresh_session`];
//! there is no background timer.

use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::Settings;
use crate::config::settings::DEFAULT_CLIENT_VERSION;
use crate::secrets::SecretResolver;
use crate::types::{ServerTime, Session};
use crate::{Error, Result, headers, totp};

/// Mints and refreshes access tokens using the provider's own clock and
/// the currently rotating secret
///
/// State is private to one instance; callers sharing an instance across
/// tasks are serialized by the internal lock.
#[derive(Debug)]
pub struct SessionManager {
    /// HTTP client for the token endpoints
    client: Client,
    /// Endpoint configuration
    settings: Settings,
    /// Long-lived credential cookie value, sent as `sp_dc=<credential>`
    credential_cookie: HeaderValue,
    /// Secret resolver, consulted fresh on every login attempt
    resolver: SecretResolver,
    /// Current session, if any login has succeeded
    session: RwLock<Option<Session>>,
}

impl SessionManager {
    /// Create a session manager around a long-lived `sp_dc` credential
    pub fn new(sp_dc: impl AsRef<str>, settings: Settings) -> Result<Self> {
        let credential_cookie = HeaderValue::from_str(&format!("sp_dc={}", sp_dc.as_ref()))
            .map_err(|_| Error::credential_invalid("sp_dc contains invalid characters"))?;

        let client = Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(Error::Network)?;

        let resolver = SecretResolver::new(&settings)?;

        Ok(Self {
            client,
            settings,
            credential_cookie,
            resolver,
            session: RwLock::new(None),
        })
    }

    /// Perform a full login: server time, secret resolution, code
    /// generation, token request
    ///
    /// # Errors
    ///
    /// - [`Error::CredentialInvalid`] when the provider rejects the
    ///   attempt, or for any non-TOTP login failure
    /// - [`Error::SecretUnavailable`] when no mirror yields a secret
    /// - [`Error::CodeGeneration`] when the TOTP derivation fails
    pub async fn login(&self) -> Result<Session> {
        let server_time_ms = self.fetch_server_time().await?;
        debug!("Provider clock: {} ms", server_time_ms);

        let secret = self.resolver.resolve().await?;
        let code = totp::generate(&secret.key, server_time_ms)?;

        let session = self
            .request_token(&code, secret.version, server_time_ms)
            .await?;
        info!(
            "Logged in, token expires at {} ms",
            session.access_token_expiration_timestamp_ms
        );

        *self.session.write().await = Some(session.clone());
        Ok(session)
    }

    /// Return the current session, logging in first if there is none or it
    /// has expired
    ///
    /// Recognized login failures are re-raised verbatim so callers can
    /// tell a bad credential from a transient hiccup; anything else is
    /// collapsed into [`Error::SessionRefresh`].
    pub async fn refresh_session(&self) -> Result<Session> {
        {
            let guard = self.session.read().await;
            if let Some(session) = guard.as_ref()
                && !session.is_expired()
            {
                return Ok(session.clone());
            }
        }

        debug!("No active session or token expired, logging in");
        match self.login().await {
            Ok(session) => Ok(session),
            Err(e) if e.is_recognized_login_failure() => Err(e),
            Err(e) => Err(Error::session_refresh(e.to_string())),
        }
    }

    /// A valid bearer token, refreshing the session if needed
    pub async fn bearer_token(&self) -> Result<String> {
        Ok(self.refresh_session().await?.access_token)
    }

    /// The last successfully minted session
    ///
    /// # Errors
    ///
    /// [`Error::Unauthenticated`] when no login has ever succeeded.
    pub async fn session_info(&self) -> Result<Session> {
        self.session
            .read()
            .await
            .clone()
            .ok_or_else(|| Error::unauthenticated("no session, call login() first"))
    }

    /// Header set for an authenticated downstream call: browser headers,
    /// credential cookie and a fresh bearer token
    pub async fn authenticated_headers(&self) -> Result<HeaderMap> {
        let token = self.bearer_token().await?;
        let mut headers = self.request_headers();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| Error::unauthenticated("access token is not header-safe"))?,
        );
        Ok(headers)
    }

    /// Header set carrying only the credential cookie
    fn request_headers(&self) -> HeaderMap {
        let mut headers = headers::api_headers(DEFAULT_CLIENT_VERSION);
        headers.insert("cookie", self.credential_cookie.clone());
        headers
    }

    /// Fetch the provider-reported clock in unix milliseconds
    async fn fetch_server_time(&self) -> Result<i64> {
        let time: ServerTime = self
            .client
            .get(&self.settings.endpoints.server_time_url)
            .headers(self.request_headers())
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| Error::credential_invalid(format!("server time fetch failed: {}", e)))?
            .json()
            .await
            .map_err(|e| Error::credential_invalid(format!("bad server time payload: {}", e)))?;

        Ok(time.as_millis())
    }

    /// Submit the signed token request and parse the session it returns
    async fn request_token(
        &self,
        code: &str,
        secret_version: u32,
        server_time_ms: i64,
    ) -> Result<Session> {
        self.client
            .get(&self.settings.endpoints.token_url)
            .headers(self.request_headers())
            .query(&[
                ("reason", "init"),
                ("productType", "web-player"),
                ("totp", code),
                ("totpVer", &secret_version.to_string()),
                ("ts", &server_time_ms.to_string()),
            ])
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| Error::credential_invalid(format!("token request failed: {}", e)))?
            .json::<Session>()
            .await
            .map_err(|e| Error::credential_invalid(format!("bad token payload: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Obfuscated digits resolving to the version-14 key
    const V14_DIGITS: [u32; 44] = [
        12, 15, 13, 12, 12, 14, 13, 25, 20, 19, 19, 22, 19, 17, 20, 16, 24, 27, 18, 26, 29, 25,
        22, 41, 38, 39, 35, 34, 37, 39, 38, 33, 33, 14, 14, 8, 11, 13, 8, 7, 22, 25, 20, 21,
    ];

    const SERVER_TIME_SECS: i64 = 1_700_000_000;

    /// The code the v14 key yields at [`SERVER_TIME_SECS`]
    const EXPECTED_CODE: &str = "366505";

    fn manager_for(server: &MockServer) -> SessionManager {
        let mut settings = Settings::default();
        settings.endpoints.token_url = format!("{}/api/token", server.uri());
        settings.endpoints.server_time_url = format!("{}/api/server-time", server.uri());
        settings.secrets.mirrors = vec![format!("{}/secrets.json", server.uri())];
        SessionManager::new("test-sp-dc-cookie", settings).unwrap()
    }

    async fn mount_login_endpoints(server: &MockServer, expiry_ms: i64, expected_logins: u64) {
        Mock::given(method("GET"))
            .and(path("/api/server-time"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"serverTime": SERVER_TIME_SECS})),
            )
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/secrets.json"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"14": V14_DIGITS.to_vec()})),
            )
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/token"))
            .and(query_param("reason", "init"))
            .and(query_param("productType", "web-player"))
            .and(query_param("totp", EXPECTED_CODE))
            .and(query_param("totpVer", "14"))
            .and(query_param("ts", (SERVER_TIME_SECS * 1000).to_string()))
            .and(header("cookie", "sp_dc=test-sp-dc-cookie"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "clientId": "d8a5ed958d274c2e8ee717e6a4b0971d",
                "accessToken": "BQ-minted-token",
                "accessTokenExpirationTimestampMs": expiry_ms,
                "isAnonymous": false
            })))
            .expect(expected_logins)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_login_mints_session_with_correct_proof() {
        let server = MockServer::start().await;
        let expiry = Utc::now().timestamp_millis() + 3_600_000;
        mount_login_endpoints(&server, expiry, 1).await;

        let manager = manager_for(&server);
        let session = manager.login().await.unwrap();

        assert_eq!(session.access_token, "BQ-minted-token");
        assert!(!session.is_expired());
        assert_eq!(manager.bearer_token().await.unwrap(), "BQ-minted-token");
    }

    #[tokio::test]
    async fn test_refresh_is_noop_while_token_fresh() {
        let server = MockServer::start().await;
        let expiry = Utc::now().timestamp_millis() + 3_600_000;
        // The mock verifies exactly one token request on drop
        mount_login_endpoints(&server, expiry, 1).await;

        let manager = manager_for(&server);
        manager.refresh_session().await.unwrap();
        manager.refresh_session().await.unwrap();
        manager.refresh_session().await.unwrap();
    }

    #[tokio::test]
    async fn test_refresh_relogs_in_after_expiry() {
        let server = MockServer::start().await;
        // Provider hands back an already-expired token, so every refresh
        // runs a fresh login
        let expiry = Utc::now().timestamp_millis() - 1;
        mount_login_endpoints(&server, expiry, 2).await;

        let manager = manager_for(&server);
        manager.refresh_session().await.unwrap();
        manager.refresh_session().await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_token_request_is_credential_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/server-time"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"serverTime": SERVER_TIME_SECS})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/secrets.json"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"14": V14_DIGITS.to_vec()})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/token"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let manager = manager_for(&server);
        let err = manager.refresh_session().await.unwrap_err();
        assert!(matches!(err, Error::CredentialInvalid(_)));
    }

    #[tokio::test]
    async fn test_mirror_outage_stays_distinguishable_through_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/server-time"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"serverTime": SERVER_TIME_SECS})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/secrets.json"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let manager = manager_for(&server);
        let err = manager.refresh_session().await.unwrap_err();
        assert!(matches!(err, Error::SecretUnavailable(_)));
    }

    #[tokio::test]
    async fn test_session_info_before_login_is_unauthenticated() {
        let server = MockServer::start().await;
        let manager = manager_for(&server);

        let err = manager.session_info().await.unwrap_err();
        assert!(matches!(err, Error::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn test_authenticated_headers_carry_cookie_and_bearer() {
        let server = MockServer::start().await;
        let expiry = Utc::now().timestamp_millis() + 3_600_000;
        mount_login_endpoints(&server, expiry, 1).await;

        let manager = manager_for(&server);
        let headers = manager.authenticated_headers().await.unwrap();

        assert_eq!(headers.get("cookie").unwrap(), "sp_dc=test-sp-dc-cookie");
        assert_eq!(headers.get("authorization").unwrap(), "Bearer BQ-minted-token");
        assert!(headers.get("spotify-app-version").is_some());
    }

    #[test]
    fn test_control_characters_in_credential_rejected() {
        let err = SessionManager::new("bad\ncookie", Settings::default()).unwrap_err();
        assert!(matches!(err, Error::CredentialInvalid(_)));
    }
}
