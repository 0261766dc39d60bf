//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use spotify_web_session::Settings;

/// Obfuscated digits that deobfuscate to the version-14 secret key
pub const V14_DIGITS: [u32; 44] = [
    12, 15, 13, 12, 12, 14, 13, 25, 20, 19, 19, 22, 19, 17, 20, 16, 24, 27, 18, 26, 29, 25, 22,
    41, 38, 39, 35, 34, 37, 39, 38, 33, 33, 14, 14, 8, 11, 13, 8, 7, 22, 25, 20, 21,
];

/// Server clock used by the mock provider, unix seconds
pub const SERVER_TIME_SECS: i64 = 1_700_000_000;

/// A persisted-operation hash planted in the mock bundle chunks
pub const PLANTED_HASH: &str = "26ff3e2dbfbeef4ba4ac79a63bdb336ec952734d1be4a8e42f708117ccc2937f";

/// Settings pointing every endpoint at the given mock server
pub fn settings_for(server: &MockServer) -> Settings {
    let mut settings = Settings::default();
    settings.endpoints.home_url = format!("{}/", server.uri());
    settings.endpoints.token_url = format!("{}/api/token", server.uri());
    settings.endpoints.server_time_url = format!("{}/api/server-time", server.uri());
    settings.endpoints.cdn_base_url = format!("{}/cdn/build/web-player/", server.uri());
    settings.secrets.mirrors = vec![format!("{}/secrets.json", server.uri())];
    settings
}

/// Mount a full mock provider: landing page, bundle, chunks, secret
/// mirror, server time and token endpoint
pub async fn mount_provider(server: &MockServer, token_expiry_ms: i64) {
    let config = json!({"clientVersion": "1.2.90.100.gdeadbeef"});
    let landing = format!(
        r#"<html><head>
        <script defer="defer" src="{uri}/vendor.1111.js"></script>
        <script defer="defer" src="{uri}/web-player/web-player.2222.js"></script>
        <script id="appServerConfig" type="text/plain">{blob}</script>
        </head></html>"#,
        uri = server.uri(),
        blob = BASE64.encode(serde_json::to_vec(&config).unwrap()),
    );
    mount_text(server, "/", landing).await;

    let bundle = concat!(
        r#"!function(){var p={0:"pad0"},q={1:"pad1"},r={2:"pad2"};"#,
        r#"var h={0:"h0"},n={0:"a"};}()"#
    );
    mount_text(server, "/web-player/web-player.2222.js", bundle.to_string()).await;
    mount_text(
        server,
        "/cdn/build/web-player/a.h0.js",
        format!(r#""getTrack","query","{}""#, PLANTED_HASH),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/secrets.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"14": V14_DIGITS.to_vec()})))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/server-time"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"serverTime": SERVER_TIME_SECS})),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "clientId": "d8a5ed958d274c2e8ee717e6a4b0971d",
            "accessToken": "BQ-integration-token",
            "accessTokenExpirationTimestampMs": token_expiry_ms,
            "isAnonymous": false
        })))
        .mount(server)
        .await;
}

async fn mount_text(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}
