//! Spotify Web-Player Session Provider
//!
//! Impersonates the official web client against a provider that only
//! issues short-lived access tokens to requests proving possession of a
//! rotating time-based code. The crate covers the whole proof pipeline:
//!
//! - **TOTP generation**: a pure HOTP derivation (HMAC-SHA1, 30-second
//!   step, 6 digits) over the provider's server-reported clock
//! - **Secret resolution**: the rotating secret is republished by several
//!   independent, possibly-stale mirrors; all are queried concurrently and
//!   the newest version wins
//! - **Bundle intelligence**: persisted-operation hashes and the live
//!   client version are reverse-extracted from the minified web-player
//!   bundle and its chunk files
//! - **Session management**: login, expiry tracking and transparent
//!   refresh at the call boundary
//!
//! # Examples
//!
//! ```rust,no_run
//! use spotify_web_session::{SessionManager, Settings};
//!
//! # tokio_test::block_on(async {
//! let settings = Settings::default();
//! let manager = SessionManager::new("<sp_dc cookie>", settings)?;
//! let token = manager.bearer_token().await?;
//! # Ok::<(), spotify_web_session::Error>(())
//! # });
//! ```

pub mod config;
pub mod error;
pub mod headers;
pub mod intel;
pub mod secrets;
pub mod session;
pub mod totp;
pub mod types;

pub use config::Settings;
pub use error::{Error, Result};
pub use intel::BundleIntel;
pub use secrets::SecretResolver;
pub use session::SessionManager;
pub use types::{AppServerConfig, Session};
