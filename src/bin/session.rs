//! Script mode binary for one-time session minting
//!
//! Logs in with the supplied `sp_dc` credential and prints the minted
//! session as JSON on stdout. Optionally resolves a persisted-operation
//! hash instead.
//!
//! # Usage
//!
//! ```bash
//! spotify-session --sp-dc "<cookie value>"
//! spotify-session --operation-hash getTrack
//! ```
//!
//! # Output
//!
//! ```json
//! {
//!   "clientId": "...",
//!   "accessToken": "...",
//!   "accessTokenExpirationTimestampMs": 1700000000000,
//!   "isAnonymous": false
//! }
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use spotify_web_session::{BundleIntel, SessionManager, config::ConfigLoader};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "spotify-session")]
struct Cli {
    /// Long-lived sp_dc cookie value (falls back to the SP_DC env var)
    #[arg(short, long, value_name = "SP_DC")]
    sp_dc: Option<String>,

    /// Configuration file path (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Resolve this persisted-operation name to its current hash instead
    /// of minting a session
    #[arg(short, long, value_name = "NAME")]
    operation_hash: Option<String>,

    /// Print the live client version extracted from the landing page
    #[arg(long)]
    client_version: bool,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging goes to stderr, stdout carries only the result
    let default_filter = if cli.verbose { "debug" } else { "error" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let settings = ConfigLoader::new().load(cli.config.as_deref())?;

    if cli.client_version {
        let mut intel = BundleIntel::new(settings)?;
        println!("{}", intel.client_version(true).await?);
        return Ok(());
    }

    if let Some(name) = cli.operation_hash {
        let mut intel = BundleIntel::new(settings)?;
        let hash = intel.resolve_operation_hash(&name).await?;
        println!("{}", serde_json::json!({ "name": name, "hash": hash }));
        return Ok(());
    }

    let sp_dc = match cli.sp_dc.or_else(|| std::env::var("SP_DC").ok()) {
        Some(value) => value,
        None => {
            eprintln!("No sp_dc credential provided, pass --sp-dc or set SP_DC");
            std::process::exit(1);
        }
    };

    debug!("Minting a session");
    let manager = SessionManager::new(sp_dc, settings)?;

    match manager.login().await {
        Ok(session) => {
            println!("{}", serde_json::to_string(&session)?);
            Ok(())
        }
        Err(e) => {
            eprintln!("Failed to mint session: {}", e);
            std::process::exit(1);
        }
    }
}
