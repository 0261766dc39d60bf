//! Type definitions for the session provider
//!
//! This module contains the main data structures exchanged with the provider.

pub mod server_config;
pub mod session;

pub use server_config::{AppServerConfig, LocaleConfig};
pub use session::{ServerTime, Session};
