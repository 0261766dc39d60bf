//! Session management for the web-player token flow
//!
//! This module orchestrates the login proof: server-reported clock, secret
//! resolution, TOTP generation and the token request itself, plus the
//! expiry-driven transparent refresh every privileged call goes through.

pub mod manager;

pub use manager::SessionManager;
