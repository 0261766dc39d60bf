//! Web-player bundle intelligence
//!
//! The provider authorizes GraphQL-style operations by persisted hash and
//! rotates both the hashes and the client version with every web-player
//! release, embedding the current values in its minified JavaScript
//! bundle. This module reverse-extracts them: it locates the main bundle
//! on the landing page, reconstructs its chunk files from the bundler's
//! own id tables, and scans the concatenated text for operation hashes.

pub mod client;
pub mod extract;

pub use client::BundleIntel;
