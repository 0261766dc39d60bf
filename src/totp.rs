//! Time-based one-time code generation
//!
//! Pure HOTP over a 30-second time step (RFC 4226 semantics, HMAC-SHA1,
//! 6 digits). The provider validates this code server-side on every token
//! request, using a secret that rotates out of band; see
//! [`crate::secrets::SecretResolver`] for how the current secret is obtained.

use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::{Error, Result};

type HmacSha1 = Hmac<Sha1>;

/// Time step of the rolling code, in seconds
pub const PERIOD: i64 = 30;

/// Number of decimal digits in a generated code
pub const DIGITS: u32 = 6;

/// Derive the HOTP counter from a unix-millisecond timestamp
///
/// Stable across a whole 30-second window and increments exactly at each
/// window boundary.
pub fn counter(server_time_ms: i64) -> u64 {
    (server_time_ms / 1000 / PERIOD) as u64
}

/// Generate the 6-digit, zero-padded code for the given secret and time
///
/// Deterministic and free of I/O. Fails only on malformed input: an empty
/// secret, or (defensively) an HMAC output too short for dynamic truncation.
pub fn generate(secret_key: &[u8], server_time_ms: i64) -> Result<String> {
    if secret_key.is_empty() {
        return Err(Error::code_generation("secret key is empty"));
    }

    let mut mac = HmacSha1::new_from_slice(secret_key)
        .map_err(|e| Error::code_generation(format!("HMAC init failed: {}", e)))?;
    mac.update(&counter(server_time_ms).to_be_bytes());
    let digest = mac.finalize().into_bytes();

    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    if offset + 4 > digest.len() {
        // Unreachable for SHA-1's fixed 20-byte output
        return Err(Error::code_generation(format!(
            "HMAC output too short for offset {}",
            offset
        )));
    }

    let truncated = (u32::from(digest[offset] & 0x7f) << 24)
        | (u32::from(digest[offset + 1]) << 16)
        | (u32::from(digest[offset + 2]) << 8)
        | u32::from(digest[offset + 3]);

    Ok(format!("{:06}", truncated % 10u32.pow(DIGITS)))
}
