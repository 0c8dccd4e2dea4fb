//! HMAC-SHA256 request authentication for the facilitator channel.
//!
//! The gate signs each verify-and-settle body with a shared secret; the
//! facilitator recomputes the MAC before acting. Verification is
//! constant-time.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute HMAC-SHA256 over `body` with the shared secret.
/// Returns the hex-encoded MAC for the `X-Facilitator-Auth` header.
pub fn compute_hmac(secret: &[u8], body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(body);
    hex_encode(&mac.finalize().into_bytes())
}

/// Verify a hex-encoded HMAC-SHA256 signature against `body`.
///
/// An undecodable signature is compared against zeros so the invalid-hex
/// path takes the same time as a wrong MAC.
pub fn verify_hmac(secret: &[u8], body: &[u8], signature: &str) -> bool {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(body);

    let expected = hex_decode(signature).unwrap_or_else(|| vec![0u8; 32]);

    // verify_slice is constant-time
    mac.verify_slice(&expected).is_ok()
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes.iter().fold(String::new(), |mut s, b| {
        let _ = write!(s, "{b:02x}");
        s
    })
}

fn hex_decode(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 || !s.is_ascii() {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}
