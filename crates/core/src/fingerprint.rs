//! Phone+body dedup fingerprint, grounded on `worker/dedup.py`'s
//! `_phone_body_fingerprint` (NFKC normalization, whitespace collapse, then
//! SHA-256 over `"<phone>\n<body>"`).

use sha2::{Digest, Sha256};
use unicode_normalization::UnicodeNormalization;

fn normalize_body(body: &str) -> String {
    let nfkc: String = body.nfkc().collect();
    let mut out = String::with_capacity(nfkc.len());
    let mut last_was_space = false;
    for c in nfkc.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    out.trim().to_owned()
}

/// Computes the hex-encoded SHA-256 fingerprint of a phone+body pair used as
/// the dedup store's phone/body window key.
#[must_use]
pub fn phone_body_fingerprint(phone: &str, body: &str) -> String {
    let payload = format!("{}\n{}", phone.trim(), normalize_body(body));
    let digest = Sha256::digest(payload.as_bytes());
    hex_encode(&digest)
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}
