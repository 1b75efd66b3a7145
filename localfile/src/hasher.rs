//! Content identifiers
//!
//! A file's identity is the SHA-1 of its bytes, lowercase hex. The same
//! value is exposed as the `hash` attribute and used as the resource id.

use sha1::{Digest, Sha1};

/// Digest of the empty byte sequence
pub const EMPTY_DIGEST: &str = "da39a3ee5e6b4b0d3255bfef95601890afd80709";

/// Length of a hex digest in characters
pub const DIGEST_HEX_LEN: usize = 40;

pub fn digest(bytes: &[u8]) -> String {
    hex::encode(Sha1::digest(bytes))
}

/// Whether `value` has the shape of a digest produced by `digest`
pub fn is_digest(value: &str) -> bool {
    value.len() == DIGEST_HEX_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
