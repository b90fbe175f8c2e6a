//! Favicon content hashing.
//!
//! The signature database was generated the same way Shodan computes
//! `http.favicon.hash`: the icon bytes are Base64 encoded with MIME line
//! wrapping, and the wrapped text is hashed with 32-bit MurmurHash3.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// MIME (RFC 2045) line length for Base64 output.
pub const BASE64_LINE_LENGTH: usize = 76;

/// Base64 encodes `bytes` and wraps the text at 76 characters, every line
/// terminated by `\n`.
pub fn mime_base64(bytes: &[u8]) -> String {
    let encoded = STANDARD.encode(bytes);
    let mut wrapped = String::with_capacity(encoded.len() + encoded.len() / BASE64_LINE_LENGTH + 1);

    for line in encoded.as_bytes().chunks(BASE64_LINE_LENGTH) {
        // Base64 output is ASCII, one char per byte.
        wrapped.extend(line.iter().map(|&b| b as char));
        wrapped.push('\n');
    }

    if wrapped.is_empty() {
        wrapped.push('\n');
    }

    wrapped
}

/// Computes the favicon hash of raw icon bytes as a signed decimal string.
///
/// # Examples
///
/// ```rust
/// use favirecon::favicon_hash;
///
/// assert_eq!(favicon_hash(b"test"), "-1541278541");
/// ```
pub fn favicon_hash(bytes: &[u8]) -> String {
    let wrapped = mime_base64(bytes);
    let hash = murmurhash3::murmurhash3_x86_32(wrapped.as_bytes(), 0);

    (hash as i32).to_string()
}
