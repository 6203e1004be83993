//! Single-byte strings as stored in package name and folder fields.
//!
//! Packages store names as raw 8-bit strings. Each byte maps to the char with
//! the same code point (ISO-8859-1), so decoding never fails and encoding the
//! result gives back the exact stored bytes.

/// Decode stored bytes into a string, one char per byte.
pub fn decode(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Encode a string back into stored bytes.
///
/// Returns `None` if any char is above U+00FF and so has no single-byte form.
pub fn encode(text: &str) -> Option<Vec<u8>> {
    text.chars().map(|c| u8::try_from(c).ok()).collect()
}
