//! Byte pattern search.
//!
//! Thin wrappers over `memchr`'s SIMD-accelerated substring search.

/// Find the first occurrence of `needle` in `haystack`.
///
/// An empty needle never matches.
#[inline]
pub fn find_pattern(needle: &[u8], haystack: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    memchr::memmem::find(haystack, needle)
}

/// Find every non-overlapping occurrence of `needle` in `haystack`.
pub fn find_all(needle: &[u8], haystack: &[u8]) -> Vec<usize> {
    if needle.is_empty() {
        return Vec::new();
    }
    let finder = memchr::memmem::Finder::new(needle);
    let mut matches = Vec::new();
    let mut start = 0;
    while let Some(pos) = finder.find(&haystack[start..]) {
        matches.push(start + pos);
        start += pos + needle.len();
    }
    matches
}
