//! Fast hashing utilities using xxHash3.
//!
//! Provides the deterministic, non-cryptographic hashing behind component
//! scope tags.

use xxhash_rust::xxh3::xxh3_64;

/// Default number of base-36 characters in a scope tag.
pub const SCOPE_TAG_LEN: usize = 6;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Compute a 64-bit hash of the given string using xxHash3.
#[inline]
pub fn hash_str(data: &str) -> u64 {
    xxh3_64(data.as_bytes())
}

/// Encode the low digits of `value` as exactly `len` base-36 characters.
pub fn to_base36(mut value: u64, len: usize) -> String {
    let mut digits = vec![b'0'; len];
    for slot in digits.iter_mut().rev() {
        *slot = BASE36[(value % 36) as usize];
        value /= 36;
    }
    // SAFETY: every byte comes from the ASCII table above
    unsafe { String::from_utf8_unchecked(digits) }
}

/// Derive the scope tag for a component name.
#[inline]
pub fn scope_tag(component_name: &str) -> String {
    scope_tag_with_len(component_name, SCOPE_TAG_LEN)
}

/// Scope tag of a custom length (clamped to 1..=12).
fn scope_tag_with_len(component_name: &str, len: usize) -> String {
    to_base36(hash_str(component_name), len.clamp(1, 12))
}
