//! Shared helpers for integration and property tests.

#![allow(dead_code)]

use collatum::CollationKey;

/// Names that exercise case, accents, the "ch" contraction, digits,
/// punctuation, and non-Latin scripts against the test tailoring.
pub const MIXED_NAMES: &[&str] = &[
    "apple",
    "Apple",
    "banana",
    "Banana",
    "cherry",
    "chile",
    "czar",
    "\u{E9}clair",
    "\u{C9}clair",
    "file2",
    "file10",
    "!!!",
    "  spaced  ",
    "\u{0391}\u{03B8}\u{03AE}\u{03BD}\u{03B1}",
    "\u{4E00}\u{4E8C}\u{4E09}",
];

/// Checks the structural byte invariants every sort key must satisfy:
/// exactly one 0x00 byte, at the end, and 0x01 only as a level separator
/// (never first and never adjacent to the terminator for non-empty keys).
pub fn assert_key_well_formed(key: &CollationKey) {
    let bytes = key.as_bytes();
    assert!(!bytes.is_empty(), "key has no bytes");
    assert_eq!(
        bytes.last(),
        Some(&0x00),
        "key does not end with the terminator"
    );
    let body = &bytes[..bytes.len() - 1];
    assert!(
        !body.contains(&0x00),
        "terminator byte inside key body: {body:02X?}"
    );
}

/// Counts the level separators in a key body.
pub fn separator_count(key: &CollationKey) -> usize {
    let bytes = key.as_bytes();
    bytes[..bytes.len() - 1]
        .iter()
        .filter(|&&b| b == 0x01)
        .count()
}
