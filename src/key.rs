// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Sort keys: byte strings whose unsigned lexicographic order is the
//! collation order.
//!
//! # Key format
//!
//! ```text
//! level bytes (>= 0x03) [ 0x01 level bytes ]* 0x00
//! ```
//!
//! `0x00` appears exactly once, as the terminator. `0x01` separates
//! levels; a weaker level never outranks a separator, so a string that is
//! a collation prefix of another sorts first. `0x02` is reserved: it is
//! the merge separator spliced in by [`CollationKey::merge`], the suffix
//! of an upper [bound](CollationKey::bound), and the U+FFFE encoding.
//!
//! [`RawCollationKey`] is the reusable plain-bytes form;
//! [`CollationKey`] owns its bytes, optionally remembers its source
//! string, and caches its hash.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Which bound of a key range to derive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundMode {
    /// Sorts at or below every key sharing the truncated prefix.
    Lower,
    /// Sorts above every string equal to the source up to the kept levels.
    Upper,
    /// Sorts above every string the source is a prefix of, at the kept
    /// levels.
    UpperLong,
}

/// Error type for sort-key operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// A bound was requested over zero levels.
    ZeroLevels,
    /// A bound requested more levels than the key holds.
    TooFewLevels { available: usize, requested: usize },
    /// The other key in a merge holds no level bytes.
    EmptyMergeSource,
}

impl fmt::Display for KeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyError::ZeroLevels => write!(f, "bound requested over zero levels"),
            KeyError::TooFewLevels {
                available,
                requested,
            } => write!(
                f,
                "bound requested {} levels but the key holds {}",
                requested, available
            ),
            KeyError::EmptyMergeSource => write!(f, "cannot merge with an empty sort key"),
        }
    }
}

impl std::error::Error for KeyError {}

// ============================================================================
// RAW KEY
// ============================================================================

/// A sort key as plain bytes, reusable across calls.
///
/// The derived ordering is unsigned lexicographic on the bytes, which is
/// exactly the collation order the bytes encode.
#[derive(Debug, Default, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RawCollationKey {
    bytes: Vec<u8>,
}

impl RawCollationKey {
    pub fn new() -> RawCollationKey {
        RawCollationKey::default()
    }

    /// The full key bytes, terminator included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub(crate) fn buffer_mut(&mut self) -> &mut Vec<u8> {
        &mut self.bytes
    }
}

// ============================================================================
// COLLATION KEY
// ============================================================================

/// An owned sort key with an optional source string and a cached hash.
///
/// Equality and ordering look only at the bytes up to the terminator, so
/// two keys compare equal exactly when their source strings collate equal
/// under the collator that produced them.
#[derive(Debug, Clone)]
pub struct CollationKey {
    source: Option<String>,
    bytes: Box<[u8]>,
    hash: OnceLock<u64>,
}

impl CollationKey {
    pub(crate) fn from_parts(source: Option<String>, bytes: Vec<u8>) -> CollationKey {
        debug_assert_eq!(bytes.last(), Some(&0));
        CollationKey {
            source,
            bytes: bytes.into_boxed_slice(),
            hash: OnceLock::new(),
        }
    }

    /// The string this key was generated from, when known. Derived keys
    /// (bounds, merges) have no source.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// The full key bytes, terminator included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn level_bytes(&self) -> &[u8] {
        let end = self
            .bytes
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.bytes.len());
        &self.bytes[..end]
    }

    /// Compare two keys byte by byte, stopping at the first terminator.
    pub fn compare_to(&self, other: &CollationKey) -> Ordering {
        let (a, b) = (&self.bytes, &other.bytes);
        let mut i = 0;
        loop {
            let x = a.get(i).copied().unwrap_or(0);
            let y = b.get(i).copied().unwrap_or(0);
            match x.cmp(&y) {
                Ordering::Equal => {
                    if x == 0 {
                        return Ordering::Equal;
                    }
                    i += 1;
                }
                other => return other,
            }
        }
    }

    /// Hash of the key bytes, packed into 16-bit units, computed at most
    /// once.
    pub fn hash_code(&self) -> u64 {
        *self.hash.get_or_init(|| {
            let mut hasher = std::collections::hash_map::DefaultHasher::new();
            let mut iter = self.level_bytes().iter();
            loop {
                match (iter.next(), iter.next()) {
                    (Some(&a), Some(&b)) => u16::from_be_bytes([a, b]).hash(&mut hasher),
                    (Some(&a), None) => {
                        u16::from_be_bytes([a, 0]).hash(&mut hasher);
                        break;
                    }
                    (None, _) => break,
                }
            }
            hasher.finish()
        })
    }

    /// Derive a range bound from the first `levels` levels of this key.
    ///
    /// The kept prefix excludes the separator it was cut at. `Lower` keeps
    /// the prefix as is; `Upper` appends one `0x02`; `UpperLong` appends
    /// `0xFF 0xFF`, bounding everything this key's source is a prefix of.
    pub fn bound(&self, mode: BoundMode, levels: usize) -> Result<CollationKey, KeyError> {
        if levels == 0 {
            return Err(KeyError::ZeroLevels);
        }
        let mut separators = 0;
        let mut cut = None;
        for (i, &b) in self.bytes.iter().enumerate() {
            if b == 0 {
                break;
            }
            if b == 1 {
                separators += 1;
                if separators == levels {
                    cut = Some(i);
                    break;
                }
            }
        }
        let cut = match cut {
            Some(i) => i,
            None => {
                return Err(KeyError::TooFewLevels {
                    available: separators + 1,
                    requested: levels,
                })
            }
        };
        let mut out = self.bytes[..cut].to_vec();
        match mode {
            BoundMode::Lower => {}
            BoundMode::Upper => out.push(0x02),
            BoundMode::UpperLong => out.extend_from_slice(&[0xFF, 0xFF]),
        }
        out.push(0);
        Ok(CollationKey::from_parts(None, out))
    }

    /// Interleave two keys level by level, `0x02` separating the halves of
    /// each level. Merged keys compare like the concatenation
    /// `self.source + U+FFFE + other.source` and stay compatible with
    /// other keys merged the same way.
    pub fn merge(&self, other: &CollationKey) -> Result<CollationKey, KeyError> {
        if self.level_bytes().is_empty() || other.level_bytes().is_empty() {
            return Err(KeyError::EmptyMergeSource);
        }
        let (a, b) = (&self.bytes, &other.bytes);
        let mut out = Vec::with_capacity(a.len() + b.len() + 2);
        let (mut i, mut j) = (0, 0);
        loop {
            while a.get(i).is_some_and(|&x| x > 1) {
                out.push(a[i]);
                i += 1;
            }
            out.push(0x02);
            while b.get(j).is_some_and(|&x| x > 1) {
                out.push(b[j]);
                j += 1;
            }
            if a.get(i) == Some(&1) && b.get(j) == Some(&1) {
                out.push(1);
                i += 1;
                j += 1;
            } else {
                break;
            }
        }
        // One key is done; the other may still hold weaker levels.
        if a.get(i) == Some(&1) {
            out.extend_from_slice(&a[i..a.len().saturating_sub(1)]);
        } else if b.get(j) == Some(&1) {
            out.extend_from_slice(&b[j..b.len().saturating_sub(1)]);
        }
        out.push(0);
        Ok(CollationKey::from_parts(None, out))
    }
}

impl PartialEq for CollationKey {
    fn eq(&self, other: &Self) -> bool {
        self.compare_to(other) == Ordering::Equal
    }
}

impl Eq for CollationKey {}

impl PartialOrd for CollationKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.compare_to(other))
    }
}

impl Ord for CollationKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare_to(other)
    }
}

impl Hash for CollationKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.level_bytes().hash(state);
    }
}
