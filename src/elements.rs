// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The collation element: a 64-bit weight and its legacy 32-bit halves.
//!
//! A collation element (CE) packs three weight fields into one `u64`:
//!
//! ```text
//! bits 63..32   primary    (32 bits, big-endian byte semantics)
//! bits 31..16   secondary  (16 bits)
//! bits 15..0    tertiary   (16 bits; top two bits carry case)
//! ```
//!
//! Zero is the completely-ignorable element. The quaternary weight is not
//! stored; it is derived from the primary when alternate handling shifts
//! variable elements down.
//!
//! # Legacy dual-32 form
//!
//! The element iterator exposes the historical 32-bit CE view. A 64-bit CE
//! splits into a first half (primary high 16, secondary high 8, tertiary
//! high 8) and, when any lower bits remain, a second half tagged with the
//! `0xC0` continuation marker. An element whose primary low 16 bits,
//! secondary low 8 bits, and tertiary low 6 bits are all zero fits in one
//! half and never produces a continuation.
//!
//! # Weight byte invariants
//!
//! Sort keys are unsigned byte strings, so every weight byte this crate
//! allocates is either `0x00` (absent, trimmed) or `>= 0x03`:
//! `0x00` terminates a key, `0x01` separates levels, and `0x02` is reserved
//! for merge separators, bound suffixes, and U+FFFE. The base-253 encodings
//! below keep that invariant while preserving numeric order.

use serde::{Deserialize, Serialize};

/// One collation element: primary, secondary, and tertiary weights packed
/// into 64 bits. Obtained from a [`crate::source::WeightSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Ce(pub u64);

impl Ce {
    /// The completely-ignorable element.
    pub const IGNORABLE: Ce = Ce(0);

    /// End-of-text sentinel produced by a weight source. Its primary is the
    /// special low value 1 with below-common secondary/tertiary, so it can
    /// never collide with a real element.
    pub const NO_CE: Ce = Ce(0x1_0100_0100);

    /// Element assigned to U+FFFE, the merge separator: minimal non-zero
    /// weights at every level so merged keys interleave correctly.
    pub const MERGE_SEPARATOR: Ce = Ce((MERGE_SEPARATOR_PRIMARY as u64) << 32 | 0x0200_0200);

    /// Build an element from its three weight fields.
    #[inline]
    pub fn from_weights(primary: u32, secondary: u16, tertiary: u16) -> Ce {
        Ce((primary as u64) << 32 | (secondary as u64) << 16 | tertiary as u64)
    }

    #[inline]
    pub fn primary(self) -> u32 {
        (self.0 >> 32) as u32
    }

    #[inline]
    pub fn secondary(self) -> u16 {
        (self.0 >> 16) as u16
    }

    #[inline]
    pub fn tertiary(self) -> u16 {
        self.0 as u16
    }

    /// The low 32 bits (secondary and tertiary together), as consumed by
    /// the legacy half-splitting functions.
    #[inline]
    pub fn lower32(self) -> u32 {
        self.0 as u32
    }

    #[inline]
    pub fn is_ignorable(self) -> bool {
        self.0 == 0
    }
}

/// Primary weight of the merge separator (U+FFFE). Variables sit strictly
/// above it; real weights sit strictly above variables.
pub const MERGE_SEPARATOR_PRIMARY: u32 = 0x0200_0000;

/// Quaternary weight of a non-variable element under shifted handling.
pub const QUATERNARY_HIGH: u32 = 0xFFFF_FFFF;

/// Common (default) secondary/tertiary weight.
pub const COMMON_WEIGHT16: u16 = 0x0500;

/// Case bits live in the top two bits of the tertiary weight.
pub const CASE_MASK: u16 = 0xC000;

/// Upper-case bit within the tertiary weight.
pub const UPPER_CASE_BIT: u16 = 0x8000;

/// Tertiary weight with the case bits masked off.
pub const TERTIARY_SANS_CASE_MASK: u16 = 0x3FFF;

/// Lead byte for variable (punctuation/whitespace) primaries.
pub const VARIABLE_LEAD: u8 = 0x0C;

/// Default variable-top threshold: everything with a variable lead byte.
pub const DEFAULT_VARIABLE_TOP: u32 = 0x0FFF_FFFF;

/// Lead byte for numeric-collation primaries.
pub const NUMERIC_LEAD: u8 = 0x28;

/// First lead byte of the tailored primary space (rule-built weights).
pub const TAILORED_LEAD_MIN: u8 = 0x2A;

/// First lead byte of the implicit (code-point-derived) primary space.
pub const IMPLICIT_LEAD_MIN: u8 = 0x50;

/// Continuation tag carried in the low bits of a legacy second half.
pub const CONTINUATION_TAG: u32 = 0xC0;

/// Returned by the legacy iterator when no elements remain.
pub const NULLORDER: u32 = 0xFFFF_FFFF;

// ============================================================================
// LEGACY DUAL-32 SPLIT
// ============================================================================

/// Leading legacy half: primary high 16, secondary high 8, tertiary high 8.
#[inline]
pub fn first_half(p: u32, lower32: u32) -> u32 {
    (p & 0xFFFF_0000) | ((lower32 >> 16) & 0xFF00) | ((lower32 >> 8) & 0xFF)
}

/// Trailing legacy half: primary low 16 shifted high, secondary low 8,
/// tertiary low 6. Zero when the element fits in the first half.
#[inline]
pub fn second_half(p: u32, lower32: u32) -> u32 {
    (p << 16) | ((lower32 >> 8) & 0xFF00) | (lower32 & 0x3F)
}

/// True when an element carries weight bits beyond its first legacy half.
#[inline]
pub fn needs_two_parts(ce: Ce) -> bool {
    ce.0 & 0xFFFF_00FF_003F != 0
}

/// All legacy halves of a CE sequence, continuation-tagged, in forward
/// order. Used to size the per-tailoring max-expansion map.
pub fn legacy_halves(ces: &[Ce]) -> Vec<u32> {
    let mut halves = Vec::with_capacity(ces.len());
    for &ce in ces {
        if ce.is_ignorable() {
            halves.push(0);
            continue;
        }
        let p = ce.primary();
        let lower = ce.lower32();
        halves.push(first_half(p, lower));
        let second = second_half(p, lower);
        if second != 0 {
            halves.push(second | CONTINUATION_TAG);
        }
    }
    halves
}

// ============================================================================
// IMPLICIT WEIGHTS
// ============================================================================

/// Implicit primary for an untailored code point.
///
/// Whitespace and punctuation land in the variable lead byte so that
/// shifted alternate handling can demote them; everything else is a
/// three-byte base-253 expansion of the scalar value under
/// [`IMPLICIT_LEAD_MIN`]. Both encodings preserve scalar order and keep
/// every significant byte `>= 0x03`.
pub fn implicit_primary(c: char) -> u32 {
    let cp = c as u32;
    if (c.is_whitespace() || c.is_ascii_punctuation() || is_general_punctuation(c)) && cp < 64_009
    {
        let hi = 3 + cp / 253;
        let lo = 3 + cp % 253;
        (VARIABLE_LEAD as u32) << 24 | hi << 16 | lo << 8
    } else {
        let d0 = cp / 64_009;
        let d1 = (cp / 253) % 253;
        let d2 = cp % 253;
        (IMPLICIT_LEAD_MIN as u32 + d0) << 24 | (3 + d1) << 16 | (3 + d2) << 8
    }
}

/// Implicit element for an untailored code point: implicit primary, common
/// secondary, common tertiary with the case bit for uppercase letters.
pub fn implicit_ce(c: char) -> Ce {
    if c == '\u{FFFE}' {
        return Ce::MERGE_SEPARATOR;
    }
    let tertiary = if c.is_uppercase() {
        COMMON_WEIGHT16 | UPPER_CASE_BIT
    } else {
        COMMON_WEIGHT16
    };
    Ce::from_weights(implicit_primary(c), COMMON_WEIGHT16, tertiary)
}

fn is_general_punctuation(c: char) -> bool {
    matches!(c, '\u{2000}'..='\u{206F}' | '\u{3000}'..='\u{303F}')
}

// ============================================================================
// BYTE APPENDERS
// ============================================================================

/// Append the significant big-endian bytes of a 32-bit weight, trimming
/// trailing zero bytes. Interior zero bytes never occur in allocated
/// weights.
#[inline]
pub fn append_weight32(w: u32, out: &mut Vec<u8>) {
    for shift in [24u32, 16, 8, 0] {
        let b = (w >> shift) as u8;
        if b == 0 {
            break;
        }
        out.push(b);
    }
}

/// Append the significant big-endian bytes of a 16-bit weight.
#[inline]
pub fn append_weight16(w: u16, out: &mut Vec<u8>) {
    let hi = (w >> 8) as u8;
    if hi == 0 {
        return;
    }
    out.push(hi);
    let lo = w as u8;
    if lo != 0 {
        out.push(lo);
    }
}

/// Append the identical-level encoding of one code point: U+FFFE becomes
/// the merge-separator byte, everything else a fixed three-byte base-253
/// value offset so every byte is `>= 0x03`. Order-preserving.
pub fn append_code_point(c: char, out: &mut Vec<u8>) {
    if c == '\u{FFFE}' {
        out.push(0x02);
        return;
    }
    let cp = c as u32;
    out.push(3 + (cp / 64_009) as u8);
    out.push(3 + ((cp / 253) % 253) as u8);
    out.push(3 + (cp % 253) as u8);
}
