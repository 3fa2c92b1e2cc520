// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Test utilities shared across unit and integration tests.
//!
//! This module is always compiled but hidden from documentation.
//! It provides the canonical test tailorings so tests agree on weights.

#![doc(hidden)]

use std::sync::Arc;

use crate::collator::Collator;
use crate::tailoring::{RuleBuilder, Tailoring, TailoringBuilder};

/// A small Latin tailoring: digits, case pairs, acute-accent secondaries,
/// and the traditional "ch" digraph contraction.
pub fn latin_rules() -> &'static str {
    "&0 < 1 < 2 < 3 < 4 < 5 < 6 < 7 < 8 < 9 \
     < a <<< A << \u{E1} <<< \u{C1} < b <<< B < c <<< C < ch <<< Ch < d <<< D \
     < e <<< E << \u{E9} <<< \u{C9} < f <<< F < g <<< G < h <<< H < i <<< I \
     < j <<< J < k <<< K < l <<< L < m <<< M < n <<< N < o <<< O < p <<< P \
     < q <<< Q < r <<< R < s <<< S < t <<< T < u <<< U < v <<< V < w <<< W \
     < x <<< X < y <<< Y < z <<< Z"
}

/// Ascending first-primary-per-script boundaries: tailored Latin, then
/// implicit Greek, Cyrillic, CJK, and a top sentinel.
pub fn script_boundaries() -> Vec<String> {
    ["a", "\u{0391}", "\u{0410}", "\u{4E00}", "\u{10FFFD}"]
        .into_iter()
        .map(String::from)
        .collect()
}

pub fn latin_tailoring() -> Arc<Tailoring> {
    let mut tailoring = RuleBuilder
        .parse_and_build(latin_rules())
        .expect("test rules parse");
    tailoring.set_script_boundaries(script_boundaries());
    Arc::new(tailoring)
}

pub fn latin_collator() -> Collator {
    Collator::with_tailoring(latin_tailoring())
}

/// The Latin tailoring plus a Pinyin-style index label: the contraction
/// U+FDD0 B tailored between "b" and "c".
pub fn pinyin_tailoring() -> Arc<Tailoring> {
    let rules = latin_rules().replace("< c <<< C", "< \u{FDD0}B < c <<< C");
    let mut tailoring = RuleBuilder
        .parse_and_build(&rules)
        .expect("test rules parse");
    tailoring.set_script_boundaries(script_boundaries());
    Arc::new(tailoring)
}
