// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The collator: multi-level string comparison and sort-key generation.
//!
//! # Comparison pipeline
//!
//! ```text
//! identity shortcut
//!   -> common-prefix skip (backed out of unsafe regions)
//!     -> fast Latin attempt (definitive result or bail out)
//!       -> full multi-level element comparison
//!         -> identical-level NFD tie-break (maximal strength only)
//! ```
//!
//! Every stage above the full comparison is a pure shortcut: it either
//! produces the same answer the full algorithm would, or bails out to the
//! next stage. Sort keys are generated from the same level extraction the
//! comparison path uses, so `compare(a, b)` always agrees with
//! `key(a).cmp(&key(b))`.
//!
//! A collator can be [frozen](Collator::freeze), after which its options
//! are immutable and it may be shared across threads; frozen or not, the
//! per-call element buffers come from a lock-guarded scratch pool held
//! only for the duration of one call.

use std::cmp::Ordering;
use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::elements::{
    append_code_point, append_weight16, append_weight32, Ce, CASE_MASK, MERGE_SEPARATOR_PRIMARY,
    QUATERNARY_HIGH, TERTIARY_SANS_CASE_MASK, UPPER_CASE_BIT,
};
use crate::iter::CollationElementIterator;
use crate::key::{CollationKey, RawCollationKey};
use crate::source::{fast_latin_compare, TailoredWeightSource};
use crate::tailoring::Tailoring;

/// Maximum weight level at which two strings may still differ.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Strength {
    Primary,
    Secondary,
    #[default]
    Tertiary,
    Quaternary,
    /// Quaternary plus an NFD code-point tie-break.
    Identical,
}

/// What happens to variable (punctuation/whitespace) primaries.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlternateHandling {
    /// Variables keep their primary weights.
    #[default]
    NonIgnorable,
    /// Variables drop out of the primary..tertiary levels and reappear as
    /// quaternary weights.
    Shifted,
}

/// Ordering of case variants that are otherwise equal.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaseFirst {
    /// Lowercase first (the untailored default).
    #[default]
    Off,
    UpperFirst,
}

/// Collator configuration.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollatorOptions {
    pub strength: Strength,
    pub alternate: AlternateHandling,
    /// Insert a dedicated case level between secondary and tertiary.
    pub case_level: bool,
    pub case_first: CaseFirst,
    /// Compare secondary weights from the end of the string (French
    /// accent ordering).
    pub french_secondary: bool,
    /// Collate decimal digit runs by numeric value.
    pub numeric: bool,
}

// ============================================================================
// SCRATCH POOL
// ============================================================================

#[derive(Debug, Default)]
struct Scratch {
    left: Vec<Ce>,
    right: Vec<Ce>,
}

/// Reusable per-call element buffers behind a lock held for one call.
#[derive(Debug, Default)]
struct ScratchPool {
    pool: Mutex<Vec<Scratch>>,
}

struct ScratchGuard<'a> {
    pool: &'a ScratchPool,
    scratch: Scratch,
}

impl ScratchPool {
    fn acquire(&self) -> ScratchGuard<'_> {
        let scratch = self.pool.lock().pop().unwrap_or_default();
        ScratchGuard { pool: self, scratch }
    }
}

impl Drop for ScratchGuard<'_> {
    fn drop(&mut self) {
        let mut scratch = std::mem::take(&mut self.scratch);
        scratch.left.clear();
        scratch.right.clear();
        self.pool.pool.lock().push(scratch);
    }
}

// ============================================================================
// COLLATOR
// ============================================================================

/// A rule-based collator over one tailoring.
#[derive(Debug)]
pub struct Collator {
    tailoring: Arc<Tailoring>,
    options: CollatorOptions,
    frozen: bool,
    scratch: ScratchPool,
}

impl Clone for Collator {
    fn clone(&self) -> Self {
        Collator {
            tailoring: Arc::clone(&self.tailoring),
            options: self.options,
            frozen: self.frozen,
            scratch: ScratchPool::default(),
        }
    }
}

impl Collator {
    pub fn new(tailoring: Arc<Tailoring>, options: CollatorOptions) -> Collator {
        Collator {
            tailoring,
            options,
            frozen: false,
            scratch: ScratchPool::default(),
        }
    }

    pub fn with_tailoring(tailoring: Arc<Tailoring>) -> Collator {
        Collator::new(tailoring, CollatorOptions::default())
    }

    pub fn tailoring(&self) -> &Arc<Tailoring> {
        &self.tailoring
    }

    pub fn options(&self) -> &CollatorOptions {
        &self.options
    }

    /// Mark this collator immutable. Frozen collators reject option
    /// changes and are safe to share across threads.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn set_strength(&mut self, strength: Strength) {
        self.assert_mutable();
        self.options.strength = strength;
    }

    pub fn set_alternate_handling(&mut self, alternate: AlternateHandling) {
        self.assert_mutable();
        self.options.alternate = alternate;
    }

    pub fn set_case_level(&mut self, on: bool) {
        self.assert_mutable();
        self.options.case_level = on;
    }

    pub fn set_case_first(&mut self, case_first: CaseFirst) {
        self.assert_mutable();
        self.options.case_first = case_first;
    }

    pub fn set_french_secondary(&mut self, on: bool) {
        self.assert_mutable();
        self.options.french_secondary = on;
    }

    pub fn set_numeric(&mut self, on: bool) {
        self.assert_mutable();
        self.options.numeric = on;
    }

    fn assert_mutable(&self) {
        assert!(!self.frozen, "cannot change options on a frozen collator");
    }

    /// A frozen primary-strength sibling sharing this tailoring.
    pub(crate) fn primary_only(&self) -> Collator {
        let mut options = self.options;
        options.strength = Strength::Primary;
        Collator {
            tailoring: Arc::clone(&self.tailoring),
            options,
            frozen: true,
            scratch: ScratchPool::default(),
        }
    }

    /// Iterator over the legacy 32-bit collation orders of `text`.
    pub fn collation_element_iterator<'a>(
        &'a self,
        text: &'a str,
    ) -> CollationElementIterator<'a> {
        CollationElementIterator::new(text, &self.tailoring, self.options.numeric)
    }

    // ------------------------------------------------------------------
    // Comparison
    // ------------------------------------------------------------------

    pub fn compare(&self, left: &str, right: &str) -> Ordering {
        if std::ptr::eq(left, right) || left == right {
            return Ordering::Equal;
        }
        // French secondary reverses the whole secondary sequence, so a
        // shared prefix still participates in the outcome and cannot be
        // skipped.
        let prefix = if self.options.french_secondary {
            0
        } else {
            self.safe_prefix(left, right)
        };
        let (ltail, rtail) = (&left[prefix..], &right[prefix..]);

        if self.fast_path_allowed() {
            if let Some(order) = fast_latin_compare(ltail, rtail) {
                return order;
            }
        }

        let mut guard = self.scratch.acquire();
        let scratch = &mut guard.scratch;
        self.collect_ces(ltail, &mut scratch.left);
        self.collect_ces(rtail, &mut scratch.right);
        let left_levels = self.extract_levels(&scratch.left);
        let right_levels = self.extract_levels(&scratch.right);
        let result = self.compare_levels(&left_levels, &right_levels);
        if result == Ordering::Equal && self.options.strength == Strength::Identical {
            return identical_compare(ltail, rtail);
        }
        result
    }

    /// Longest common prefix (in bytes) that is safe to skip: backed out to
    /// a `char` boundary, out of contraction-trailing characters on either
    /// side, and out of a digit run when numeric mode is on.
    fn safe_prefix(&self, left: &str, right: &str) -> usize {
        let mut prefix = left
            .as_bytes()
            .iter()
            .zip(right.as_bytes())
            .take_while(|(a, b)| a == b)
            .count();
        while prefix > 0 && !left.is_char_boundary(prefix) {
            prefix -= 1;
        }
        while prefix > 0 {
            let l_unsafe = left[prefix..]
                .chars()
                .next()
                .is_some_and(|c| self.tailoring.is_unsafe_backward(c));
            let r_unsafe = right[prefix..]
                .chars()
                .next()
                .is_some_and(|c| self.tailoring.is_unsafe_backward(c));
            if !(l_unsafe || r_unsafe) {
                break;
            }
            prefix = prev_boundary(left, prefix);
        }
        if self.options.numeric {
            let l_digit = left[prefix..].chars().next().is_some_and(|c| c.is_ascii_digit());
            let r_digit = right[prefix..].chars().next().is_some_and(|c| c.is_ascii_digit());
            if l_digit || r_digit {
                while prefix > 0
                    && left[..prefix]
                        .chars()
                        .next_back()
                        .is_some_and(|c| c.is_ascii_digit())
                {
                    prefix = prev_boundary(left, prefix);
                }
            }
        }
        prefix
    }

    fn fast_path_allowed(&self) -> bool {
        !self.tailoring.has_ascii_tailoring()
            && self.options.alternate == AlternateHandling::NonIgnorable
            && !self.options.numeric
    }

    pub(crate) fn collect_ces(&self, text: &str, out: &mut Vec<Ce>) {
        out.clear();
        TailoredWeightSource::new(text, &self.tailoring, self.options.numeric)
            .collect_remaining(out);
    }

    // ------------------------------------------------------------------
    // Level extraction (shared by comparison and key generation)
    // ------------------------------------------------------------------

    fn extract_levels(&self, ces: &[Ce]) -> Levels {
        let shifted = self.options.alternate == AlternateHandling::Shifted;
        let top = self.tailoring.variable_top();
        let mut lv = Levels::default();
        let mut i = 0;
        while i < ces.len() {
            let ce = ces[i];
            i += 1;
            if ce.is_ignorable() {
                continue;
            }
            let p = ce.primary();
            if shifted && p > MERGE_SEPARATOR_PRIMARY && p <= top {
                // Variable: only a quaternary weight survives, and any
                // primary-ignorable elements riding on it are dropped.
                lv.quaternaries.push(p);
                while i < ces.len() && !ces[i].is_ignorable() && ces[i].primary() == 0 {
                    i += 1;
                }
                continue;
            }
            if p != 0 {
                lv.primaries.push(p);
            }
            if shifted {
                lv.quaternaries.push(QUATERNARY_HIGH);
            }
            let s = ce.secondary();
            if s != 0 {
                lv.secondaries.push(s);
            }
            let mut t = ce.tertiary();
            if t != 0 {
                if self.options.case_first == CaseFirst::UpperFirst {
                    t ^= UPPER_CASE_BIT;
                }
                lv.cases.push(t & CASE_MASK);
                lv.tertiaries.push(if self.options.case_level {
                    t & TERTIARY_SANS_CASE_MASK
                } else {
                    t
                });
            }
        }
        lv
    }

    fn compare_levels(&self, l: &Levels, r: &Levels) -> Ordering {
        let o = l.primaries.cmp(&r.primaries);
        if o != Ordering::Equal {
            return o;
        }
        if self.options.strength >= Strength::Secondary {
            let o = if self.options.french_secondary {
                l.secondaries.iter().rev().cmp(r.secondaries.iter().rev())
            } else {
                l.secondaries.cmp(&r.secondaries)
            };
            if o != Ordering::Equal {
                return o;
            }
        }
        if self.options.case_level {
            let o = l.cases.cmp(&r.cases);
            if o != Ordering::Equal {
                return o;
            }
        }
        if self.options.strength >= Strength::Tertiary {
            let o = l.tertiaries.cmp(&r.tertiaries);
            if o != Ordering::Equal {
                return o;
            }
        }
        if self.options.strength >= Strength::Quaternary
            && self.options.alternate == AlternateHandling::Shifted
        {
            let o = l.quaternaries.cmp(&r.quaternaries);
            if o != Ordering::Equal {
                return o;
            }
        }
        Ordering::Equal
    }

    // ------------------------------------------------------------------
    // Sort keys
    // ------------------------------------------------------------------

    /// Write the sort key for `text` into a reusable buffer.
    pub fn raw_collation_key(&self, text: &str, out: &mut RawCollationKey) {
        let mut guard = self.scratch.acquire();
        let ces = &mut guard.scratch.left;
        self.collect_ces(text, ces);
        let levels = self.extract_levels(ces);
        let buf = out.buffer_mut();
        buf.clear();
        self.write_key(text, &levels, buf);
    }

    /// The sort key for `text`, remembering its source string.
    pub fn collation_key(&self, text: &str) -> CollationKey {
        let mut raw = RawCollationKey::new();
        self.raw_collation_key(text, &mut raw);
        CollationKey::from_parts(Some(text.to_string()), raw.into_bytes())
    }

    fn write_key(&self, text: &str, lv: &Levels, out: &mut Vec<u8>) {
        for &p in &lv.primaries {
            append_weight32(p, out);
        }
        if self.options.strength >= Strength::Secondary {
            out.push(1);
            if self.options.french_secondary {
                for &s in lv.secondaries.iter().rev() {
                    append_weight16(s, out);
                }
            } else {
                for &s in &lv.secondaries {
                    append_weight16(s, out);
                }
            }
        }
        if self.options.case_level {
            out.push(1);
            for &c in &lv.cases {
                // 0x05, 0x85, or 0xC5: monotone in the (possibly flipped)
                // case bits, never below the weight-byte floor.
                out.push(0x05 + ((c >> 14) as u8) * 0x40);
            }
        }
        if self.options.strength >= Strength::Tertiary {
            out.push(1);
            for &t in &lv.tertiaries {
                append_weight16(t, out);
            }
        }
        if self.options.strength >= Strength::Quaternary
            && self.options.alternate == AlternateHandling::Shifted
        {
            out.push(1);
            for &q in &lv.quaternaries {
                if q == QUATERNARY_HIGH {
                    out.push(0xFF);
                } else {
                    append_weight32(q, out);
                }
            }
        }
        if self.options.strength == Strength::Identical {
            out.push(1);
            for c in text.nfd() {
                append_code_point(c, out);
            }
        }
        out.push(0);
    }
}

#[derive(Debug, Default)]
struct Levels {
    primaries: Vec<u32>,
    secondaries: Vec<u16>,
    cases: Vec<u16>,
    tertiaries: Vec<u16>,
    quaternaries: Vec<u32>,
}

// ============================================================================
// IDENTICAL LEVEL
// ============================================================================

/// Code-point tie-break with on-demand canonical decomposition.
///
/// End-of-string ranks below any code point; the merge separator U+FFFE
/// ranks below even end-of-string, so merged-key semantics carry over.
fn identical_compare(left: &str, right: &str) -> Ordering {
    let mut lpend: VecDeque<char> = VecDeque::new();
    let mut rpend: VecDeque<char> = VecDeque::new();
    let mut lchars = left.chars();
    let mut rchars = right.chars();
    loop {
        let l = lpend.pop_front().or_else(|| lchars.next());
        let r = rpend.pop_front().or_else(|| rchars.next());
        match (l, r) {
            (None, None) => return Ordering::Equal,
            (Some(a), Some(b)) if a == b => continue,
            (l, r) => {
                let ld = l.and_then(decomposition);
                let rd = r.and_then(decomposition);
                if ld.is_none() && rd.is_none() {
                    return rank(l).cmp(&rank(r));
                }
                push_back_front(&mut lpend, l, ld);
                push_back_front(&mut rpend, r, rd);
            }
        }
    }
}

fn push_back_front(pending: &mut VecDeque<char>, c: Option<char>, dec: Option<Vec<char>>) {
    match (c, dec) {
        (_, Some(chars)) => {
            for ch in chars.into_iter().rev() {
                pending.push_front(ch);
            }
        }
        (Some(ch), None) => pending.push_front(ch),
        (None, None) => {}
    }
}

fn decomposition(c: char) -> Option<Vec<char>> {
    let d: Vec<char> = std::iter::once(c).nfd().collect();
    if d.len() == 1 && d[0] == c {
        None
    } else {
        Some(d)
    }
}

fn rank(c: Option<char>) -> i64 {
    match c {
        None => -1,
        // U+FFFE ranks below end-of-string. Through the full compare
        // pipeline this arm never decides: U+FFFE keeps its own nonzero
        // primary, so texts whose separators differ in position part ways
        // before the identical level.
        Some('\u{FFFE}') => -2,
        Some(c) => c as i64,
    }
}

fn prev_boundary(text: &str, mut i: usize) -> usize {
    i -= 1;
    while !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}
