// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Weight sources: turning text into collation elements.
//!
//! [`WeightSource`] is the seam between the comparison machinery and the
//! text walker. [`TailoredWeightSource`] is the shipping implementation:
//! it walks a `&str` by byte offset, resolves tailored strings with
//! longest-contraction matching, derives implicit elements for everything
//! untailored, and (optionally) folds digit runs into numeric elements.
//!
//! Backward iteration never decodes elements in reverse. It retreats to a
//! safe boundary (before any contraction-trailing characters and, under
//! numeric mode, to the start of a digit run), derives forward over the
//! retreated span, buffers the results, and hands them out last-first.

use std::collections::VecDeque;

use crate::elements::{implicit_ce, implicit_primary, Ce, COMMON_WEIGHT16, NUMERIC_LEAD};
use crate::tailoring::Tailoring;

/// A resettable, bidirectional stream of collation elements over text.
///
/// Offsets are byte offsets into the underlying text, always on `char`
/// boundaries. `next_ce` returns [`Ce::NO_CE`] at the end of text,
/// `previous_ce` at the start.
pub trait WeightSource {
    fn next_ce(&mut self) -> Ce;

    /// Step backward one element. When the step crosses a span producing
    /// several elements, one forward-consistent offset per buffered element
    /// is pushed onto `offsets` (cleared first); later calls pop one entry
    /// per element handed out.
    fn previous_ce(&mut self, offsets: &mut Vec<usize>) -> Ce;

    fn offset(&self) -> usize;

    /// Reposition to `offset`, snapped down to a `char` boundary. Clears
    /// all buffered elements.
    fn reset_to_offset(&mut self, offset: usize);
}

/// The standard weight source: tailored mappings over implicit weights.
#[derive(Debug)]
pub struct TailoredWeightSource<'a> {
    text: &'a str,
    tailoring: &'a Tailoring,
    numeric: bool,
    pos: usize,
    fwd_buf: VecDeque<Ce>,
    back_buf: Vec<Ce>,
}

impl<'a> TailoredWeightSource<'a> {
    pub fn new(text: &'a str, tailoring: &'a Tailoring, numeric: bool) -> Self {
        TailoredWeightSource {
            text,
            tailoring,
            numeric,
            pos: 0,
            fwd_buf: VecDeque::new(),
            back_buf: Vec::new(),
        }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Drain the remaining forward stream into `out`, stopping before the
    /// end sentinel.
    pub fn collect_remaining(&mut self, out: &mut Vec<Ce>) {
        loop {
            let ce = self.next_ce();
            if ce == Ce::NO_CE {
                return;
            }
            out.push(ce);
        }
    }

    /// Derive elements forward over `text[at..limit]`, clamping contraction
    /// matches to the limit, recording each element with the offset of the
    /// span that produced it.
    fn derive_span(&self, mut at: usize, limit: usize, out: &mut Vec<(Ce, usize)>) {
        while at < limit {
            let rest = &self.text[at..limit];
            let first = match rest.chars().next() {
                Some(c) => c,
                None => return,
            };
            if self.numeric && first.is_ascii_digit() {
                let run = rest.bytes().take_while(u8::is_ascii_digit).count();
                for ce in numeric_ces(&rest[..run]) {
                    out.push((ce, at));
                }
                at += run;
                continue;
            }
            if let Some((len, ces)) = self.tailoring.longest_match(rest) {
                for &ce in ces {
                    out.push((ce, at));
                }
                at += len;
                continue;
            }
            out.push((implicit_ce(first), at));
            at += first.len_utf8();
        }
    }
}

impl WeightSource for TailoredWeightSource<'_> {
    fn next_ce(&mut self) -> Ce {
        loop {
            if let Some(ce) = self.fwd_buf.pop_front() {
                return ce;
            }
            self.back_buf.clear();
            let rest = &self.text[self.pos..];
            let first = match rest.chars().next() {
                Some(c) => c,
                None => return Ce::NO_CE,
            };
            if self.numeric && first.is_ascii_digit() {
                let run = rest.bytes().take_while(u8::is_ascii_digit).count();
                self.pos += run;
                self.fwd_buf.extend(numeric_ces(&rest[..run]));
                continue;
            }
            if let Some((len, ces)) = self.tailoring.longest_match(rest) {
                self.pos += len;
                // A tailored mapping may be empty (fully ignorable).
                self.fwd_buf.extend(ces.iter().copied());
                continue;
            }
            self.pos += first.len_utf8();
            return implicit_ce(first);
        }
    }

    fn previous_ce(&mut self, offsets: &mut Vec<usize>) -> Ce {
        if let Some(ce) = self.back_buf.pop() {
            if !offsets.is_empty() {
                offsets.pop();
            }
            return ce;
        }
        offsets.clear();
        self.fwd_buf.clear();
        loop {
            if self.pos == 0 {
                return Ce::NO_CE;
            }
            let limit = self.pos;
            let mut start = prev_boundary(self.text, limit);
            while start > 0 {
                let c = match self.text[start..].chars().next() {
                    Some(c) => c,
                    None => break,
                };
                let retreat = self.tailoring.is_unsafe_backward(c)
                    || (self.numeric
                        && c.is_ascii_digit()
                        && self.text[..start]
                            .chars()
                            .next_back()
                            .is_some_and(|p| p.is_ascii_digit()));
                if !retreat {
                    break;
                }
                start = prev_boundary(self.text, start);
            }

            let mut derived: Vec<(Ce, usize)> = Vec::new();
            self.derive_span(start, limit, &mut derived);
            self.pos = start;
            match derived.len() {
                0 => continue, // span mapped to nothing, keep stepping back
                1 => return derived[0].0,
                _ => {
                    for &(_, off) in &derived {
                        offsets.push(off);
                    }
                    let (&(last, _), rest) = derived.split_last().unwrap_or((&derived[0], &[]));
                    for &(ce, _) in rest {
                        self.back_buf.push(ce);
                    }
                    return last;
                }
            }
        }
    }

    fn offset(&self) -> usize {
        self.pos
    }

    fn reset_to_offset(&mut self, offset: usize) {
        let mut o = offset.min(self.text.len());
        while !self.text.is_char_boundary(o) {
            o -= 1;
        }
        self.pos = o;
        self.fwd_buf.clear();
        self.back_buf.clear();
    }
}

fn prev_boundary(text: &str, mut i: usize) -> usize {
    i -= 1;
    while !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

// ============================================================================
// NUMERIC ELEMENTS
// ============================================================================

/// Length prefix saturates here; longer runs keep all their digit pairs but
/// compare digit-wise past 504 significant digits.
const MAX_NUMERIC_PAIRS: usize = 252;

/// Elements for one ASCII digit run, ordered by numeric value.
///
/// Leading zeros are stripped. The remaining digits are grouped into
/// base-100 pairs from the least-significant end; the first element packs
/// the pair count (so longer numbers outrank shorter ones) and the first
/// two pairs, continuation elements carry three pairs each. Every
/// significant byte is `>= 0x03`.
pub fn numeric_ces(digits: &str) -> Vec<Ce> {
    debug_assert!(digits.bytes().all(|b| b.is_ascii_digit()));
    let trimmed = digits.trim_start_matches('0');
    let digits = if trimmed.is_empty() { "0" } else { trimmed };
    let bytes = digits.as_bytes();

    let mut pairs: Vec<u8> = Vec::with_capacity(bytes.len() / 2 + 1);
    let mut i = 0;
    if bytes.len() % 2 == 1 {
        pairs.push(bytes[0] - b'0');
        i = 1;
    }
    while i < bytes.len() {
        pairs.push((bytes[i] - b'0') * 10 + (bytes[i + 1] - b'0'));
        i += 2;
    }

    let len_byte = 3 + pairs.len().min(MAX_NUMERIC_PAIRS) as u32;
    let pair_byte = |v: &u8| 3 + u32::from(*v);
    let p0 = pairs.first().map_or(0, pair_byte);
    let p1 = pairs.get(1).map_or(0, pair_byte);
    let lead = u32::from(NUMERIC_LEAD) << 24;

    let mut ces = vec![Ce::from_weights(
        lead | len_byte << 16 | p0 << 8 | p1,
        COMMON_WEIGHT16,
        COMMON_WEIGHT16,
    )];
    let mut rest = &pairs[2.min(pairs.len())..];
    while !rest.is_empty() {
        let a = rest.first().map_or(0, pair_byte);
        let b = rest.get(1).map_or(0, pair_byte);
        let c = rest.get(2).map_or(0, pair_byte);
        ces.push(Ce::from_weights(
            lead | a << 16 | b << 8 | c,
            COMMON_WEIGHT16,
            COMMON_WEIGHT16,
        ));
        rest = &rest[3.min(rest.len())..];
    }
    ces
}

// ============================================================================
// FAST LATIN PATH
// ============================================================================

/// Compare two strings assuming untailored implicit weights, or bail out.
///
/// Walks both strings in lockstep. Equal characters (any script) are
/// skipped. At the first difference, or when one string runs out, every
/// character still in play must be ASCII; otherwise the answer may depend
/// on tailoring or higher levels and the caller falls back to the full
/// algorithm. Callers must not use this path with ASCII tailorings,
/// shifted alternate handling, or numeric mode.
pub(crate) fn fast_latin_compare(left: &str, right: &str) -> Option<std::cmp::Ordering> {
    use std::cmp::Ordering;

    let mut l = left.chars();
    let mut r = right.chars();
    loop {
        match (l.next(), r.next()) {
            (Some(a), Some(b)) if a == b => continue,
            (Some(a), Some(b)) => {
                if !a.is_ascii() || !b.is_ascii() {
                    return None;
                }
                // Distinct code points have distinct implicit primaries, so
                // the primary level decides here.
                return Some(implicit_primary(a).cmp(&implicit_primary(b)));
            }
            (Some(a), None) => {
                return if a.is_ascii() { Some(Ordering::Greater) } else { None };
            }
            (None, Some(b)) => {
                return if b.is_ascii() { Some(Ordering::Less) } else { None };
            }
            (None, None) => return Some(Ordering::Equal),
        }
    }
}
