// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Resumable iteration over collation elements in the legacy 32-bit form.
//!
//! [`CollationElementIterator`] exposes the element stream of one string as
//! 32-bit orders: a wide element splits into a leading half and a
//! continuation-tagged trailing half (see [`crate::elements`]). The
//! iterator is bidirectional but not freely so: after stepping forward,
//! stepping backward (or vice versa) without an intervening [`reset`] or
//! [`set_offset`] is a caller bug and panics.
//!
//! [`reset`]: CollationElementIterator::reset
//! [`set_offset`]: CollationElementIterator::set_offset

use crate::elements::{
    first_half, needs_two_parts, second_half, Ce, CONTINUATION_TAG, NULLORDER,
};
use crate::source::{TailoredWeightSource, WeightSource};
use crate::tailoring::Tailoring;

/// Direction states. `RESET`/`REPOSITIONED` permit either direction.
const RESET: i8 = 0;
const REPOSITIONED: i8 = 1;
const FORWARD: i8 = 2;
const BACKWARD: i8 = -1;

/// Iterator over the 32-bit collation orders of one string.
///
/// Created by [`crate::collator::Collator::collation_element_iterator`].
#[derive(Debug)]
pub struct CollationElementIterator<'a> {
    source: TailoredWeightSource<'a>,
    tailoring: &'a Tailoring,
    dir: i8,
    /// Pending half of a split element: the trailing half while walking
    /// forward, the leading half while walking backward. Zero when none.
    other_half: u32,
    /// Offsets parallel to elements buffered by a backward step.
    offsets: Vec<usize>,
}

impl<'a> CollationElementIterator<'a> {
    pub(crate) fn new(text: &'a str, tailoring: &'a Tailoring, numeric: bool) -> Self {
        CollationElementIterator {
            source: TailoredWeightSource::new(text, tailoring, numeric),
            tailoring,
            dir: RESET,
            other_half: 0,
            offsets: Vec::new(),
        }
    }

    /// Next 32-bit order, or [`NULLORDER`] at the end of text. Completely
    /// ignorable elements come out as `0`.
    ///
    /// # Panics
    ///
    /// Panics when called after [`previous`](Self::previous) without an
    /// intervening [`reset`](Self::reset) or [`set_offset`](Self::set_offset).
    pub fn next(&mut self) -> u32 {
        assert!(
            self.dir >= RESET,
            "illegal change of direction: reset or set_offset before switching to forward iteration"
        );
        self.dir = FORWARD;
        if self.other_half != 0 {
            let half = self.other_half;
            self.other_half = 0;
            return half;
        }
        let ce = self.source.next_ce();
        if ce == Ce::NO_CE {
            return NULLORDER;
        }
        let p = ce.primary();
        let lower = ce.lower32();
        if needs_two_parts(ce) {
            self.other_half = second_half(p, lower) | CONTINUATION_TAG;
        }
        first_half(p, lower)
    }

    /// Previous 32-bit order, or [`NULLORDER`] at the start of text. On a
    /// freshly created or [`reset`](Self::reset) iterator, backward
    /// iteration starts from the end of the text. A split element yields
    /// its continuation-tagged trailing half first.
    ///
    /// # Panics
    ///
    /// Panics when called after [`next`](Self::next) without an intervening
    /// [`reset`](Self::reset) or [`set_offset`](Self::set_offset).
    pub fn previous(&mut self) -> u32 {
        assert!(
            self.dir <= REPOSITIONED,
            "illegal change of direction: reset or set_offset before switching to backward iteration"
        );
        if self.dir == RESET {
            let end = self.source.text().len();
            self.source.reset_to_offset(end);
        }
        self.dir = BACKWARD;
        if self.other_half != 0 {
            let half = self.other_half;
            self.other_half = 0;
            return half;
        }
        let end = self.source.offset();
        let ce = self.source.previous_ce(&mut self.offsets);
        if ce == Ce::NO_CE {
            return NULLORDER;
        }
        let p = ce.primary();
        let lower = ce.lower32();
        if needs_two_parts(ce) {
            if self.offsets.is_empty() {
                self.offsets.push(end);
                self.offsets.push(self.source.offset());
            }
            self.other_half = first_half(p, lower);
            return second_half(p, lower) | CONTINUATION_TAG;
        }
        first_half(p, lower)
    }

    /// Byte offset of the current position in the source text.
    pub fn offset(&self) -> usize {
        if self.dir == BACKWARD && !self.offsets.is_empty() {
            let mut i = self.offsets.len();
            if self.other_half != 0 {
                i -= 1;
            }
            return self.offsets[i - 1];
        }
        self.source.offset()
    }

    /// Reposition to `offset` (snapped down to a `char` boundary) and allow
    /// iteration in either direction. An offset inside a contraction is
    /// adjusted to the start of that contraction.
    pub fn set_offset(&mut self, offset: usize) {
        let text = self.source.text();
        let mut target = offset.min(text.len());
        while !text.is_char_boundary(target) {
            target -= 1;
        }

        // Back out of contraction-trailing characters, then walk forward
        // element by element to the last boundary at or before the target.
        let mut safe = target;
        while safe > 0 {
            match text[safe..].chars().next() {
                Some(c) if self.tailoring.is_unsafe_backward(c) => {
                    safe -= 1;
                    while !text.is_char_boundary(safe) {
                        safe -= 1;
                    }
                }
                _ => break,
            }
        }
        if safe < target {
            self.source.reset_to_offset(safe);
            let mut last_safe = safe;
            loop {
                let off = self.source.offset();
                if off <= target {
                    last_safe = off;
                } else {
                    break;
                }
                if off == text.len() {
                    break;
                }
                let _ = self.source.next_ce();
            }
            self.source.reset_to_offset(last_safe);
        } else {
            self.source.reset_to_offset(target);
        }
        self.other_half = 0;
        self.offsets.clear();
        self.dir = REPOSITIONED;
    }

    /// Clear all iteration state. A subsequent [`next`](Self::next) starts
    /// from the beginning of the text, a subsequent
    /// [`previous`](Self::previous) from the end.
    pub fn reset(&mut self) {
        self.source.reset_to_offset(0);
        self.other_half = 0;
        self.offsets.clear();
        self.dir = RESET;
    }

    /// Maximum number of orders any expansion ending with `order` can
    /// produce. At least 1 for any order.
    pub fn max_expansion(&self, order: u32) -> usize {
        self.tailoring.max_expansion(order)
    }

    /// Primary weight of a 32-bit order.
    pub fn primary_order(order: u32) -> u32 {
        order >> 16
    }

    /// Secondary weight of a 32-bit order.
    pub fn secondary_order(order: u32) -> u32 {
        (order >> 8) & 0xFF
    }

    /// Tertiary weight of a 32-bit order.
    pub fn tertiary_order(order: u32) -> u32 {
        order & 0xFF
    }
}
