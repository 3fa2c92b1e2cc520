// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Tailoring data: the weight tables behind a collator.
//!
//! A [`Tailoring`] maps strings (single code points, contractions) to
//! sequences of collation elements, carries the per-script boundary strings
//! used by the alphabetic index, and owns the variable-top threshold for
//! shifted alternate handling. Untailored code points fall back to implicit
//! weights derived from their scalar value.
//!
//! Tailorings are built through the [`TailoringBuilder`] seam. The bundled
//! [`RuleBuilder`] compiles a compact rule string:
//!
//! ```text
//! & a <<< A << á <<< Á < b <<< B < ch <<< Ch < d
//! ```
//!
//! `<` orders at the primary level, `<<` secondary, `<<<` tertiary, and `=`
//! assigns identical weights. An operand of the form `x/yz` is an
//! expansion: `x` receives the related weight followed by the elements of
//! `yz`. Multi-character operands become contractions. The first reset
//! anchors the chain; later resets must name an already-tailored element.
//! `#` starts a line comment.
//!
//! Tailored strings written in composed form automatically register their
//! canonical (NFD/NFC) variants as aliases, so `é` and `e\u{301}` collate
//! identically and differ only at the identical level.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::OnceLock;

use unicode_normalization::UnicodeNormalization;

use crate::elements::{
    self, legacy_halves, Ce, COMMON_WEIGHT16, CONTINUATION_TAG, DEFAULT_VARIABLE_TOP,
    TAILORED_LEAD_MIN, TERTIARY_SANS_CASE_MASK, UPPER_CASE_BIT,
};

/// Error type for tailoring-rule compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// The rule string contained no relations.
    EmptyRules,
    /// A relation appeared before any reset anchored the chain.
    MissingReset,
    /// A relation token was not followed by an operand.
    MissingOperand { relation: String },
    /// A reset named a multi-character string that is not yet tailored.
    UndefinedReset { operand: String },
    /// An unrecognized token appeared where a relation was expected.
    UnknownRelation { token: String },
    /// No gap remains between two tailored primaries for an insertion.
    NoRoom { operand: String },
    /// A secondary or tertiary increment ran out of weight space.
    WeightOverflow { operand: String },
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleError::EmptyRules => write!(f, "rule string contains no relations"),
            RuleError::MissingReset => write!(f, "rules must begin with a reset (&)"),
            RuleError::MissingOperand { relation } => {
                write!(f, "relation '{}' is missing an operand", relation)
            }
            RuleError::UndefinedReset { operand } => {
                write!(f, "reset target '{}' is not tailored", operand)
            }
            RuleError::UnknownRelation { token } => {
                write!(f, "expected a relation, found '{}'", token)
            }
            RuleError::NoRoom { operand } => {
                write!(f, "no primary weight gap left to insert '{}'", operand)
            }
            RuleError::WeightOverflow { operand } => {
                write!(f, "weight space exhausted at '{}'", operand)
            }
        }
    }
}

impl std::error::Error for RuleError {}

/// Compiles tailoring rules into a [`Tailoring`].
///
/// This is an explicit seam: callers inject whichever builder they want at
/// construction time instead of any runtime type lookup.
pub trait TailoringBuilder {
    fn parse_and_build(&self, rules: &str) -> Result<Tailoring, RuleError>;
}

// ============================================================================
// TAILORING
// ============================================================================

/// Weight tables for one locale tailoring.
#[derive(Debug, Default)]
pub struct Tailoring {
    /// Tailored strings (single code points and contractions) to elements.
    map: HashMap<String, Vec<Ce>>,
    /// First code points of multi-character entries.
    contraction_starters: HashSet<char>,
    /// Non-first code points of multi-character entries; iterating backward
    /// over these is unsafe.
    contraction_trailing: HashSet<char>,
    /// Longest entry, in code points.
    max_entry_cps: usize,
    /// True when any tailored entry touches the ASCII range; disables the
    /// fast-Latin comparison path.
    ascii_tailored: bool,
    /// Ascending "first primary per script" boundary strings; the last one
    /// bounds the overflow region.
    script_boundaries: Vec<String>,
    /// Primaries at or below this (and above the merge separator) are
    /// variable under shifted handling.
    variable_top: u32,
    /// Legacy half -> max number of halves of any expansion ending in it.
    /// Built at most once per tailoring.
    max_expansions: OnceLock<HashMap<u32, usize>>,
}

impl Tailoring {
    /// An empty tailoring: every code point collates by implicit weights.
    pub fn new() -> Tailoring {
        Tailoring {
            variable_top: DEFAULT_VARIABLE_TOP,
            ..Tailoring::default()
        }
    }

    /// Map `entry` to the given element sequence. Multi-character entries
    /// become contractions; sequences longer than one element are
    /// expansions. Registers canonical-equivalent aliases.
    pub fn insert(&mut self, entry: &str, ces: Vec<Ce>) {
        let nfd: String = entry.nfd().collect();
        let nfc: String = entry.nfc().collect();
        if nfd != entry {
            self.insert_raw(&nfd, ces.clone());
        }
        if nfc != entry && nfc != nfd {
            self.insert_raw(&nfc, ces.clone());
        }
        self.insert_raw(entry, ces);
    }

    fn insert_raw(&mut self, entry: &str, ces: Vec<Ce>) {
        debug_assert!(!entry.is_empty());
        let mut chars = entry.chars();
        let first = match chars.next() {
            Some(c) => c,
            None => return,
        };
        let mut count = 1;
        for c in chars {
            self.contraction_trailing.insert(c);
            count += 1;
        }
        if count > 1 {
            self.contraction_starters.insert(first);
        }
        self.max_entry_cps = self.max_entry_cps.max(count);
        if entry.chars().any(|c| c.is_ascii()) {
            self.ascii_tailored = true;
        }
        self.map.insert(entry.to_string(), ces);
    }

    /// Longest tailored match at the start of `rest`, as byte length plus
    /// elements. `None` when `rest` starts with an untailored code point.
    pub fn longest_match<'a>(&'a self, rest: &str) -> Option<(usize, &'a [Ce])> {
        let first = rest.chars().next()?;
        if self.contraction_starters.contains(&first) {
            let mut end = 0;
            let mut ends = Vec::with_capacity(self.max_entry_cps);
            for (count, c) in rest.chars().enumerate() {
                if count == self.max_entry_cps {
                    break;
                }
                end += c.len_utf8();
                ends.push(end);
            }
            for &e in ends.iter().rev() {
                if let Some(ces) = self.map.get(&rest[..e]) {
                    return Some((e, ces));
                }
            }
            return None;
        }
        let single = &rest[..first.len_utf8()];
        self.map.get(single).map(|ces| (single.len(), ces.as_slice()))
    }

    /// Elements for a single code point, tailored or implicit.
    pub fn char_ces(&self, c: char) -> Vec<Ce> {
        let mut buf = [0u8; 4];
        let s: &str = c.encode_utf8(&mut buf);
        match self.map.get(s) {
            Some(ces) => ces.clone(),
            None => vec![elements::implicit_ce(c)],
        }
    }

    /// True when iterating backward across `c` may split a contraction.
    pub fn is_unsafe_backward(&self, c: char) -> bool {
        self.contraction_trailing.contains(&c)
    }

    /// All multi-character entries beginning with `c`.
    pub fn contractions_starting_with(&self, c: char) -> Vec<&str> {
        let mut out: Vec<&str> = self
            .map
            .keys()
            .filter(|k| {
                let mut it = k.chars();
                it.next() == Some(c) && it.next().is_some()
            })
            .map(String::as_str)
            .collect();
        out.sort_unstable();
        out
    }

    pub fn has_ascii_tailoring(&self) -> bool {
        self.ascii_tailored
    }

    pub fn script_boundaries(&self) -> &[String] {
        &self.script_boundaries
    }

    pub fn set_script_boundaries(&mut self, boundaries: Vec<String>) {
        self.script_boundaries = boundaries;
    }

    pub fn variable_top(&self) -> u32 {
        self.variable_top
    }

    pub fn set_variable_top(&mut self, top: u32) {
        self.variable_top = top;
    }

    /// Maximum number of legacy halves any expansion ending in `order` can
    /// produce. Unmapped continuation-tagged orders default to 2,
    /// everything else to 1.
    pub fn max_expansion(&self, order: u32) -> usize {
        if order == 0 {
            return 1;
        }
        let map = self.max_expansions.get_or_init(|| {
            let mut m: HashMap<u32, usize> = HashMap::new();
            for ces in self.map.values() {
                let halves = legacy_halves(ces);
                if halves.len() > 1 {
                    if let Some(&last) = halves.last() {
                        let e = m.entry(last).or_insert(0);
                        *e = (*e).max(halves.len());
                    }
                }
            }
            m
        });
        if let Some(&n) = map.get(&order) {
            return n;
        }
        if order & CONTINUATION_TAG == CONTINUATION_TAG {
            2
        } else {
            1
        }
    }
}

// ============================================================================
// RULE BUILDER
// ============================================================================

/// Tailored primaries are three-byte weights under lead bytes
/// `0x2A..=0x4F`, addressed as indices into a base-253 digit space. The
/// index form makes midpoint insertion trivial while keeping every
/// significant byte `>= 0x03`.
const TAILORED_INDEX_LIMIT: u32 = 38 * 253 * 253;

/// Gap left between consecutive chain elements; resets insert into it by
/// midpoint splitting.
const CHAIN_STRIDE: u32 = 256;

fn index_to_primary(n: u32) -> u32 {
    debug_assert!(n < TAILORED_INDEX_LIMIT);
    let b1 = TAILORED_LEAD_MIN as u32 + n / (253 * 253);
    let b2 = 3 + (n / 253) % 253;
    let b3 = 3 + n % 253;
    b1 << 24 | b2 << 16 | b3 << 8
}

fn primary_to_index(p: u32) -> u32 {
    let b1 = (p >> 24) - TAILORED_LEAD_MIN as u32;
    let b2 = ((p >> 16) & 0xFF) - 3;
    let b3 = ((p >> 8) & 0xFF) - 3;
    b1 * 253 * 253 + b2 * 253 + b3
}

/// The bundled [`TailoringBuilder`]: compiles the rule syntax described in
/// the module docs.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleBuilder;

struct RuleState {
    tailoring: Tailoring,
    used: BTreeSet<u32>,
    prev: Option<Vec<Ce>>,
}

impl RuleState {
    fn alloc_after(&mut self, prev_primary: u32, operand: &str) -> Result<u32, RuleError> {
        let n_prev = primary_to_index(prev_primary);
        let n_new = match self.used.range(n_prev + 1..).next() {
            None => n_prev + CHAIN_STRIDE,
            Some(&n_next) => {
                if n_next - n_prev < 2 {
                    return Err(RuleError::NoRoom {
                        operand: operand.to_string(),
                    });
                }
                n_prev + (n_next - n_prev) / 2
            }
        };
        if n_new >= TAILORED_INDEX_LIMIT {
            return Err(RuleError::WeightOverflow {
                operand: operand.to_string(),
            });
        }
        self.used.insert(n_new);
        Ok(index_to_primary(n_new))
    }

    fn alloc_chain_head(&mut self) -> u32 {
        let n = match self.used.iter().next_back() {
            Some(&last) => last + CHAIN_STRIDE,
            None => CHAIN_STRIDE,
        };
        self.used.insert(n);
        index_to_primary(n)
    }
}

fn case_bit(operand: &str) -> u16 {
    match operand.chars().next() {
        Some(c) if c.is_uppercase() => UPPER_CASE_BIT,
        _ => 0,
    }
}

impl TailoringBuilder for RuleBuilder {
    fn parse_and_build(&self, rules: &str) -> Result<Tailoring, RuleError> {
        let mut state = RuleState {
            tailoring: Tailoring::new(),
            used: BTreeSet::new(),
            prev: None,
        };

        let stripped: String = rules
            .lines()
            .map(|line| line.split('#').next().unwrap_or(""))
            .collect::<Vec<_>>()
            .join(" ");
        let mut tokens = stripped.split_whitespace().peekable();
        let mut saw_relation = false;

        while let Some(token) = tokens.next() {
            if let Some(rest) = token.strip_prefix('&') {
                let operand = if rest.is_empty() {
                    tokens.next().ok_or(RuleError::MissingOperand {
                        relation: "&".to_string(),
                    })?
                } else {
                    rest
                };
                state.prev = Some(reset(&mut state, operand)?);
                continue;
            }

            let relation = match token {
                "<" | "<<" | "<<<" | "=" => token,
                _ => {
                    return Err(RuleError::UnknownRelation {
                        token: token.to_string(),
                    })
                }
            };
            let operand_token = tokens.next().ok_or_else(|| RuleError::MissingOperand {
                relation: relation.to_string(),
            })?;
            let prev = state.prev.clone().ok_or(RuleError::MissingReset)?;
            let (operand, extension) = match operand_token.split_once('/') {
                Some((op, ext)) => (op, Some(ext)),
                None => (operand_token, None),
            };

            let base = prev[0];
            let ce = match relation {
                "<" => Ce::from_weights(
                    state.alloc_after(base.primary(), operand)?,
                    COMMON_WEIGHT16,
                    COMMON_WEIGHT16 | case_bit(operand),
                ),
                "<<" => {
                    let s = base
                        .secondary()
                        .checked_add(0x0100)
                        .filter(|&s| s < 0xFF00)
                        .ok_or_else(|| RuleError::WeightOverflow {
                            operand: operand.to_string(),
                        })?;
                    Ce::from_weights(base.primary(), s, COMMON_WEIGHT16 | case_bit(operand))
                }
                "<<<" => {
                    let t = (base.tertiary() & TERTIARY_SANS_CASE_MASK)
                        .checked_add(0x0100)
                        .filter(|&t| t <= TERTIARY_SANS_CASE_MASK)
                        .ok_or_else(|| RuleError::WeightOverflow {
                            operand: operand.to_string(),
                        })?;
                    Ce::from_weights(base.primary(), base.secondary(), t | case_bit(operand))
                }
                _ => base, // "="
            };

            let mut ces = if relation == "=" {
                prev.clone()
            } else {
                vec![ce]
            };
            if let Some(ext) = extension {
                for c in ext.chars() {
                    ces.extend(state.tailoring.char_ces(c));
                }
            }
            state.tailoring.insert(operand, ces.clone());
            state.prev = Some(ces);
            saw_relation = true;
        }

        if !saw_relation {
            return Err(RuleError::EmptyRules);
        }
        Ok(state.tailoring)
    }
}

fn reset(state: &mut RuleState, operand: &str) -> Result<Vec<Ce>, RuleError> {
    if let Some(ces) = state.tailoring.map.get(operand) {
        return Ok(ces.clone());
    }
    let mut chars = operand.chars();
    let (first, rest) = (chars.next(), chars.next());
    match (first, rest) {
        (Some(_), None) => {
            // Anchor an untailored code point as the chain head.
            let p = state.alloc_chain_head();
            let ces = vec![Ce::from_weights(
                p,
                COMMON_WEIGHT16,
                COMMON_WEIGHT16 | case_bit(operand),
            )];
            state.tailoring.insert(operand, ces.clone());
            Ok(ces)
        }
        _ => Err(RuleError::UndefinedReset {
            operand: operand.to_string(),
        }),
    }
}
