// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Alphabetic index: bucketing names under locale-style index labels.
//!
//! An [`AlphabeticIndex`] takes candidate labels plus a collator and
//! produces an ordered bucket list: one underflow bucket for names sorting
//! before every label, inflow buckets where whole scripts are skipped
//! between labels, one normal bucket per surviving label, and an overflow
//! bucket at the end. Labels that expand to several primary weights (like
//! "St") additionally get an invisible bucket that funnels names sorting
//! just past them back into the preceding single-weight bucket, so the
//! visible label sequence stays clean.
//!
//! Buckets live in an arena (`Vec<Bucket>`); redirects are arena indices,
//! never references. The bucket list is a lazily built snapshot: any
//! label or record mutation clears it and the next read rebuilds. For
//! lock-free concurrent lookups, [`AlphabeticIndex::build_immutable`]
//! yields a record-free projection.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::collator::Collator;
use crate::elements::Ce;

/// Combining grapheme joiner, used for the label distinctness check.
const CGJ: char = '\u{034F}';

/// Prefix of Chinese (Pinyin) index labels in tailoring data.
const PINYIN_BASE: char = '\u{FDD0}';

/// Default label for the underflow, inflow, and overflow buckets.
const ELLIPSIS: &str = "\u{2026}";

const DEFAULT_MAX_LABEL_COUNT: usize = 99;

/// Error type for index construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// The tailoring supplies fewer than two script boundary strings; the
    /// index needs at least one script range to bucket into.
    NoScriptBoundaries,
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexError::NoScriptBoundaries => {
                write!(f, "tailoring supplies fewer than two script boundary strings")
            }
        }
    }
}

impl std::error::Error for IndexError {}

/// What a bucket represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LabelType {
    /// A bucket for one index label.
    Normal,
    /// Names sorting before the first label.
    Underflow,
    /// Names sorting between labels of non-adjacent scripts.
    Inflow,
    /// Names sorting after the last label's script.
    Overflow,
}

/// One name/value pair held by the index.
#[derive(Debug, Clone)]
pub struct Record<V> {
    name: String,
    value: V,
}

impl<V> Record<V> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &V {
        &self.value
    }
}

#[derive(Debug, Clone)]
struct Bucket {
    label: String,
    lower_boundary: String,
    label_type: LabelType,
    /// Arena index of the bucket this one displays into, for invisible
    /// buckets and coalesced inflows.
    display_bucket: Option<usize>,
    /// Position in the visible bucket sequence; `None` while redirected.
    display_index: Option<usize>,
    /// Indices into the index's record list, in sorted order.
    records: Vec<usize>,
}

impl Bucket {
    fn new(label: String, lower_boundary: String, label_type: LabelType) -> Bucket {
        Bucket {
            label,
            lower_boundary,
            label_type,
            display_bucket: None,
            display_index: None,
            records: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
struct BucketList {
    buckets: Vec<Bucket>,
    /// Arena indices of the visible buckets, in display order.
    visible: Vec<usize>,
}

impl BucketList {
    fn assign_display_indices(&mut self) {
        self.visible = self
            .buckets
            .iter()
            .enumerate()
            .filter(|(_, b)| b.display_bucket.is_none())
            .map(|(i, _)| i)
            .collect();
        for (display, &i) in self.visible.iter().enumerate() {
            self.buckets[i].display_index = Some(display);
        }
    }

    /// Binary search over the full list, then follow one redirect.
    fn bucket_index(&self, name: &str, primary: &Collator) -> usize {
        let mut start = 0;
        let mut limit = self.buckets.len();
        while start + 1 < limit {
            let i = (start + limit) / 2;
            if primary.compare(name, &self.buckets[i].lower_boundary) == Ordering::Less {
                limit = i;
            } else {
                start = i;
            }
        }
        let bucket = &self.buckets[start];
        let bucket = match bucket.display_bucket {
            Some(target) => &self.buckets[target],
            None => bucket,
        };
        bucket
            .display_index
            .expect("redirect target is a visible bucket")
    }
}

// ============================================================================
// ALPHABETIC INDEX
// ============================================================================

/// A bucketed index of records under locale-style labels.
pub struct AlphabeticIndex<V> {
    collator: Collator,
    primary: Collator,
    initial_labels: Vec<String>,
    records: Vec<Record<V>>,
    max_label_count: usize,
    underflow_label: String,
    inflow_label: String,
    overflow_label: String,
    buckets: Option<BucketList>,
}

// Manual impl: the record values need not be Debug themselves.
impl<V> fmt::Debug for AlphabeticIndex<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlphabeticIndex")
            .field("initial_labels", &self.initial_labels)
            .field("records", &self.records.len())
            .field("max_label_count", &self.max_label_count)
            .field("buckets_built", &self.buckets.is_some())
            .finish_non_exhaustive()
    }
}

impl<V> AlphabeticIndex<V> {
    /// Build an index over `collator`'s tailoring. The tailoring must
    /// supply at least two ascending script boundary strings.
    pub fn new(collator: Collator) -> Result<AlphabeticIndex<V>, IndexError> {
        if collator.tailoring().script_boundaries().len() < 2 {
            return Err(IndexError::NoScriptBoundaries);
        }
        let primary = collator.primary_only();
        Ok(AlphabeticIndex {
            collator,
            primary,
            initial_labels: Vec::new(),
            records: Vec::new(),
            max_label_count: DEFAULT_MAX_LABEL_COUNT,
            underflow_label: ELLIPSIS.to_string(),
            inflow_label: ELLIPSIS.to_string(),
            overflow_label: ELLIPSIS.to_string(),
            buckets: None,
        })
    }

    pub fn collator(&self) -> &Collator {
        &self.collator
    }

    /// Add candidate labels. A label ending in a single `*` is kept even
    /// when it collates like its components.
    pub fn add_labels<I, S>(&mut self, labels: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.initial_labels.extend(labels.into_iter().map(Into::into));
        self.buckets = None;
        self
    }

    /// The documented synthesis fallback when no locale exemplars exist:
    /// Latin A through Z.
    pub fn add_default_labels(&mut self) -> &mut Self {
        self.add_labels(('A'..='Z').map(String::from))
    }

    /// Add the Chinese index labels from the tailoring: every contraction
    /// starting with the Pinyin base code point.
    pub fn add_chinese_index_labels(&mut self) -> &mut Self {
        let labels: Vec<String> = self
            .collator
            .tailoring()
            .contractions_starting_with(PINYIN_BASE)
            .into_iter()
            .map(String::from)
            .collect();
        self.add_labels(labels)
    }

    /// Cap on visible normal labels; oversized lists are thinned by
    /// even-spaced removal, never truncated from one end.
    pub fn set_max_label_count(&mut self, max: usize) -> &mut Self {
        self.max_label_count = max.max(1);
        self.buckets = None;
        self
    }

    pub fn set_underflow_label(&mut self, label: &str) -> &mut Self {
        self.underflow_label = label.to_string();
        self.buckets = None;
        self
    }

    pub fn set_inflow_label(&mut self, label: &str) -> &mut Self {
        self.inflow_label = label.to_string();
        self.buckets = None;
        self
    }

    pub fn set_overflow_label(&mut self, label: &str) -> &mut Self {
        self.overflow_label = label.to_string();
        self.buckets = None;
        self
    }

    pub fn add_record(&mut self, name: &str, value: V) -> &mut Self {
        self.records.push(Record {
            name: name.to_string(),
            value,
        });
        self.buckets = None;
        self
    }

    pub fn clear_records(&mut self) -> &mut Self {
        self.records.clear();
        self.buckets = None;
        self
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Number of visible buckets (underflow and overflow included).
    pub fn bucket_count(&mut self) -> usize {
        self.ensure_buckets().visible.len()
    }

    /// Visible bucket labels in display order.
    pub fn bucket_labels(&mut self) -> Vec<String> {
        let list = self.ensure_buckets();
        list.visible
            .iter()
            .map(|&i| list.buckets[i].label.clone())
            .collect()
    }

    pub fn bucket_label_type(&mut self, display_index: usize) -> Option<LabelType> {
        let list = self.ensure_buckets();
        let &i = list.visible.get(display_index)?;
        Some(list.buckets[i].label_type)
    }

    /// Records in one visible bucket, in collation order (ties keep
    /// insertion order).
    pub fn bucket_records(&mut self, display_index: usize) -> Option<Vec<&Record<V>>> {
        self.ensure_buckets();
        let list = self.buckets.as_ref().expect("bucket list just built");
        let &i = list.visible.get(display_index)?;
        Some(
            list.buckets[i]
                .records
                .iter()
                .map(|&r| &self.records[r])
                .collect(),
        )
    }

    /// Display index of the bucket `name` sorts into.
    pub fn get_bucket_index(&mut self, name: &str) -> usize {
        self.ensure_buckets();
        let list = self.buckets.as_ref().expect("bucket list just built");
        list.bucket_index(name, &self.primary)
    }

    /// A record-free projection safe for concurrent lookups.
    pub fn build_immutable(&mut self) -> ImmutableIndex {
        self.ensure_buckets();
        let list = self.buckets.as_ref().expect("bucket list just built");
        let mut buckets = list.clone();
        for bucket in &mut buckets.buckets {
            bucket.records.clear();
        }
        ImmutableIndex {
            buckets,
            primary: self.primary.clone(),
        }
    }

    // ------------------------------------------------------------------
    // Snapshot construction
    // ------------------------------------------------------------------

    fn ensure_buckets(&mut self) -> &BucketList {
        if self.buckets.is_none() {
            let mut list = self.create_bucket_list();
            self.fill_buckets(&mut list);
            self.buckets = Some(list);
        }
        self.buckets.as_ref().expect("bucket list just built")
    }

    /// Deduplicated, in-range, sorted, thinned labels.
    fn init_labels(&self) -> Vec<String> {
        let boundaries = self.collator.tailoring().script_boundaries();
        let first_boundary = &boundaries[0];
        let last_boundary = boundaries.last().expect("checked at construction");

        let mut labels: Vec<String> = Vec::new();
        for raw in &self.initial_labels {
            // Only a single trailing `*` forces; a label ending in `**`
            // is taken literally.
            let forced =
                raw.ends_with('*') && !raw.ends_with("**") && raw.chars().count() > 1;
            let label = if forced {
                &raw[..raw.len() - 1]
            } else {
                raw.as_str()
            };
            let cp_count = label.chars().count();
            if cp_count == 0 {
                continue;
            }
            if !forced && cp_count > 1 {
                // A multi-code-point label indistinguishable from its
                // joiner-separated components adds nothing.
                let mut separated = String::with_capacity(label.len() + cp_count * 2);
                for (i, c) in label.chars().enumerate() {
                    if i > 0 {
                        separated.push(CGJ);
                    }
                    separated.push(c);
                }
                if self.primary.compare(label, &separated) == Ordering::Equal {
                    continue;
                }
            }
            if self.primary.compare(label, first_boundary) == Ordering::Less {
                continue;
            }
            if self.primary.compare(label, last_boundary) != Ordering::Less {
                continue;
            }
            match labels.binary_search_by(|probe| self.primary.compare(probe, label)) {
                Ok(pos) => {
                    if is_one_label_better(label, &labels[pos]) {
                        labels[pos] = label.to_string();
                    }
                }
                Err(pos) => labels.insert(pos, label.to_string()),
            }
        }

        if labels.len() > self.max_label_count {
            // Even-spaced thinning: `size` is fixed before removal and the
            // counter walks the original order, so the kept positions are
            // exactly where `count * max / size` steps to a new value.
            let size = labels.len() - 1;
            let max = self.max_label_count;
            let mut count = 0usize;
            let mut old = -1i64;
            labels.retain(|_| {
                let bound = (count * max / size) as i64;
                count += 1;
                if bound == old {
                    false
                } else {
                    old = bound;
                    true
                }
            });
        }
        labels
    }

    fn create_bucket_list(&self) -> BucketList {
        let labels = self.init_labels();
        let boundaries = self.collator.tailoring().script_boundaries();
        let variable_top = if self.primary.options().alternate
            == crate::collator::AlternateHandling::Shifted
        {
            self.collator.tailoring().variable_top()
        } else {
            0
        };

        let mut buckets = vec![Bucket::new(
            self.underflow_label.clone(),
            String::new(),
            LabelType::Underflow,
        )];
        let mut has_invisible = false;
        let mut ascii_buckets: [Option<usize>; 26] = [None; 26];
        let mut pinyin_buckets: [Option<usize>; 26] = [None; 26];
        let mut has_pinyin = false;

        let mut script_index: usize = 0; // next boundary to consume
        let mut script_upper = "";
        for current in &labels {
            if self.primary.compare(current, script_upper) != Ordering::Less {
                // Crossed into a new script.
                let inflow_boundary = script_upper.to_string();
                let mut skipped_script = false;
                loop {
                    script_upper = boundaries[script_index].as_str();
                    script_index += 1;
                    if self.primary.compare(current, script_upper) == Ordering::Less {
                        break;
                    }
                    skipped_script = true;
                }
                if skipped_script && buckets.len() > 1 {
                    // Skipped whole scripts, and not merely leaving the
                    // underflow region.
                    buckets.push(Bucket::new(
                        self.inflow_label.clone(),
                        inflow_boundary,
                        LabelType::Inflow,
                    ));
                }
            }

            buckets.push(Bucket::new(
                fix_label(current),
                current.clone(),
                LabelType::Normal,
            ));
            let bucket_index = buckets.len() - 1;

            let mut chars = current.chars();
            match (chars.next(), chars.next(), chars.next()) {
                (Some(c @ 'A'..='Z'), None, _) => {
                    ascii_buckets[c as usize - 'A' as usize] = Some(bucket_index);
                }
                (Some(PINYIN_BASE), Some(c @ 'A'..='Z'), None) => {
                    pinyin_buckets[c as usize - 'A' as usize] = Some(bucket_index);
                    has_pinyin = true;
                }
                _ => {}
            }

            if !current.starts_with(PINYIN_BASE)
                && !current.ends_with('\u{FFFF}')
                && self.has_multiple_primary_weights(variable_top, current)
            {
                // "St" etc.: names sorting past the expansion's range must
                // fall back into the last plain single-weight bucket.
                let mut i = buckets.len() - 1;
                while i > 0 {
                    i -= 1;
                    if buckets[i].label_type != LabelType::Normal {
                        break;
                    }
                    if buckets[i].display_bucket.is_none()
                        && !self
                            .has_multiple_primary_weights(variable_top, &buckets[i].lower_boundary)
                    {
                        let mut redirect_boundary = current.clone();
                        redirect_boundary.push('\u{FFFF}');
                        let mut invisible =
                            Bucket::new(String::new(), redirect_boundary, LabelType::Normal);
                        invisible.display_bucket = Some(i);
                        buckets.push(invisible);
                        has_invisible = true;
                        break;
                    }
                }
            }
        }

        if buckets.len() == 1 {
            // No surviving labels: the underflow bucket stands alone.
            let mut list = BucketList {
                buckets,
                visible: Vec::new(),
            };
            list.assign_display_indices();
            return list;
        }

        buckets.push(Bucket::new(
            self.overflow_label.clone(),
            script_upper.to_string(),
            LabelType::Overflow,
        ));

        if has_pinyin {
            // Each Pinyin bucket displays into the nearest preceding ASCII
            // bucket.
            let mut ascii: Option<usize> = None;
            for i in 0..26 {
                if ascii_buckets[i].is_some() {
                    ascii = ascii_buckets[i];
                }
                if let (Some(pinyin), Some(ascii)) = (pinyin_buckets[i], ascii) {
                    buckets[pinyin].display_bucket = Some(ascii);
                    has_invisible = true;
                }
            }
        }

        if has_invisible {
            // Coalesce inflow buckets sitting right before another
            // non-normal bucket, scanning from the end so chains resolve
            // in one hop.
            let mut next_i = buckets.len() - 1;
            let mut i = next_i;
            while i > 1 {
                i -= 1;
                if buckets[i].display_bucket.is_some() {
                    continue;
                }
                if buckets[i].label_type == LabelType::Inflow
                    && buckets[next_i].label_type != LabelType::Normal
                {
                    buckets[i].display_bucket = Some(next_i);
                    continue;
                }
                next_i = i;
            }
        }

        let mut list = BucketList {
            buckets,
            visible: Vec::new(),
        };
        list.assign_display_indices();
        list
    }

    fn has_multiple_primary_weights(&self, variable_top: u32, s: &str) -> bool {
        let mut ces: Vec<Ce> = Vec::new();
        self.primary.collect_ces(s, &mut ces);
        let mut seen_primary = false;
        for ce in ces {
            let p = ce.primary();
            if p > variable_top && p != 0 {
                if seen_primary {
                    return true;
                }
                seen_primary = true;
            }
        }
        false
    }

    /// Stable-sort the records under the full collator and distribute them
    /// over the buckets in one linear pass.
    fn fill_buckets(&self, list: &mut BucketList) {
        if self.records.is_empty() {
            return;
        }
        let mut order: Vec<usize> = (0..self.records.len()).collect();
        order.sort_by(|&a, &b| {
            self.collator
                .compare(&self.records[a].name, &self.records[b].name)
        });

        let mut current = 0;
        let mut next = 1;
        for &record in &order {
            let name = &self.records[record].name;
            // Boundary advancement must match lookup, which searches at
            // primary strength.
            while next < list.buckets.len()
                && self
                    .primary
                    .compare(name, &list.buckets[next].lower_boundary)
                    != Ordering::Less
            {
                current = next;
                next += 1;
            }
            let target = list.buckets[current].display_bucket.unwrap_or(current);
            list.buckets[target].records.push(record);
        }
    }
}

/// Strip the Pinyin base prefix from a label for display.
fn fix_label(label: &str) -> String {
    label
        .strip_prefix(PINYIN_BASE)
        .unwrap_or(label)
        .to_string()
}

/// Tie-break between labels at the same primary position: fewer NFKD code
/// points wins, then NFKD binary order, then raw binary order.
fn is_one_label_better(a: &str, b: &str) -> bool {
    let na: String = a.nfkd().collect();
    let nb: String = b.nfkd().collect();
    let ca = na.chars().count();
    let cb = nb.chars().count();
    if ca != cb {
        return ca < cb;
    }
    if na != nb {
        return na < nb;
    }
    a < b
}

// ============================================================================
// IMMUTABLE PROJECTION
// ============================================================================

/// Record-free bucket lookup, safe to share across threads.
#[derive(Debug, Clone)]
pub struct ImmutableIndex {
    buckets: BucketList,
    primary: Collator,
}

impl ImmutableIndex {
    pub fn bucket_count(&self) -> usize {
        self.buckets.visible.len()
    }

    pub fn bucket_label(&self, display_index: usize) -> Option<&str> {
        let &i = self.buckets.visible.get(display_index)?;
        Some(&self.buckets.buckets[i].label)
    }

    pub fn bucket_label_type(&self, display_index: usize) -> Option<LabelType> {
        let &i = self.buckets.visible.get(display_index)?;
        Some(self.buckets.buckets[i].label_type)
    }

    pub fn get_bucket_index(&self, name: &str) -> usize {
        self.buckets.bucket_index(name, &self.primary)
    }
}
