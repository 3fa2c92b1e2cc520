//! Integration tests: end-to-end behavior against the canonical test
//! tailoring, covering comparison options, sort keys, key algebra,
//! iteration, and alphabetic index bucketing.

mod common;

use std::cmp::Ordering;

use common::{assert_key_well_formed, MIXED_NAMES};

use collatum::testing::{latin_collator, latin_tailoring, pinyin_tailoring};
use collatum::{
    AlphabeticIndex, AlternateHandling, BoundMode, CaseFirst, Collator, LabelType, Strength,
};

// ============================================================================
// COMPARISON OPTIONS
// ============================================================================

#[test]
fn case_pairs_split_at_tertiary_strength() {
    let mut c = latin_collator();
    c.set_strength(Strength::Primary);
    assert_eq!(c.compare("a", "A"), Ordering::Equal);
    c.set_strength(Strength::Secondary);
    assert_eq!(c.compare("a", "A"), Ordering::Equal);
    c.set_strength(Strength::Tertiary);
    assert_eq!(c.compare("a", "A"), Ordering::Less);

    c.set_case_first(CaseFirst::UpperFirst);
    assert_eq!(c.compare("a", "A"), Ordering::Greater);
}

#[test]
fn accents_split_at_secondary_strength() {
    let mut c = latin_collator();
    c.set_strength(Strength::Primary);
    assert_eq!(c.compare("pe", "p\u{E9}"), Ordering::Equal);
    c.set_strength(Strength::Secondary);
    assert_eq!(c.compare("pe", "p\u{E9}"), Ordering::Less);
}

#[test]
fn contraction_sorts_as_one_letter() {
    // "ch" is tailored after every other c-sequence, Spanish style.
    let c = latin_collator();
    assert_eq!(c.compare("chile", "czar"), Ordering::Greater);
    assert_eq!(c.compare("chile", "dark"), Ordering::Less);
    assert_eq!(c.compare("cz", "ch"), Ordering::Less);
}

#[test]
fn french_secondary_reverses_accent_order() {
    let mut c = latin_collator();
    assert_eq!(c.compare("a\u{E1}", "\u{E1}a"), Ordering::Less);
    c.set_french_secondary(true);
    assert_eq!(c.compare("a\u{E1}", "\u{E1}a"), Ordering::Greater);
}

#[test]
fn shifted_punctuation_is_quaternary_only() {
    let mut c = latin_collator();
    assert_ne!(c.compare("de-luge", "deluge"), Ordering::Equal);

    c.set_alternate_handling(AlternateHandling::Shifted);
    assert_eq!(c.compare("de-luge", "deluge"), Ordering::Equal);
    assert_eq!(c.compare("de-luge", "de luge"), Ordering::Equal);

    c.set_strength(Strength::Quaternary);
    assert_ne!(c.compare("de-luge", "deluge"), Ordering::Equal);
}

#[test]
fn numeric_mode_compares_digit_runs_by_value() {
    let mut c = latin_collator();
    assert_eq!(c.compare("file9", "file10"), Ordering::Greater);
    c.set_numeric(true);
    assert_eq!(c.compare("file9", "file10"), Ordering::Less);
    assert_eq!(c.compare("file010", "file10"), Ordering::Equal);
}

#[test]
fn identical_strength_respects_canonical_equivalence() {
    let mut c = latin_collator();
    c.set_strength(Strength::Identical);
    // The tie-break compares NFD code points, so precomposed and
    // decomposed spellings stay equal even at the last level.
    assert_eq!(c.compare("\u{E9}clair", "e\u{301}clair"), Ordering::Equal);
    assert_eq!(
        c.collation_key("\u{E9}clair").as_bytes(),
        c.collation_key("e\u{301}clair").as_bytes()
    );
    assert_ne!(c.compare("\u{E9}clair", "\u{E9}clair "), Ordering::Equal);
}

#[test]
fn frozen_collator_is_shareable() {
    let mut c = latin_collator();
    c.set_strength(Strength::Secondary);
    c.freeze();
    assert!(c.is_frozen());
    let c = std::sync::Arc::new(c);
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let c = std::sync::Arc::clone(&c);
            std::thread::spawn(move || c.compare("chile", "dark"))
        })
        .collect();
    for h in handles {
        assert_eq!(h.join().unwrap(), Ordering::Less);
    }
}

// ============================================================================
// SORT KEYS
// ============================================================================

#[test]
fn sorting_by_key_matches_sorting_by_compare() {
    let c = latin_collator();
    let mut by_compare: Vec<&str> = MIXED_NAMES.to_vec();
    by_compare.sort_by(|a, b| c.compare(a, b));
    let mut by_key: Vec<&str> = MIXED_NAMES.to_vec();
    by_key.sort_by_cached_key(|s| c.collation_key(s));
    assert_eq!(by_compare, by_key);
}

#[test]
fn keys_carry_their_source_and_structure() {
    let c = latin_collator();
    let key = c.collation_key("chile");
    assert_eq!(key.source(), Some("chile"));
    assert_key_well_formed(&key);
    assert_eq!(key.compare_to(&c.collation_key("chile")), Ordering::Equal);
}

#[test]
fn merged_keys_group_by_first_field() {
    // smith+jones sorts inside the smith primary class: after the bare
    // surname, before any longer surname sharing the prefix.
    let c = latin_collator();
    let smith_jones = c
        .collation_key("smith")
        .merge(&c.collation_key("jones"))
        .unwrap();
    let smith_zeta = c
        .collation_key("smith")
        .merge(&c.collation_key("zeta"))
        .unwrap();
    assert!(c.collation_key("smith") < smith_jones);
    assert!(smith_jones < smith_zeta);
    assert!(smith_zeta < c.collation_key("smithers"));
    assert!(smith_zeta < c.collation_key("smyth"));
}

#[test]
fn upper_bound_splits_adjacent_primaries() {
    let c = latin_collator();
    let abc = c.collation_key("abc");
    let upper = abc.bound(BoundMode::Upper, 1).unwrap();
    assert!(abc < upper);
    // Everything primary-equal to "abc" stays below the bound.
    assert!(c.collation_key("ABC") < upper);
    assert!(c.collation_key("\u{E1}bc") < upper);
    assert!(upper < c.collation_key("abd"));
}

#[test]
fn upper_long_bound_covers_prefixed_strings() {
    let c = latin_collator();
    let upper = c
        .collation_key("abc")
        .bound(BoundMode::UpperLong, 1)
        .unwrap();
    assert!(c.collation_key("abc") < upper);
    assert!(c.collation_key("abcdefg") < upper);
    assert!(upper < c.collation_key("abd"));
}

#[test]
fn bound_rejects_missing_levels() {
    use collatum::KeyError;
    let mut c = latin_collator();
    c.set_strength(Strength::Primary);
    let key = c.collation_key("abc");
    assert_eq!(key.bound(BoundMode::Lower, 0), Err(KeyError::ZeroLevels));
    assert_eq!(
        key.bound(BoundMode::Lower, 3),
        Err(KeyError::TooFewLevels {
            available: 1,
            requested: 3,
        })
    );
}

// ============================================================================
// ELEMENT ITERATION
// ============================================================================

#[test]
fn iterator_walks_both_directions() {
    let c = latin_collator();
    let text = "ach\u{E1}";
    let mut forward = Vec::new();
    let mut it = c.collation_element_iterator(text);
    loop {
        let order = it.next();
        if order == collatum::NULLORDER {
            break;
        }
        forward.push(order);
    }
    assert!(!forward.is_empty());

    it.reset();
    it.set_offset(text.len());
    let mut backward = Vec::new();
    loop {
        let order = it.previous();
        if order == collatum::NULLORDER {
            break;
        }
        backward.push(order);
    }
    backward.reverse();
    assert_eq!(forward, backward);
}

#[test]
fn set_offset_snaps_into_contractions() {
    let c = latin_collator();
    let mut inside = c.collation_element_iterator("achd");
    inside.set_offset(2); // between 'c' and 'h'
    let mut from_boundary = c.collation_element_iterator("achd");
    from_boundary.set_offset(1);
    assert_eq!(inside.next(), from_boundary.next());
}

#[test]
#[should_panic(expected = "illegal change of direction")]
fn direction_change_without_reset_panics() {
    let c = latin_collator();
    let mut it = c.collation_element_iterator("abc");
    it.next();
    it.next();
    it.previous();
}

// ============================================================================
// ALPHABETIC INDEX
// ============================================================================

#[test]
fn default_labels_bucket_plain_records() {
    let mut ix: AlphabeticIndex<u32> = AlphabeticIndex::new(latin_collator()).unwrap();
    ix.add_default_labels();
    ix.add_record("apple", 1)
        .add_record("Banana", 2)
        .add_record("!!!", 3);

    let apple = ix.get_bucket_index("apple");
    let labels = ix.bucket_labels();
    assert_eq!(labels[apple], "A");
    assert_eq!(ix.bucket_label_type(apple), Some(LabelType::Normal));

    assert_eq!(ix.get_bucket_index("!!!"), 0);
    assert_eq!(ix.bucket_label_type(0), Some(LabelType::Underflow));

    let names: Vec<&str> = ix
        .bucket_records(apple)
        .unwrap()
        .iter()
        .map(|r| r.name())
        .collect();
    assert_eq!(names, ["apple"]);
}

#[test]
fn accented_names_fold_into_base_letter_bucket() {
    let mut ix: AlphabeticIndex<()> = AlphabeticIndex::new(latin_collator()).unwrap();
    ix.add_default_labels();
    let e = ix.get_bucket_index("\u{C9}clair");
    assert_eq!(ix.bucket_labels()[e], "E");
    assert_eq!(ix.get_bucket_index("\u{E9}clair"), e);
}

#[test]
fn unlabeled_scripts_between_labels_share_an_inflow_bucket() {
    // Labels in Latin and CJK skip the Greek and Cyrillic scripts, so
    // names from both pool into one inflow bucket between "Z" and the
    // CJK label.
    let mut ix: AlphabeticIndex<()> = AlphabeticIndex::new(latin_collator()).unwrap();
    ix.add_default_labels();
    ix.add_labels(["\u{4E00}"]);
    let greek = ix.get_bucket_index("\u{0391}\u{03B8}");
    let cyrillic = ix.get_bucket_index("\u{042F}");
    assert_eq!(greek, cyrillic);
    assert_eq!(ix.bucket_label_type(greek), Some(LabelType::Inflow));
    let overflow = ix.get_bucket_index("\u{10FFFD}");
    assert_eq!(overflow, ix.bucket_count() - 1);
    assert_eq!(ix.bucket_label_type(overflow), Some(LabelType::Overflow));
}

#[test]
fn single_script_labels_send_later_scripts_to_overflow() {
    // With Latin-only labels nothing is skipped between labeled scripts,
    // so Greek and CJK names both fall past the last label into overflow.
    let mut ix: AlphabeticIndex<()> = AlphabeticIndex::new(latin_collator()).unwrap();
    ix.add_default_labels();
    let greek = ix.get_bucket_index("\u{0391}\u{03B8}");
    let cjk = ix.get_bucket_index("\u{4E00}");
    assert_eq!(greek, cjk);
    assert_eq!(ix.bucket_label_type(cjk), Some(LabelType::Overflow));
    assert_eq!(cjk, ix.bucket_count() - 1);
}

#[test]
fn pinyin_label_borrows_the_preceding_latin_bucket() {
    let collator = Collator::with_tailoring(pinyin_tailoring());
    let mut ix: AlphabeticIndex<()> = AlphabeticIndex::new(collator).unwrap();
    ix.add_default_labels();
    ix.add_chinese_index_labels();
    // A record weighted at the Pinyin label lands in the visible B bucket.
    let b = ix.get_bucket_index("\u{FDD0}B");
    assert_eq!(ix.bucket_labels()[b], "B");
}

#[test]
fn immutable_index_routes_like_its_builder() {
    let mut ix: AlphabeticIndex<()> = AlphabeticIndex::new(latin_collator()).unwrap();
    ix.add_default_labels();
    let expected: Vec<usize> = MIXED_NAMES.iter().map(|n| ix.get_bucket_index(n)).collect();
    let immutable = std::sync::Arc::new(ix.build_immutable());
    assert_eq!(immutable.bucket_count(), ix.bucket_count());

    let handles: Vec<_> = (0..3)
        .map(|_| {
            let im = std::sync::Arc::clone(&immutable);
            std::thread::spawn(move || {
                MIXED_NAMES.iter().map(|n| im.get_bucket_index(n)).collect::<Vec<_>>()
            })
        })
        .collect();
    for h in handles {
        assert_eq!(h.join().unwrap(), expected);
    }
}

#[test]
fn record_order_within_a_bucket_is_collation_order() {
    let mut ix: AlphabeticIndex<u32> = AlphabeticIndex::new(latin_collator()).unwrap();
    ix.add_default_labels();
    ix.add_record("adam", 1)
        .add_record("Abel", 2)
        .add_record("ada", 3);
    let a = ix.get_bucket_index("ada");
    let names: Vec<&str> = ix
        .bucket_records(a)
        .unwrap()
        .iter()
        .map(|r| r.name())
        .collect();
    assert_eq!(names, ["Abel", "ada", "adam"]);
}

// ============================================================================
// RULE-DRIVEN TAILORING END TO END
// ============================================================================

#[test]
fn runtime_rules_reorder_untouched_letters() {
    use collatum::{RuleBuilder, TailoringBuilder};
    // Swedish-style tailoring on top of nothing: z before the a-ring.
    let tailoring = RuleBuilder
        .parse_and_build("&z < \u{E5} <<< \u{C5}")
        .unwrap();
    let c = Collator::with_tailoring(std::sync::Arc::new(tailoring));
    assert_eq!(c.compare("z", "\u{E5}"), Ordering::Less);
    assert_eq!(c.compare("\u{E5}", "\u{C5}"), Ordering::Less);
}

#[test]
fn shared_tailoring_backs_many_collators() {
    let tailoring = latin_tailoring();
    let a = Collator::with_tailoring(std::sync::Arc::clone(&tailoring));
    let mut b = Collator::with_tailoring(tailoring);
    b.set_strength(Strength::Primary);
    assert_eq!(a.compare("a", "A"), Ordering::Less);
    assert_eq!(b.compare("a", "A"), Ordering::Equal);
}
