//! Benchmarks for comparison, sort key generation, and index bucketing.
//!
//! Simulates realistic name-list sizes:
//! - Small list:  ~50 names   (address book page)
//! - Medium list: ~500 names  (company directory)
//! - Large list:  ~5000 names (city phone book)
//!
//! Run with: cargo bench
//!
//! Scenarios covered:
//! - compare: equal strings, shared prefixes, contraction-heavy text
//! - keys: one-shot keys, reused raw-key buffers, sorting a list
//! - index: bucket construction and record routing

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use collatum::testing::latin_collator;
use collatum::{AlphabeticIndex, RawCollationKey, Strength};

// ============================================================================
// NAME CORPUS SIMULATION
// ============================================================================

/// List size configurations matching real-world scenarios
struct ListSize {
    name: &'static str,
    names: usize,
}

const LIST_SIZES: &[ListSize] = &[
    ListSize {
        name: "small",
        names: 50,
    },
    ListSize {
        name: "medium",
        names: 500,
    },
    ListSize {
        name: "large",
        names: 5000,
    },
];

/// Base vocabulary mixing plain ASCII, case variants, accents, the "ch"
/// contraction, digits, and non-Latin scripts.
const BASE_NAMES: &[&str] = &[
    "abbott",
    "Abbott",
    "achebe",
    "adams",
    "\u{E1}lvarez",
    "baker",
    "Baker",
    "banner",
    "chandler",
    "Chavez",
    "chmiel",
    "clark",
    "czerny",
    "dietrich",
    "dubois",
    "\u{E9}mile",
    "\u{C9}mile",
    "edwards",
    "fischer",
    "garc\u{E9}s",
    "hardy",
    "ibanez",
    "jackson",
    "keller",
    "lambert",
    "martinez",
    "nelson",
    "osei",
    "peters",
    "quinn",
    "richter",
    "schmidt",
    "thompson",
    "ulrich",
    "vasquez",
    "wagner",
    "xiong",
    "yamada",
    "zimmerman",
    "unit 9",
    "unit 10",
    "unit 115",
    "\u{0391}\u{03B8}\u{03B1}\u{03BD}\u{03B1}\u{03C3}",
    "\u{0418}\u{0432}\u{0430}\u{043D}",
    "\u{4E00}\u{90CE}",
];

/// Deterministic name list of the requested size, cycling the vocabulary
/// with numeric suffixes so most names are distinct.
fn make_names(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            let base = BASE_NAMES[i % BASE_NAMES.len()];
            if i < BASE_NAMES.len() {
                base.to_string()
            } else {
                format!("{base} {}", i / BASE_NAMES.len())
            }
        })
        .collect()
}

// ============================================================================
// COMPARISON
// ============================================================================

fn bench_compare(c: &mut Criterion) {
    let collator = latin_collator();
    let mut group = c.benchmark_group("compare");

    group.bench_function("equal_strings", |b| {
        b.iter(|| {
            collator.compare(
                black_box("chandler richardson"),
                black_box("chandler richardson"),
            )
        });
    });

    group.bench_function("shared_prefix", |b| {
        b.iter(|| {
            collator.compare(
                black_box("chandler richardson"),
                black_box("chandler richards"),
            )
        });
    });

    group.bench_function("early_divergence", |b| {
        b.iter(|| collator.compare(black_box("abbott"), black_box("zimmerman")));
    });

    group.bench_function("contraction_heavy", |b| {
        b.iter(|| collator.compare(black_box("chachapoyas"), black_box("chachani")));
    });

    group.bench_function("case_only_difference", |b| {
        b.iter(|| collator.compare(black_box("chandler"), black_box("Chandler")));
    });

    group.finish();
}

fn bench_compare_options(c: &mut Criterion) {
    let mut group = c.benchmark_group("compare_options");

    let mut numeric = latin_collator();
    numeric.set_numeric(true);
    group.bench_function("numeric_digit_runs", |b| {
        b.iter(|| numeric.compare(black_box("unit 0001234"), black_box("unit 1235")));
    });

    let mut french = latin_collator();
    french.set_french_secondary(true);
    group.bench_function("french_secondary", |b| {
        b.iter(|| french.compare(black_box("p\u{E9}che a la crema"), black_box("peche \u{E1} la crema")));
    });

    let mut identical = latin_collator();
    identical.set_strength(Strength::Identical);
    group.bench_function("identical_strength", |b| {
        b.iter(|| identical.compare(black_box("\u{E9}clair au caf\u{E9}"), black_box("e\u{301}clair au caf\u{E9}")));
    });

    group.finish();
}

// ============================================================================
// SORT KEYS
// ============================================================================

fn bench_keys(c: &mut Criterion) {
    let collator = latin_collator();
    let mut group = c.benchmark_group("keys");

    for size in LIST_SIZES {
        let names = make_names(size.names);
        group.throughput(Throughput::Elements(size.names as u64));

        group.bench_with_input(
            BenchmarkId::new("collation_key", size.name),
            &names,
            |b, names| {
                b.iter(|| {
                    for name in names {
                        black_box(collator.collation_key(black_box(name)));
                    }
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("raw_key_reused_buffer", size.name),
            &names,
            |b, names| {
                let mut buf = RawCollationKey::new();
                b.iter(|| {
                    for name in names {
                        collator.raw_collation_key(black_box(name), &mut buf);
                        black_box(buf.as_bytes());
                    }
                });
            },
        );
    }

    group.finish();
}

fn bench_sorting(c: &mut Criterion) {
    let collator = latin_collator();
    let mut group = c.benchmark_group("sorting");

    for size in LIST_SIZES {
        let names = make_names(size.names);
        group.throughput(Throughput::Elements(size.names as u64));

        group.bench_with_input(
            BenchmarkId::new("sort_by_compare", size.name),
            &names,
            |b, names| {
                b.iter(|| {
                    let mut v: Vec<&String> = names.iter().collect();
                    v.sort_by(|a, b| collator.compare(a, b));
                    black_box(v)
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("sort_by_cached_key", size.name),
            &names,
            |b, names| {
                b.iter(|| {
                    let mut v: Vec<&String> = names.iter().collect();
                    v.sort_by_cached_key(|s| collator.collation_key(s));
                    black_box(v)
                });
            },
        );
    }

    group.finish();
}

// ============================================================================
// ALPHABETIC INDEX
// ============================================================================

fn bench_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("index");

    for size in LIST_SIZES {
        let names = make_names(size.names);
        group.throughput(Throughput::Elements(size.names as u64));

        group.bench_with_input(
            BenchmarkId::new("bucket_records", size.name),
            &names,
            |b, names| {
                b.iter(|| {
                    let mut ix: AlphabeticIndex<usize> =
                        AlphabeticIndex::new(latin_collator()).unwrap();
                    ix.add_default_labels();
                    for (i, name) in names.iter().enumerate() {
                        ix.add_record(name, i);
                    }
                    black_box(ix.bucket_count())
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("route_names_immutable", size.name),
            &names,
            |b, names| {
                let mut ix: AlphabeticIndex<()> =
                    AlphabeticIndex::new(latin_collator()).unwrap();
                ix.add_default_labels();
                let immutable = ix.build_immutable();
                b.iter(|| {
                    let mut total = 0usize;
                    for name in names {
                        total += immutable.get_bucket_index(black_box(name));
                    }
                    black_box(total)
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_compare,
    bench_compare_options,
    bench_keys,
    bench_sorting,
    bench_index
);
criterion_main!(benches);
