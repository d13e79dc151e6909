//! Benchmarks for synced writes and family lookups.
//!
//! Run with: `cargo bench --package atom-sync --bench sync_bench`

use atom_sync::{AtomFamily, ConversionError, Converter, FamilyOptions, Observable, SyncFamily, SyncPair};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn int_text_pair() -> SyncPair<i64, String> {
    SyncPair::bind(
        Observable::new(0_i64),
        Observable::new(String::from("0")),
        |n: &i64| Ok(n.to_string()),
        |s: &String| s.parse().map_err(|_| ConversionError::new("not a number")),
    )
}

fn bench_pair_writes(c: &mut Criterion) {
    let mut group = c.benchmark_group("pair_write");

    let pair = int_text_pair();
    let mut n = 0_i64;
    group.bench_function("a_side_success", |b| {
        b.iter(|| {
            n += 1;
            pair.a().set(black_box(n));
        });
    });

    let pair = int_text_pair();
    let mut flip = false;
    group.bench_function("b_side_failure", |b| {
        b.iter(|| {
            flip = !flip;
            let text = if flip { "abc" } else { "abd" };
            pair.b().set(black_box(text.to_string()));
        });
    });

    let pair = int_text_pair();
    let _subs: Vec<_> = (0..16)
        .map(|_| pair.a().subscribe(|v| {
            black_box(v);
        }))
        .collect();
    let mut n = 0_i64;
    group.bench_function("a_side_16_subscribers", |b| {
        b.iter(|| {
            n += 1;
            pair.a().set(black_box(n));
        });
    });

    group.finish();
}

fn bench_family_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("family_lookup");

    for size in [16_u32, 256, 4096] {
        let nums = AtomFamily::new(|_: &u32| Observable::new(0_i64));
        let texts = AtomFamily::new(|_: &u32| Observable::new(String::new()));
        let family: SyncFamily<u32, i64, String> = SyncFamily::bind_with(
            move |k: &u32| nums.get(k),
            move |k: &u32| texts.get(k),
            Converter::new(
                |n: &i64| Ok(n.to_string()),
                |s: &String| s.parse().map_err(|_| ConversionError::new("not a number")),
            ),
            FamilyOptions::default(),
        );
        for k in 0..size {
            let _ = family.pair(&k);
        }

        group.bench_with_input(BenchmarkId::new("cached", size), &size, |b, &size| {
            let mut k = 0;
            b.iter(|| {
                k = (k + 1) % size;
                black_box(family.a(&k));
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_pair_writes, bench_family_lookup);
criterion_main!(benches);
