//! Extraction throughput on synthetic matches.
//!
//! A full match is roughly 200 possessions and 1,000 to 1,800 events.
//!
//! Run with: `cargo bench -p mf_core --bench extraction_bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use mf_core::{extract, segment, ExtractionConfig, LiveExtractor, SegmentationMode};

#[path = "../tests/common/mod.rs"]
mod common;

use common::{synthetic_match, US};

fn bench_extract(c: &mut Criterion) {
    let config = ExtractionConfig::new(US);
    let mut group = c.benchmark_group("extract");
    group.sample_size(20);
    for possessions in [50u32, 200, 800] {
        let events = synthetic_match(1, possessions);
        group.bench_with_input(
            BenchmarkId::from_parameter(possessions),
            &events,
            |b, events| b.iter(|| extract(black_box(events), None, &config)),
        );
    }
    group.finish();
}

fn bench_segment(c: &mut Criterion) {
    let events = synthetic_match(2, 200);
    c.bench_function("segment_full_match", |b| {
        b.iter(|| segment(black_box(&events), SegmentationMode::ByPossessionId))
    });
}

fn bench_live(c: &mut Criterion) {
    let events = synthetic_match(3, 200);
    c.bench_function("live_full_match", |b| {
        b.iter(|| {
            let mut live = match LiveExtractor::new(ExtractionConfig::new(US)) {
                Ok(live) => live,
                Err(_) => return 0,
            };
            let mut emitted = 0usize;
            for event in events.iter().cloned() {
                if let Ok(Some(_)) = live.push(event) {
                    emitted += 1;
                }
            }
            emitted + usize::from(live.finish().is_some())
        })
    });
}

criterion_group!(benches, bench_extract, bench_segment, bench_live);
criterion_main!(benches);
