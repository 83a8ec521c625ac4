//! Criterion benchmarks for the TourBox byte decoder.
//!
//! Decoding sits on the per-byte hot path of the driver loop, so it should
//! stay a single table lookup.
//!
//! Run with:
//! ```bash
//! cargo bench --package tourbox-core --bench decode_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tourbox_core::EventDecoder;

/// Representative bytes: press, release, primary tick, alternate tick, unknown.
const BENCH_BYTES: &[(&str, u8)] = &[
    ("press_side", 0x01),
    ("release_side", 0x81),
    ("tick_scroll_up", 0x49),
    ("tick_scroll_down_alt", 0xc9),
    ("unknown", 0x7e),
];

/// Benchmarks `EventDecoder::decode` for each kind of byte.
fn bench_decode_single(c: &mut Criterion) {
    let decoder = EventDecoder::new();

    let mut group = c.benchmark_group("decode");
    for (name, byte) in BENCH_BYTES {
        group.bench_with_input(BenchmarkId::new("byte", name), byte, |b, byte| {
            b.iter(|| decoder.decode(black_box(*byte)))
        });
    }
    group.finish();
}

/// Benchmarks decoding the full 256-byte space in one pass.
fn bench_decode_sweep(c: &mut Criterion) {
    let decoder = EventDecoder::new();
    let bytes: Vec<u8> = (0..=u8::MAX).collect();

    c.bench_function("decode_all_256", |b| {
        b.iter(|| {
            for byte in &bytes {
                black_box(decoder.decode(black_box(*byte)));
            }
        })
    });
}

/// Benchmarks building the decoder table.
fn bench_decoder_new(c: &mut Criterion) {
    c.bench_function("decoder_new", |b| b.iter(EventDecoder::new));
}

criterion_group!(benches, bench_decode_single, bench_decode_sweep, bench_decoder_new);
criterion_main!(benches);
