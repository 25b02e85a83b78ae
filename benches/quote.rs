//! Benchmarks for swap quoting and listing detection

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use listing_sniper::chain::constant_product_out;
use listing_sniper::detector::ListingDetector;
use rust_decimal_macros::dec;

fn benchmark_constant_product(c: &mut Criterion) {
    c.bench_function("constant_product_out", |b| {
        b.iter(|| {
            constant_product_out(
                black_box(dec!(1_000_000)),
                black_box(dec!(250_000)),
                black_box(dec!(1234.5)),
                black_box(dec!(0.0025)),
            )
        })
    });
}

fn benchmark_listing_detection(c: &mut Criterion) {
    let detector = ListingDetector::new("Binance");
    let announcement = "Binance will list Basic Attention Token (BAT) in the Innovation Zone";
    let noise = "Bitcoin hits a new all time high as volumes surge across venues";

    c.bench_function("detect_announcement", |b| {
        b.iter(|| detector.detect(black_box(announcement)))
    });

    c.bench_function("detect_noise", |b| {
        b.iter(|| detector.detect(black_box(noise)))
    });
}

criterion_group!(benches, benchmark_constant_product, benchmark_listing_detection);
criterion_main!(benches);
