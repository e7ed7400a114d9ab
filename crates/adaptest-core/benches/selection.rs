use criterion::{black_box, criterion_group, criterion_main, Criterion};

use adaptest_core::item::Item;
use adaptest_core::selector::{ItemSelector, MaximumInformation};

fn make_pool(n: u64) -> Vec<Item> {
    (0..n)
        .map(|i| Item::new(i, 0.5 + (i % 11) as f64 * 0.15, (i % 17) as f64 / 2.0 - 4.0, 0.2))
        .collect()
}

fn bench_max_information(c: &mut Criterion) {
    let mut group = c.benchmark_group("max_information");

    for n in [10u64, 100, 1000] {
        let pool = make_pool(n);
        let refs: Vec<&Item> = pool.iter().collect();
        group.bench_function(format!("items={n}"), |b| {
            b.iter(|| MaximumInformation.select(black_box(&refs), black_box(0.3)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_max_information);
criterion_main!(benches);
