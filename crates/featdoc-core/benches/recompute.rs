use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use featdoc_test_utils::chain_document;

fn bench_chain_recompute(c: &mut Criterion) {
    let mut group = c.benchmark_group("recompute.chain");
    for length in [10usize, 100, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(length), &length, |b, &length| {
            b.iter_batched(
                || {
                    let mut doc = chain_document(length);
                    doc.recompute().unwrap();
                    doc.set_property("Label_1", "Integer", 1).unwrap();
                    doc
                },
                |mut doc| black_box(doc.recompute().unwrap()),
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn bench_expression_chain(c: &mut Criterion) {
    c.bench_function("recompute.expression_chain_100", |b| {
        b.iter_batched(
            || {
                let mut doc = chain_document(100);
                for i in 2..=100 {
                    let formula = format!("Label_{}.Integer + 1", i - 1);
                    doc.set_expression(&format!("Label_{i}"), "Integer", Some(&formula))
                        .unwrap();
                }
                doc
            },
            |mut doc| black_box(doc.recompute().unwrap()),
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, bench_chain_recompute, bench_expression_chain);
criterion_main!(benches);
