//! Message posting/delivery throughput.

use chronoflow::prelude::*;
use criterion::{criterion_group, criterion_main, Criterion, Throughput};

const MESSAGES: u64 = 1_000;

fn bench_post_delivery(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();

    let mut group = c.benchmark_group("post_delivery");
    group.throughput(Throughput::Elements(MESSAGES));

    for fanout in [1usize, 4] {
        group.bench_function(format!("fanout_{fanout}"), |b| {
            b.iter(|| {
                runtime.block_on(async {
                    let mut pipeline = Pipeline::new();
                    let mut input = pipeline.input::<u64>("input");
                    for i in 0..fanout {
                        let sink = pipeline.add_sink(format!("sink_{i}"), Collector::<u64>::new());
                        pipeline.connect(input.port(), sink).unwrap();
                    }
                    pipeline.start().unwrap();

                    for i in 0..MESSAGES {
                        input.post(i, Timestamp::from_nanos(i)).unwrap();
                    }
                    pipeline.drain().await.unwrap();
                    pipeline.stop().await;
                });
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_post_delivery);
criterion_main!(benches);
