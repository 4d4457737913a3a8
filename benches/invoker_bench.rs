//! Benchmarks for the invoker.
//!
//! Benchmarks cover:
//! - Raw queue append/get throughput
//! - End-to-end unit throughput with and without performance tracking
//! - Result hand-off through the channel pump

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::sync::Arc;

use serial_invoker::config::InvokerConfig;
use serial_invoker::core::{result_channel, FnUnit, Invoker, UnitQueue};

// ============================================================================
// Queue
// ============================================================================

fn bench_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue");
    for size in [100_u64, 1_000, 10_000] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::new("append_then_get", size), &size, |b, &size| {
            b.iter(|| {
                let q = UnitQueue::new();
                for i in 0..size {
                    q.append(black_box(i));
                }
                for _ in 0..size {
                    black_box(q.get());
                }
            });
        });
    }
    group.finish();
}

// ============================================================================
// Invoker
// ============================================================================

fn run_units(count: u64, config: InvokerConfig) -> u64 {
    let (receiver, _pump) = result_channel();
    let invoker = Invoker::builder("bench", Arc::new(receiver))
        .config(config)
        .build()
        .expect("invoker starts");
    for i in 0..count {
        invoker.post(FnUnit::new("noop", "bench", move || Ok(black_box(i))));
    }
    invoker.shutdown_and_join().expect("invoker stops").units_run()
}

fn bench_invoker(c: &mut Criterion) {
    let mut group = c.benchmark_group("invoker");
    let count = 1_000_u64;
    group.throughput(Throughput::Elements(count));

    group.bench_function("tracked", |b| {
        b.iter(|| run_units(count, InvokerConfig::new()));
    });
    group.bench_function("untracked", |b| {
        b.iter(|| run_units(count, InvokerConfig::new().with_perf_tracking(false)));
    });
    group.finish();
}

fn bench_result_handoff(c: &mut Criterion) {
    let count = 1_000_u64;
    let mut group = c.benchmark_group("result_handoff");
    group.throughput(Throughput::Elements(count));

    group.bench_function("channel_pump", |b| {
        b.iter(|| {
            let (receiver, pump) = result_channel();
            let invoker = Invoker::new("handoff", Arc::new(receiver)).expect("invoker starts");
            for i in 0..count {
                invoker.post(
                    FnUnit::new("echo", "bench", move || Ok(i)).then(|v| {
                        black_box(v);
                    }),
                );
            }
            invoker.shutdown_and_join().expect("invoker stops");
            pump.run_pending()
        });
    });
    group.finish();
}

criterion_group!(benches, bench_queue, bench_invoker, bench_result_handoff);
criterion_main!(benches);
