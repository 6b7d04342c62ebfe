//! Dispatch benchmark suite.
//!
//! Benchmarks the synchronous delivery path at different scales:
//! - Listener counts: 1, 10, 100
//! - Connection counts: 10, 100, 1000
//!
//! Run with: cargo bench --bench dispatch
//! Results saved to: target/criterion/

use std::hint::black_box;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use fake_eventsource::{Event, EventSourceInit, FakeEventSourceFactory, Listener, MessageDescriptor};
use serde_json::json;

// ============================================================================
// Benchmark Parameters
// ============================================================================

const LISTENER_COUNTS: &[usize] = &[1, 10, 100];
const CONNECTION_COUNTS: &[usize] = &[10, 100, 1000];

// ============================================================================
// Benchmark: Emit
// ============================================================================

fn bench_emit(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit");

    for &count in LISTENER_COUNTS {
        let factory = FakeEventSourceFactory::default();
        let source = factory
            .create("/stream", EventSourceInit::new())
            .expect("create connection");
        let hits = Arc::new(AtomicUsize::new(0));

        for _ in 0..count {
            let hits = Arc::clone(&hits);
            source.add_event_listener(
                "message",
                Listener::new(move |_: &Event| {
                    hits.fetch_add(1, Ordering::Relaxed);
                }),
            );
        }

        let proxy = factory.registry().most_recent().expect("tracked connection");

        group.bench_with_input(BenchmarkId::new("string", count), &count, |b, _| {
            b.iter(|| proxy.emit(black_box("tick")).expect("emit"));
        });

        group.bench_with_input(BenchmarkId::new("descriptor", count), &count, |b, _| {
            b.iter(|| {
                let descriptor = MessageDescriptor::new(json!({"seq": 1, "items": [1, 2, 3]}))
                    .with_type("message")
                    .with_id("42");
                proxy.emit_message(black_box(descriptor)).expect("emit")
            });
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Construction
// ============================================================================

fn bench_construct(c: &mut Criterion) {
    let mut group = c.benchmark_group("construct");

    for &count in CONNECTION_COUNTS {
        group.bench_with_input(BenchmarkId::new("connections", count), &count, |b, &n| {
            b.iter(|| {
                let factory = FakeEventSourceFactory::default();
                for i in 0..n {
                    factory
                        .create(&format!("/stream/{i}?q=1#frag"), EventSourceInit::new())
                        .expect("create connection");
                }
                black_box(factory.registry().count())
            });
        });
    }

    group.finish();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(benches, bench_emit, bench_construct);
criterion_main!(benches);
