//! Performance benchmarks for flag evaluation.
//!
//! - Bucket computation cost
//! - Single evaluation latency with and without namespaces
//! - Evaluation throughput with concurrent readers
//! - Reads while the document is being replaced

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use feature_release::core::bucket;
use feature_release::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

fn bench_config(percentage: u8) -> ReleaseConfig {
    (0..64)
        .map(|i| {
            let rule = Rule::percentage(percentage)
                .with_target("pinned-on", true)
                .with_target("pinned-off", false);
            let entry = if i % 2 == 0 {
                FlagEntry::flat(rule)
            } else {
                FlagEntry::namespaced([("staging", rule.clone()), ("production", rule)])
            };
            (format!("flag-{}", i), entry)
        })
        .collect()
}

fn benchmark_bucket(c: &mut Criterion) {
    let mut group = c.benchmark_group("bucket");
    group.bench_function("md5_bucket", |b| {
        b.iter(|| black_box(bucket(black_box("flag-0.production"), black_box("user-12345"))));
    });
    group.finish();
}

fn benchmark_evaluation_latency(c: &mut Criterion) {
    let release = FeatureRelease::from_config(bench_config(50)).unwrap();

    let mut group = c.benchmark_group("evaluation_latency");
    group.bench_function("percentage", |b| {
        b.iter(|| black_box(release.is_enabled("flag-0", "user-12345", None)));
    });
    group.bench_function("individual_target", |b| {
        b.iter(|| black_box(release.is_enabled("flag-0", "pinned-on", None)));
    });
    group.bench_function("namespaced", |b| {
        b.iter(|| black_box(release.is_enabled("flag-1", "user-12345", Some("production"))));
    });
    group.bench_function("numeric_identifier", |b| {
        b.iter(|| black_box(release.is_enabled("flag-0", 12345u64, None)));
    });
    group.bench_function("unknown_flag", |b| {
        b.iter(|| black_box(release.evaluate("missing", "user-12345", None).enabled));
    });
    group.finish();
}

fn benchmark_concurrent_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_evaluation");

    for num_threads in [1, 2, 4, 8] {
        group.throughput(Throughput::Elements(num_threads as u64 * 1000));

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_threads", num_threads)),
            &num_threads,
            |b, &num_threads| {
                let release = FeatureRelease::from_config(bench_config(50)).unwrap();
                let barrier = Arc::new(Barrier::new(num_threads + 1));

                b.iter_custom(|iters| {
                    let handles: Vec<_> = (0..num_threads)
                        .map(|t| {
                            let release = release.clone();
                            let barrier = Arc::clone(&barrier);
                            thread::spawn(move || {
                                let id = format!("user-{}", t);
                                barrier.wait();

                                let start = Instant::now();
                                for _ in 0..iters {
                                    black_box(release.is_enabled("flag-1", id.as_str(), Some("staging")));
                                }
                                start.elapsed()
                            })
                        })
                        .collect();

                    barrier.wait();

                    let total: Duration = handles.into_iter().map(|h| h.join().unwrap()).sum();
                    total / num_threads as u32
                });
            },
        );
    }

    group.finish();
}

/// Replace the document repeatedly while readers keep evaluating.
fn benchmark_update_under_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_under_load");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(10));

    let documents = [bench_config(10), bench_config(90)];

    group.bench_function("update_with_8_readers", |b| {
        b.iter_custom(|iters| {
            let release = FeatureRelease::from_config(documents[0].clone()).unwrap();
            let running = Arc::new(AtomicBool::new(true));
            let reads = Arc::new(AtomicUsize::new(0));

            let readers: Vec<_> = (0..8)
                .map(|_| {
                    let release = release.clone();
                    let running = Arc::clone(&running);
                    let reads = Arc::clone(&reads);
                    thread::spawn(move || {
                        while running.load(Ordering::Relaxed) {
                            black_box(release.is_enabled("flag-0", "user-12345", None));
                            reads.fetch_add(1, Ordering::Relaxed);
                        }
                    })
                })
                .collect();

            let start = Instant::now();
            for i in 0..iters {
                release.update_config(documents[(i % 2) as usize].clone());
            }
            let duration = start.elapsed();

            running.store(false, Ordering::Relaxed);
            for reader in readers {
                reader.join().unwrap();
            }

            println!(
                "  Completed {} evaluations during {} updates",
                reads.load(Ordering::Relaxed),
                iters
            );
            duration
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_bucket,
    benchmark_evaluation_latency,
    benchmark_concurrent_evaluation,
    benchmark_update_under_load,
);

criterion_main!(benches);
