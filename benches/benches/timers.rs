// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use understory_timing::TimerQueue;

fn bench_debounce_restart(c: &mut Criterion) {
    let mut group = c.benchmark_group("timing/debounce_restart");

    // One debounce timer pushed back on every input, with `pending` unrelated
    // timers in the queue.
    for pending in [0_u64, 64, 4_096] {
        group.bench_function(BenchmarkId::from_parameter(pending), |b| {
            b.iter_batched(
                || {
                    let mut timers = TimerQueue::new();
                    for i in 0..pending {
                        timers.schedule(1_000_000 + i, i);
                    }
                    let id = timers.schedule(150, u64::MAX);
                    (timers, id)
                },
                |(mut timers, id)| {
                    for now in 0..256_u64 {
                        timers.reschedule(id, now + 150);
                    }
                    black_box(timers.next_deadline());
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("timing/drain_expired");
    for len in [64_u64, 4_096] {
        group.bench_function(BenchmarkId::from_parameter(len), |b| {
            b.iter_batched(
                || {
                    let mut timers = TimerQueue::new();
                    for i in 0..len {
                        timers.schedule((i * 7919) % len, i);
                    }
                    timers
                },
                |mut timers| black_box(timers.drain_expired(len).count()),
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_debounce_restart, bench_drain);
criterion_main!(benches);
