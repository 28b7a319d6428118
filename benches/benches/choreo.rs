// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{
    BatchSize, BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main,
};
use kurbo::Rect;
use understory_scroll_choreo::{
    ChoreoConfig, ChoreoEngine, GeometryRegistry, NoVisibility, ProgressMapper,
    ReferenceSpanPolicy, Sampler, ScrollBehavior, ScrollContainer, ScrollMetrics,
    SectionDescriptor, TransitionSink,
};

const SECTION_PX: f64 = 800.0;
const VIEWPORT_PX: f64 = 1000.0;

struct Page {
    offset: f64,
    content: f64,
}

impl ScrollContainer for Page {
    fn scroll_offset(&self) -> f64 {
        self.offset
    }

    fn scroll_to(&mut self, offset: f64, _behavior: ScrollBehavior) {
        self.offset = offset;
    }

    fn viewport_extent(&self) -> f64 {
        VIEWPORT_PX
    }

    fn content_extent(&self) -> f64 {
        self.content
    }
}

struct Discard;

impl TransitionSink for Discard {
    fn play_enter(&mut self, index: usize) {
        black_box(index);
    }

    fn play_exit(&mut self, index: usize) {
        black_box(index);
    }

    fn cancel(&mut self, index: usize) {
        black_box(index);
    }
}

fn stacked(index: usize) -> Option<Rect> {
    let top = index as f64 * SECTION_PX;
    Some(Rect::new(0.0, top, 600.0, top + SECTION_PX))
}

type BenchEngine = ChoreoEngine<Page, fn(usize) -> Option<Rect>, NoVisibility, Discard>;

fn engine(sections: usize, policy: ReferenceSpanPolicy) -> BenchEngine {
    let page = Page {
        offset: 0.0,
        content: sections as f64 * SECTION_PX,
    };
    let config = ChoreoConfig::default()
        .with_reference_span(policy)
        .with_snap(false);
    let mut engine = ChoreoEngine::new(
        config,
        page,
        stacked as fn(usize) -> Option<Rect>,
        NoVisibility,
        Discard,
    )
    .unwrap();
    engine
        .register_all((0..sections).map(|i| SectionDescriptor::new(i, "s", 1.0)))
        .unwrap();
    assert!(engine.measure_all().is_empty());
    engine
}

fn registry(sections: usize) -> GeometryRegistry {
    let mut registry = GeometryRegistry::new();
    for i in 0..sections {
        registry
            .register(SectionDescriptor::new(i, "s", 1.0 + (i % 3) as f64))
            .unwrap();
        registry.measure(i, &stacked).unwrap();
    }
    registry
}

fn bench_sample_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("choreo/sample_update");

    // Every sample recomputes progress for every section, so cost should be
    // linear in the section count.
    for sections in [8_usize, 64, 512, 4_096] {
        group.throughput(Throughput::Elements(sections as u64));
        for policy in [
            ReferenceSpanPolicy::ViewportHeight,
            ReferenceSpanPolicy::OwnHeight,
        ] {
            let name = match policy {
                ReferenceSpanPolicy::ViewportHeight => "viewport_height",
                ReferenceSpanPolicy::OwnHeight => "own_height",
            };
            let mut engine = engine(sections, policy);
            let span = sections as f64 * SECTION_PX - VIEWPORT_PX;
            let mut now = 0_u64;
            group.bench_function(BenchmarkId::new(name, sections), |b| {
                b.iter(|| {
                    now += 1;
                    // Walk the page in steps that cross section boundaries.
                    let offset = (now as f64 * 337.0) % span;
                    engine.container_mut().offset = offset;
                    engine.sync(now);
                    black_box(engine.drain_events().count());
                });
            });
        }
    }

    group.finish();
}

fn bench_progress_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("choreo/progress_map_all");
    for sections in [64_usize, 4_096] {
        let registry = registry(sections);
        let metrics = ScrollMetrics {
            viewport_extent: VIEWPORT_PX,
            content_extent: sections as f64 * SECTION_PX,
        };
        let mapper = ProgressMapper::new(ReferenceSpanPolicy::OwnHeight);
        let mut out = Vec::with_capacity(sections);
        group.throughput(Throughput::Elements(sections as u64));
        group.bench_function(BenchmarkId::from_parameter(sections), |b| {
            b.iter(|| {
                mapper.map_all(&registry, black_box(metrics.content_extent * 0.5), &metrics, &mut out);
                black_box(out.len());
            });
        });
    }
    group.finish();
}

fn bench_sampler_burst(c: &mut Criterion) {
    let mut group = c.benchmark_group("choreo/sampler_burst");

    // A fling: raw events every 4ms, far denser than the throttle window.
    for events in [100_u64, 1_000] {
        group.throughput(Throughput::Elements(events));
        group.bench_function(BenchmarkId::from_parameter(events), |b| {
            b.iter_batched(
                || Sampler::new(&ChoreoConfig::default(), 0.0),
                |mut sampler| {
                    for step in 0..events {
                        sampler.advance(step * 4);
                        sampler.record(step as f64 * 12.0, step * 4);
                    }
                    sampler.advance(events * 4 + 1_000);
                    black_box(sampler.drain_events().count());
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_sample_update,
    bench_progress_map,
    bench_sampler_burst
);
criterion_main!(benches);
