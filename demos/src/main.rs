// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Headless scroll choreography demo.
//!
//! Runs a scripted scroll session against a synthetic page and logs what the
//! engine does: samples, state changes, transition calls, and snaps.
//!
//! ```text
//! cargo run -p understory_scroll_demos -- --scenario glide
//! RUST_LOG=understory_scroll_choreo=trace cargo run -p understory_scroll_demos -- --scenario resize
//! cargo run -p understory_scroll_demos -- --config page.toml --no-snap
//! ```
//!
//! A config file holds an optional `[choreo]` table (any `ChoreoConfig`
//! field) and a list of `[[sections]]`:
//!
//! ```toml
//! [choreo]
//! reference_span_policy = "own-height"
//! sample_wait_ms = 150
//!
//! [[sections]]
//! index = 0
//! label = "intro"
//! height_weight = 1.0
//!
//! [[sections]]
//! index = 1
//! label = "story"
//! height_weight = 3.0
//! ```

mod page;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use serde::Deserialize;
use understory_scroll_choreo::{
    ChoreoConfig, ChoreoEngine, EngineEvent, Invalidation, ReferenceSpanPolicy, SectionDescriptor,
};

use crate::page::{FRAME_MS, InViewport, LoggingTransitions, StackedLayout, SyntheticPage};

/// Scripted scroll sessions for `understory_scroll_choreo`.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// TOML file with `[choreo]` settings and `[[sections]]`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Scripted session to run.
    #[arg(long, value_enum, default_value_t = Scenario::Glide)]
    scenario: Scenario,

    /// Number of equal-weight sections, when the config file declares none.
    #[arg(long, default_value_t = 5)]
    sections: usize,

    /// Viewport height in pixels.
    #[arg(long, default_value_t = 1000.0)]
    viewport: f64,

    /// Normalize progress against each section's own height.
    #[arg(long)]
    own_height: bool,

    /// Disable snapping, as on touch devices.
    #[arg(long)]
    no_snap: bool,

    /// Override the sample throttle window.
    #[arg(long)]
    sample_wait_ms: Option<u64>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Scenario {
    /// Scroll down into the third section and let go.
    Glide,
    /// Scroll down, then back up before stopping.
    Reverse,
    /// Resize the page in the middle of a scroll.
    Resize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PageFile {
    choreo: ChoreoConfig,
    sections: Vec<SectionDescriptor>,
}

impl Args {
    fn load(&self) -> anyhow::Result<PageFile> {
        let mut file = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
            }
            None => PageFile::default(),
        };
        if file.sections.is_empty() {
            file.sections = (0..self.sections)
                .map(|i| SectionDescriptor::new(i, format!("section {i}"), 1.0))
                .collect();
        }
        if self.own_height {
            file.choreo.reference_span_policy = ReferenceSpanPolicy::OwnHeight;
        }
        if self.no_snap {
            file.choreo.snap_enabled = false;
        }
        if let Some(wait) = self.sample_wait_ms {
            file.choreo.sample_wait_ms = wait;
        }
        Ok(file)
    }
}

type Engine = ChoreoEngine<SyntheticPage, StackedLayout, InViewport, LoggingTransitions>;

/// A running session: the engine plus the simulated clock.
struct Session {
    engine: Engine,
    now_ms: u64,
}

impl Session {
    fn new(file: PageFile, viewport: f64) -> anyhow::Result<Self> {
        let layout = StackedLayout::new(&file.sections, viewport);
        let page = SyntheticPage::new(viewport, layout.content_extent());
        let visibility = InViewport::new(page.offset_handle(), viewport, &layout);
        let transitions = LoggingTransitions::new(&file.sections);
        let mut engine = ChoreoEngine::new(file.choreo, page, layout, visibility, transitions)?;
        engine.register_all(file.sections)?;
        let failed = engine.measure_all();
        anyhow::ensure!(failed.is_empty(), "sections {failed:?} could not be measured");
        engine.sync(0);
        let mut session = Self { engine, now_ms: 0 };
        session.report();
        Ok(session)
    }

    /// Advances one frame, moving the page by `delta` if non-zero.
    ///
    /// Returns `true` if the page moved.
    fn frame(&mut self, delta: f64) -> bool {
        self.now_ms += FRAME_MS;
        let now = self.now_ms;
        if self.engine.next_deadline().is_some_and(|deadline| deadline <= now) {
            self.engine.advance(now);
        }
        let moved = if delta == 0.0 {
            self.engine.container_mut().animate()
        } else {
            self.engine.container_mut().scroll_by(delta)
        };
        if moved {
            self.engine.on_scroll(now);
        }
        self.report();
        moved
    }

    /// Scrolls toward `target` at `speed` pixels per frame.
    fn user_scroll(&mut self, target: f64, speed: f64) {
        loop {
            let remaining = target - self.engine.container().offset();
            if remaining.abs() < 0.5 || !self.frame(remaining.clamp(-speed, speed)) {
                break;
            }
        }
    }

    /// Runs frames until nothing is scrolling, animating or pending.
    fn settle(&mut self) {
        for _ in 0..1_000 {
            self.frame(0.0);
            let busy = self.engine.is_scrolling()
                || self.engine.container().is_animating()
                || self.engine.next_deadline().is_some();
            if !busy {
                return;
            }
        }
        tracing::warn!("session did not settle");
    }

    fn report(&mut self) {
        let now = self.now_ms;
        for event in self.engine.drain_events() {
            match event {
                EngineEvent::Sampled(sample) => {
                    tracing::info!(t = now, position = sample.position, "sample");
                }
                EngineEvent::StateChanged(change) => tracing::info!(
                    t = now,
                    section = change.index,
                    from = ?change.from,
                    to = ?change.to,
                    "state"
                ),
                EngineEvent::DirectionChanged(direction) => {
                    tracing::info!(t = now, ?direction, "direction");
                }
                EngineEvent::ScrollStarted => tracing::info!(t = now, "scrolling"),
                EngineEvent::ScrollIdle => tracing::info!(t = now, "idle"),
                EngineEvent::Snapped(command) => tracing::info!(
                    t = now,
                    section = command.index,
                    offset = command.offset,
                    "snap"
                ),
            }
        }
    }

    fn summary(&self) {
        let engine = &self.engine;
        println!("offset {:.1} at t={}ms", engine.container().offset(), self.now_ms);
        println!(
            "page position {:.3}, scroll ratio {:.3}, direction {:?}",
            engine.page_progress().unwrap_or(0.0),
            engine.scroll_ratio().unwrap_or(0.0),
            engine.direction(),
        );
        for (index, state) in engine.states() {
            let label = engine
                .registry()
                .descriptor(index)
                .map_or("?", |d| d.label.as_str());
            let progress = engine
                .progress(index)
                .map_or_else(|| "unknown".to_owned(), |p| format!("{p:.3}"));
            let state = format!("{state:?}");
            println!("  {index:>2} {label:<16} {state:<9} progress {progress}");
        }
        println!(
            "transitions: {} enter, {} exit, {} cancel",
            engine.transitions().enters,
            engine.transitions().exits,
            engine.transitions().cancels,
        );
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,understory_scroll_choreo=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let file = args.load()?;
    let mut session = Session::new(file, args.viewport)?;
    let viewport = args.viewport;

    match args.scenario {
        Scenario::Glide => {
            session.user_scroll(viewport * 2.6, 60.0);
            session.settle();
        }
        Scenario::Reverse => {
            session.user_scroll(viewport * 2.5, 60.0);
            session.user_scroll(viewport * 1.7, 45.0);
            session.settle();
        }
        Scenario::Resize => {
            session.user_scroll(viewport * 2.4, 60.0);
            tracing::info!("layout change: page resized");
            session.engine.layout_mut().set_ready(false);
            session.engine.on_layout_change(Invalidation::All);
            session.user_scroll(viewport * 2.8, 30.0);
            session.engine.layout_mut().set_ready(true);
            let failed = session.engine.measure_missing();
            anyhow::ensure!(failed.is_empty(), "sections {failed:?} could not be remeasured");
            session.report();
            session.settle();
        }
    }

    session.summary();
    Ok(())
}
