// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_scroll_choreo --heading-base-level=0

//! Understory Scroll Choreo: scroll-driven section choreography.
//!
//! "Scrollytelling" pages split content into ordered sections and react to
//! the scroll position: a section fades in as it is reached, fades out as it
//! is left, and the page may snap to the next section once the reader stops
//! scrolling. This crate is the logic behind that, with no knowledge of any
//! particular document model or animation library.
//!
//! The pipeline, leaf first:
//!
//! - [`Sampler`]: throttles raw scroll events into [`ScrollSample`]s, detects
//!   idle, and derives a [`ScrollDirection`] with a pixel threshold.
//! - [`GeometryRegistry`]: declared [`SectionDescriptor`]s plus their measured
//!   [`SectionGeometry`]. Invalidated geometry is *gone*, not stale.
//! - [`ProgressMapper`]: per-section progress in `[0, 1]`, or unknown.
//! - [`ActivationMachine`]: per-section [`SectionState`] from progress.
//! - [`TransitionDispatcher`]: state changes to `play_enter`/`play_exit`
//!   calls, idempotent, cancelling superseded transitions.
//! - [`SnapNavigator`]: a smooth corrective scroll to a section boundary when
//!   scrolling settles.
//!
//! [`ChoreoEngine`] wires these together. Hosts supply four collaborators
//! (a [`ScrollContainer`], a [`LayoutProvider`], a [`VisibilityProvider`],
//! and a [`TransitionSink`]) and forward scroll events, timer ticks and
//! layout changes, each stamped with a millisecond clock of their choosing.
//!
//! ## Minimal example
//!
//! ```rust
//! use kurbo::Rect;
//! use understory_scroll_choreo::{
//!     ChoreoConfig, ChoreoEngine, EngineEvent, NoVisibility, ScrollBehavior,
//!     ScrollContainer, SectionDescriptor, SectionState, TransitionSink,
//! };
//!
//! struct Page { offset: f64 }
//! impl ScrollContainer for Page {
//!     fn scroll_offset(&self) -> f64 { self.offset }
//!     fn scroll_to(&mut self, offset: f64, _: ScrollBehavior) { self.offset = offset; }
//!     fn viewport_extent(&self) -> f64 { 1000.0 }
//!     fn content_extent(&self) -> f64 { 5000.0 }
//! }
//!
//! #[derive(Default)]
//! struct Fades(Vec<String>);
//! impl TransitionSink for Fades {
//!     fn play_enter(&mut self, i: usize) { self.0.push(format!("in {i}")); }
//!     fn play_exit(&mut self, i: usize) { self.0.push(format!("out {i}")); }
//!     fn cancel(&mut self, _: usize) {}
//! }
//!
//! // Five sections, one viewport tall each.
//! let layout = |i: usize| Some(Rect::new(0.0, i as f64 * 1000.0, 800.0, (i + 1) as f64 * 1000.0));
//! let mut engine = ChoreoEngine::new(
//!     ChoreoConfig::default(),
//!     Page { offset: 0.0 },
//!     layout,
//!     NoVisibility,
//!     Fades::default(),
//! )?;
//! engine.register_all((0..5).map(|i| SectionDescriptor::new(i, format!("s{i}"), 1.0)))?;
//! engine.measure_all();
//!
//! engine.container_mut().offset = 2500.0;
//! engine.on_scroll(1_000);
//! assert_eq!(engine.progress(2), Some(0.5));
//! assert_eq!(engine.state(2), Some(SectionState::Active));
//! assert_eq!(engine.transitions().0, ["in 2"]);
//!
//! // 150ms later the reader has stopped: snap forward to section 3.
//! // This page lands immediately, so the engine samples 3000 right away.
//! engine.advance(1_150);
//! assert_eq!(engine.container().offset, 3000.0);
//! assert!(!engine.is_snapping());
//! assert_eq!(engine.transitions().0, ["in 2", "out 2"]);
//!
//! // Events queue up until the host drains them.
//! let snaps = engine
//!     .drain_events()
//!     .filter(|event| matches!(event, EngineEvent::Snapped(_)))
//!     .count();
//! assert_eq!(snaps, 1);
//! # Ok::<(), understory_scroll_choreo::ChoreoError>(())
//! ```
//!
//! ## Features
//!
//! - `std` (default): forwards to Kurbo, `thiserror` and `tracing`.
//! - `libm`: Kurbo floating point support without `std`.
//! - `serde`: `Serialize`/`Deserialize` for configuration and value types.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod activation;
mod config;
mod direction;
mod dispatch;
mod engine;
mod error;
mod geometry;
mod host;
mod progress;
mod sampler;
mod snap;

pub use activation::{ActivationMachine, SectionState, StateChange, StateChanges};
pub use config::{
    BoundaryMatch, BoundaryOverride, ChoreoConfig, DEFAULT_DIRECTION_THRESHOLD_PX,
    DEFAULT_IDLE_TIMEOUT_MS, DEFAULT_SAMPLE_WAIT_MS, DEFAULT_VISIBILITY_THRESHOLD,
    ReferenceSpanPolicy, SnapTarget,
};
pub use direction::{DirectionTracker, ScrollDirection};
pub use dispatch::{TransitionDispatcher, TransitionIntent};
pub use engine::{ChoreoEngine, EngineEvent};
pub use error::{ChoreoError, ConfigIssue};
pub use geometry::{GeometryRegistry, Invalidation, SectionDescriptor, SectionGeometry};
pub use host::{
    LayoutProvider, NoVisibility, ScrollBehavior, ScrollContainer, TransitionSink,
    VisibilityProvider,
};
pub use progress::{
    ProgressMapper, ScrollMetrics, SectionProgress, collapsed_extent, normalized_progress,
    page_position,
};
pub use sampler::{Sampler, SamplerEvent, ScrollSample};
pub use snap::{SnapCommand, SnapContext, SnapNavigator};
