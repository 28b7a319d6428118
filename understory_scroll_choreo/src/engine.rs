// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The engine: wiring the sampler, geometry, progress, activation, dispatch
//! and snapping together behind the host collaborators.
//!
//! ## Driving the engine
//!
//! The host forwards three kinds of input, each stamped with its own clock:
//!
//! - [`ChoreoEngine::on_scroll`] for every raw scroll event of the container,
//! - [`ChoreoEngine::advance`] when [`ChoreoEngine::next_deadline`] has passed,
//! - [`ChoreoEngine::on_layout_change`] when layout changed, followed by
//!   [`ChoreoEngine::measure_missing`] once the new layout is available.
//!
//! Every emitted sample is processed to completion (progress for all
//! sections, state changes, transition calls) before the next one. What
//! happened is queued as [`EngineEvent`]s; drain them with
//! [`ChoreoEngine::drain_events`].

use alloc::collections::VecDeque;
use alloc::vec::Vec;

use crate::activation::{ActivationMachine, SectionState, StateChange, StateChanges};
use crate::config::ChoreoConfig;
use crate::direction::ScrollDirection;
use crate::dispatch::{TransitionDispatcher, TransitionIntent};
use crate::error::ChoreoError;
use crate::geometry::{GeometryRegistry, Invalidation, SectionDescriptor, SectionGeometry};
use crate::host::{LayoutProvider, ScrollContainer, TransitionSink, VisibilityProvider};
use crate::progress::{ProgressMapper, ScrollMetrics, SectionProgress, page_position};
use crate::sampler::{Sampler, SamplerEvent, ScrollSample};
use crate::snap::{SnapCommand, SnapContext, SnapNavigator};

/// Something the engine did, in the order it happened.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum EngineEvent {
    /// A sample was processed.
    Sampled(ScrollSample),
    /// A section changed state.
    StateChanged(StateChange),
    /// The reported scroll direction flipped.
    DirectionChanged(ScrollDirection),
    /// Scrolling resumed after being idle.
    ScrollStarted,
    /// Scrolling became idle.
    ScrollIdle,
    /// A corrective scroll was issued.
    Snapped(SnapCommand),
}

/// Scroll choreography engine.
///
/// Generic over its four host collaborators: a [`ScrollContainer`], a
/// [`LayoutProvider`], a [`VisibilityProvider`] and a [`TransitionSink`].
///
/// # Event queue
///
/// Every sample, state change, direction flip, idle signal and snap is also
/// recorded as an [`EngineEvent`]. The queue is unbounded: a host that
/// drives the engine for a long time must call
/// [`ChoreoEngine::drain_events`] regularly (once per frame is typical),
/// even if it only relies on the [`TransitionSink`] calls.
#[derive(Debug)]
pub struct ChoreoEngine<C, L, V, T> {
    config: ChoreoConfig,
    container: C,
    layout: L,
    visibility: V,
    transitions: T,
    sampler: Sampler,
    registry: GeometryRegistry,
    mapper: ProgressMapper,
    machine: ActivationMachine,
    dispatcher: TransitionDispatcher,
    snap: SnapNavigator,
    progress: Vec<SectionProgress>,
    changes: StateChanges,
    events: VecDeque<EngineEvent>,
}

impl<C, L, V, T> ChoreoEngine<C, L, V, T>
where
    C: ScrollContainer,
    L: LayoutProvider,
    V: VisibilityProvider,
    T: TransitionSink,
{
    /// Creates an engine.
    ///
    /// Fails with [`ChoreoError::InvalidConfiguration`] if `config` does not
    /// validate, and with [`ChoreoError::ContainerUnavailable`] if the
    /// container is detached or has no usable viewport.
    pub fn new(
        config: ChoreoConfig,
        container: C,
        layout: L,
        visibility: V,
        transitions: T,
    ) -> Result<Self, ChoreoError> {
        config.validate()?;
        let viewport = container.viewport_extent();
        if !container.is_attached() || !viewport.is_finite() || viewport <= 0.0 {
            tracing::warn!(viewport, "scroll container unavailable");
            return Err(ChoreoError::ContainerUnavailable);
        }
        let origin = container.scroll_offset();
        let origin = if origin.is_finite() { origin.max(0.0) } else { 0.0 };
        Ok(Self {
            sampler: Sampler::new(&config, origin),
            registry: GeometryRegistry::new(),
            mapper: ProgressMapper::new(config.reference_span_policy),
            machine: ActivationMachine::new(&config),
            dispatcher: TransitionDispatcher::new(),
            snap: SnapNavigator::new(&config),
            progress: Vec::new(),
            changes: StateChanges::new(),
            events: VecDeque::new(),
            config,
            container,
            layout,
            visibility,
            transitions,
        })
    }

    /// Registers a section. It starts inactive and unmeasured.
    pub fn register(&mut self, descriptor: SectionDescriptor) -> Result<(), ChoreoError> {
        let index = descriptor.index;
        let ordinal = self.registry.register(descriptor)?;
        self.machine.insert(ordinal, index);
        Ok(())
    }

    /// Registers several sections, stopping at the first error.
    pub fn register_all(
        &mut self,
        descriptors: impl IntoIterator<Item = SectionDescriptor>,
    ) -> Result<(), ChoreoError> {
        descriptors
            .into_iter()
            .try_for_each(|descriptor| self.register(descriptor))
    }

    /// Measures one section.
    ///
    /// Does not reprocess the current sample; call [`ChoreoEngine::refresh`]
    /// after measuring a batch individually.
    pub fn measure(&mut self, index: usize) -> Result<SectionGeometry, ChoreoError> {
        let result = self.registry.measure(index, &self.layout);
        if let Err(ChoreoError::GeometryUnavailable { .. }) = &result {
            tracing::warn!(section = index, "section geometry unavailable");
        }
        result
    }

    /// Measures every registered section and reprocesses the current sample.
    ///
    /// Returns the indices that could not be measured; their progress is
    /// unknown until a later measurement succeeds.
    pub fn measure_all(&mut self) -> Vec<usize> {
        let indices: Vec<usize> = self.registry.descriptors().iter().map(|s| s.index).collect();
        let failed = indices
            .into_iter()
            .filter(|&index| self.measure(index).is_err())
            .collect();
        self.refresh();
        failed
    }

    /// Measures the sections without current geometry (after an
    /// invalidation) and reprocesses the current sample.
    pub fn measure_missing(&mut self) -> Vec<usize> {
        let failed = self.registry.measure_missing(&self.layout);
        for &index in &failed {
            tracing::warn!(section = index, "section geometry unavailable");
        }
        self.refresh();
        failed
    }

    /// Handles a layout change by dropping the affected geometry.
    ///
    /// Affected sections report unknown progress from this call on, and keep
    /// their state, until they are measured again.
    pub fn on_layout_change(&mut self, what: Invalidation) {
        self.registry.invalidate(what);
        self.refresh();
    }

    /// Handles a raw scroll event of the container at `now_ms`.
    pub fn on_scroll(&mut self, now_ms: u64) {
        self.sampler.advance(now_ms);
        self.pump(now_ms);
        let offset = self.container.scroll_offset();
        self.sampler.record(offset, now_ms);
        self.pump(now_ms);
    }

    /// Fires timers due at or before `now_ms`.
    pub fn advance(&mut self, now_ms: u64) {
        self.sampler.advance(now_ms);
        self.pump(now_ms);
    }

    /// When [`ChoreoEngine::advance`] should be called next.
    #[must_use]
    pub fn next_deadline(&self) -> Option<u64> {
        self.sampler.next_deadline()
    }

    /// Samples the container's current offset immediately.
    ///
    /// Use after setup (and after the initial measurement) to establish
    /// section states before the first scroll event.
    pub fn sync(&mut self, now_ms: u64) {
        let offset = self.container.scroll_offset();
        self.sampler.sample_now(offset, now_ms);
        self.pump(now_ms);
    }

    /// Reprocesses the last sample against current geometry.
    pub fn refresh(&mut self) {
        if let Some(sample) = self.sampler.last_sample() {
            self.process_sample(sample.position);
        }
    }

    /// Records that the transition for `index` finished.
    pub fn complete_transition(&mut self, index: usize) -> Option<TransitionIntent> {
        self.dispatcher.complete(index)
    }

    /// Drains queued events.
    ///
    /// Events accumulate until drained; see the type docs.
    pub fn drain_events(&mut self) -> impl Iterator<Item = EngineEvent> + '_ {
        self.events.drain(..)
    }

    /// State of section `index`.
    #[must_use]
    pub fn state(&self, index: usize) -> Option<SectionState> {
        self.machine.state(index)
    }

    /// All section states in index order.
    pub fn states(&self) -> impl Iterator<Item = (usize, SectionState)> + '_ {
        self.machine.states()
    }

    /// Progress of section `index` at the last sample; `None` if unknown or
    /// no sample was processed.
    #[must_use]
    pub fn progress(&self, index: usize) -> Option<f64> {
        self.progress
            .binary_search_by_key(&index, |p| p.index)
            .ok()
            .and_then(|slot| self.progress[slot].value)
    }

    /// Progress of every section at the last sample, in index order.
    #[must_use]
    pub fn progress_values(&self) -> &[SectionProgress] {
        &self.progress
    }

    /// Reported scroll direction.
    #[must_use]
    pub fn direction(&self) -> ScrollDirection {
        self.sampler.direction()
    }

    /// `true` while raw scroll events keep arriving.
    #[must_use]
    pub fn is_scrolling(&self) -> bool {
        self.sampler.is_scrolling()
    }

    /// The last processed sample.
    #[must_use]
    pub fn last_sample(&self) -> Option<ScrollSample> {
        self.sampler.last_sample()
    }

    /// The most recently entered section that is still on, else the lowest
    /// section that is on.
    #[must_use]
    pub fn active_section(&self) -> Option<usize> {
        self.machine.active_section()
    }

    /// Position along the page in section units at the last sample.
    ///
    /// `2.6` means 60% through the third section's weighted span.
    #[must_use]
    pub fn page_progress(&self) -> Option<f64> {
        let sample = self.sampler.last_sample()?;
        page_position(
            &self.registry,
            sample.position,
            self.container.content_extent(),
        )
    }

    /// `(offset + viewport) / content` at the last sample, clamped to `[0, 1]`.
    #[must_use]
    pub fn scroll_ratio(&self) -> Option<f64> {
        let sample = self.sampler.last_sample()?;
        self.metrics().scroll_ratio(sample.position)
    }

    /// `true` while a snap correction has not settled yet.
    #[must_use]
    pub fn is_snapping(&self) -> bool {
        self.snap.in_flight().is_some()
    }

    /// The configuration the engine was built with.
    #[must_use]
    pub fn config(&self) -> &ChoreoConfig {
        &self.config
    }

    /// Registered sections and their geometry.
    #[must_use]
    pub fn registry(&self) -> &GeometryRegistry {
        &self.registry
    }

    /// The scroll container.
    #[must_use]
    pub fn container(&self) -> &C {
        &self.container
    }

    /// The scroll container, mutably.
    pub fn container_mut(&mut self) -> &mut C {
        &mut self.container
    }

    /// The layout provider.
    #[must_use]
    pub fn layout(&self) -> &L {
        &self.layout
    }

    /// The layout provider, mutably.
    pub fn layout_mut(&mut self) -> &mut L {
        &mut self.layout
    }

    /// The visibility provider, mutably.
    pub fn visibility_mut(&mut self) -> &mut V {
        &mut self.visibility
    }

    /// The transition sink.
    #[must_use]
    pub fn transitions(&self) -> &T {
        &self.transitions
    }

    /// The transition sink, mutably.
    pub fn transitions_mut(&mut self) -> &mut T {
        &mut self.transitions
    }

    fn metrics(&self) -> ScrollMetrics {
        ScrollMetrics {
            viewport_extent: self.container.viewport_extent(),
            content_extent: self.container.content_extent(),
        }
    }

    fn pump(&mut self, now_ms: u64) {
        while let Some(event) = self.sampler.poll_event() {
            match event {
                SamplerEvent::Sample(sample) => {
                    self.events.push_back(EngineEvent::Sampled(sample));
                    self.process_sample(sample.position);
                }
                SamplerEvent::DirectionChanged(direction) => {
                    self.events.push_back(EngineEvent::DirectionChanged(direction));
                }
                SamplerEvent::ScrollStarted => self.events.push_back(EngineEvent::ScrollStarted),
                SamplerEvent::Idle => {
                    self.events.push_back(EngineEvent::ScrollIdle);
                    self.on_idle(now_ms);
                }
            }
        }
    }

    fn process_sample(&mut self, position: f64) {
        let metrics = self.metrics();
        self.mapper
            .map_all(&self.registry, position, &metrics, &mut self.progress);
        for p in &self.progress {
            tracing::trace!(section = p.index, progress = ?p.value, "section progress");
        }

        self.changes.clear();
        let threshold = self.config.visibility_threshold;
        let visibility = &self.visibility;
        self.machine.update(
            &self.progress,
            |index| visibility.is_in_view(index, threshold),
            &mut self.changes,
        );
        self.dispatcher
            .dispatch_all(&self.changes, &mut self.transitions);
        self.events
            .extend(self.changes.iter().copied().map(EngineEvent::StateChanged));
    }

    fn on_idle(&mut self, now_ms: u64) {
        let Some(sample) = self.sampler.last_sample() else {
            return;
        };
        let ctx = SnapContext {
            registry: &self.registry,
            offset: sample.position,
            direction: self.sampler.direction(),
            metrics: self.metrics(),
            active_section: self.machine.active_section(),
        };
        if let Some(command) = self.snap.on_idle(&ctx) {
            self.container.scroll_to(command.offset, command.behavior);
            self.events.push_back(EngineEvent::Snapped(command));
            // No scroll events will follow an instant landing; record it here.
            let landed = self.container.scroll_offset();
            if self.snap.settle_if_landed(landed) {
                self.sampler.settle_at(landed, now_ms);
            }
        }
    }
}
