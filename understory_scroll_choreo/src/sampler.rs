// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scroll telemetry: throttled samples, idle detection, and direction.
//!
//! The sampler turns a burst of raw scroll events into a sparse, ordered
//! stream of [`SamplerEvent`]s:
//!
//! - The first raw event after a quiet period (`idle_timeout_ms`) is sampled
//!   immediately, so scroll starts have no added latency.
//! - While scrolling continues, at most one sample is emitted per
//!   `sample_wait_ms` window. Raw events inside an open window are coalesced
//!   and the latest offset is emitted when the window closes (trailing edge).
//! - `idle_timeout_ms` after the last raw event the sampler reports
//!   [`SamplerEvent::Idle`]. A coalesced offset still waiting for its window
//!   is flushed first, so consumers see the final resting offset before the
//!   idle signal.
//!
//! Time is supplied by the caller. [`Sampler::record`] handles a raw event,
//! [`Sampler::advance`] fires timers that are due, and
//! [`Sampler::next_deadline`] says when the host should call `advance` next.
//!
//! ```
//! use understory_scroll_choreo::{ChoreoConfig, Sampler, SamplerEvent};
//!
//! let mut sampler = Sampler::new(&ChoreoConfig::default(), 0.0);
//!
//! sampler.record(120.0, 1_000); // leading edge: sampled now
//! sampler.record(300.0, 1_020); // coalesced
//! sampler.record(450.0, 1_040); // coalesced
//! sampler.advance(1_300);       // trailing edge at 1_100, idle at 1_190
//!
//! let positions: Vec<f64> = sampler
//!     .drain_events()
//!     .filter_map(|e| match e {
//!         SamplerEvent::Sample(s) => Some(s.position),
//!         _ => None,
//!     })
//!     .collect();
//! assert_eq!(positions, [120.0, 450.0]);
//! assert!(!sampler.is_scrolling());
//! ```

use alloc::collections::VecDeque;

use understory_timing::{TimerId, TimerQueue};

use crate::config::ChoreoConfig;
use crate::direction::{DirectionTracker, ScrollDirection};

/// One observed scroll position.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScrollSample {
    /// Scroll offset in pixels, never negative.
    pub position: f64,
    /// Host clock time the sample was taken, in milliseconds.
    pub timestamp_ms: u64,
}

/// Output of the [`Sampler`], in the order it happened.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SamplerEvent {
    /// A throttled scroll sample.
    Sample(ScrollSample),
    /// The direction flipped.
    DirectionChanged(ScrollDirection),
    /// Raw scroll events resumed after an idle period.
    ScrollStarted,
    /// No raw scroll events for `idle_timeout_ms`.
    Idle,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum SamplerTimer {
    Trailing,
    Idle,
}

/// Throttling scroll sampler with idle detection.
///
/// Emits a sample immediately on the first raw event after a quiet period,
/// then at most one per `sample_wait_ms` window, and reports idle
/// `idle_timeout_ms` after the last raw event.
#[derive(Debug)]
pub struct Sampler {
    wait_ms: u64,
    idle_timeout_ms: u64,
    direction: DirectionTracker,
    timers: TimerQueue<SamplerTimer>,
    trailing: Option<TimerId>,
    idle: Option<TimerId>,
    pending: Option<f64>,
    last_raw_ms: Option<u64>,
    last_emit_ms: Option<u64>,
    last_sample: Option<ScrollSample>,
    scrolling: bool,
    events: VecDeque<SamplerEvent>,
}

impl Sampler {
    /// Creates a sampler. `origin` is the container's offset at setup and
    /// seeds direction tracking.
    #[must_use]
    pub fn new(config: &ChoreoConfig, origin: f64) -> Self {
        Self {
            wait_ms: config.sample_wait_ms,
            idle_timeout_ms: config.idle_timeout_ms,
            direction: DirectionTracker::new(
                config.initial_direction,
                config.direction_threshold_px,
                origin,
            ),
            timers: TimerQueue::new(),
            trailing: None,
            idle: None,
            pending: None,
            last_raw_ms: None,
            last_emit_ms: None,
            last_sample: None,
            scrolling: false,
            events: VecDeque::new(),
        }
    }

    /// Handles one raw scroll event reporting `offset` at time `now_ms`.
    ///
    /// Negative offsets (rubber-band overscroll) are clamped to zero.
    /// Non-finite offsets are dropped.
    ///
    /// Timers due before `now_ms` should be fired with [`Sampler::advance`]
    /// first; the engine does this for you.
    pub fn record(&mut self, offset: f64, now_ms: u64) {
        if !offset.is_finite() {
            tracing::trace!(offset, "dropping non-finite scroll offset");
            return;
        }
        let position = offset.max(0.0);

        if let Some(direction) = self.direction.observe(position) {
            self.events.push_back(SamplerEvent::DirectionChanged(direction));
        }

        let quiet = self
            .last_raw_ms
            .is_none_or(|last| now_ms.saturating_sub(last) >= self.idle_timeout_ms);
        self.last_raw_ms = Some(now_ms);
        self.restart_idle(now_ms);
        if !self.scrolling {
            self.scrolling = true;
            self.events.push_back(SamplerEvent::ScrollStarted);
        }

        let window_open = self
            .last_emit_ms
            .is_some_and(|last| now_ms.saturating_sub(last) < self.wait_ms);
        if quiet || !window_open {
            if let Some(id) = self.trailing.take() {
                self.timers.cancel(id);
            }
            self.pending = None;
            self.emit(position, now_ms);
        } else {
            self.pending = Some(position);
            if self.trailing.is_none() {
                let deadline = self.last_emit_ms.unwrap_or(now_ms).saturating_add(self.wait_ms);
                self.trailing = Some(self.timers.schedule(deadline, SamplerTimer::Trailing));
            }
        }
    }

    /// Emits a sample for `offset` immediately, bypassing the throttle.
    ///
    /// Used to establish an initial state before any scroll event arrives.
    /// Does not affect `is_scrolling` or direction.
    pub fn sample_now(&mut self, offset: f64, now_ms: u64) {
        if offset.is_finite() {
            self.emit(offset.max(0.0), now_ms);
        }
    }

    /// Records where a programmatic scroll came to rest when the container
    /// reported no scroll events for it.
    ///
    /// Direction tracking observes `offset` and a sample is emitted, but
    /// idle detection is left alone.
    pub fn settle_at(&mut self, offset: f64, now_ms: u64) {
        if !offset.is_finite() {
            return;
        }
        let position = offset.max(0.0);
        if let Some(direction) = self.direction.observe(position) {
            self.events.push_back(SamplerEvent::DirectionChanged(direction));
        }
        self.emit(position, now_ms);
    }

    /// Fires every timer due at or before `now_ms`.
    pub fn advance(&mut self, now_ms: u64) {
        while let Some(expired) = self.timers.pop_expired(now_ms) {
            match expired.payload {
                SamplerTimer::Trailing => {
                    self.trailing = None;
                    if let Some(position) = self.pending.take() {
                        self.emit(position, expired.deadline);
                    }
                }
                SamplerTimer::Idle => {
                    self.idle = None;
                    if let Some(id) = self.trailing.take() {
                        self.timers.cancel(id);
                    }
                    if let Some(position) = self.pending.take() {
                        self.emit(position, expired.deadline);
                    }
                    self.scrolling = false;
                    tracing::debug!(at_ms = expired.deadline, "scrolling idle");
                    self.events.push_back(SamplerEvent::Idle);
                }
            }
        }
    }

    /// Earliest time [`Sampler::advance`] has work to do.
    #[must_use]
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    /// Pops the oldest pending event.
    pub fn poll_event(&mut self) -> Option<SamplerEvent> {
        self.events.pop_front()
    }

    /// Drains all pending events in order.
    pub fn drain_events(&mut self) -> impl Iterator<Item = SamplerEvent> + '_ {
        self.events.drain(..)
    }

    /// `true` from the first raw event until `idle_timeout_ms` after the last.
    #[must_use]
    pub fn is_scrolling(&self) -> bool {
        self.scrolling
    }

    /// Current direction.
    #[must_use]
    pub fn direction(&self) -> ScrollDirection {
        self.direction.direction()
    }

    /// Most recently emitted sample.
    #[must_use]
    pub fn last_sample(&self) -> Option<ScrollSample> {
        self.last_sample
    }

    fn restart_idle(&mut self, now_ms: u64) {
        let deadline = now_ms.saturating_add(self.idle_timeout_ms);
        match self.idle {
            Some(id) if self.timers.reschedule(id, deadline) => {}
            _ => self.idle = Some(self.timers.schedule(deadline, SamplerTimer::Idle)),
        }
    }

    fn emit(&mut self, position: f64, timestamp_ms: u64) {
        let sample = ScrollSample {
            position,
            timestamp_ms,
        };
        tracing::trace!(position, timestamp_ms, "scroll sample");
        self.last_emit_ms = Some(timestamp_ms);
        self.last_sample = Some(sample);
        self.events.push_back(SamplerEvent::Sample(sample));
    }
}
