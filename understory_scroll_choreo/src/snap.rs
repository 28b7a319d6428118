// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Snapping to section boundaries once scrolling settles.
//!
//! When the sampler reports idle, the navigator picks a section and asks the
//! container to scroll smoothly to that section's start. With
//! [`SnapTarget::Directional`] the section is `ceil(page_position)` after
//! scrolling down and `floor(page_position)` after scrolling up, so a page
//! resting 60% into section 2 moves on to section 3 when the reader was
//! heading down and back to section 2 when heading up.
//!
//! The corrective scroll produces scroll events of its own, followed by
//! another idle signal. The navigator remembers that a correction is in
//! flight and treats the next idle as its completion instead of snapping
//! again. A container that lands on the target within `scroll_to` raises no
//! such events; [`SnapNavigator::settle_if_landed`] completes the correction
//! right away in that case.

use crate::config::{ChoreoConfig, SnapTarget};
use crate::direction::ScrollDirection;
use crate::geometry::GeometryRegistry;
use crate::host::ScrollBehavior;
use crate::progress::{ScrollMetrics, page_position};

/// Offsets closer than this to the target are considered aligned.
const ALIGNED_EPSILON_PX: f64 = 0.5;

/// A corrective scroll request.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SnapCommand {
    /// Index of the section being snapped to.
    pub index: usize,
    /// Target scroll offset.
    pub offset: f64,
    /// How to scroll there. Always smooth for snaps.
    pub behavior: ScrollBehavior,
}

/// Inputs for one snap decision.
#[derive(Copy, Clone, Debug)]
pub struct SnapContext<'a> {
    /// Registered sections.
    pub registry: &'a GeometryRegistry,
    /// Resting offset.
    pub offset: f64,
    /// Last reported direction.
    pub direction: ScrollDirection,
    /// Container extents.
    pub metrics: ScrollMetrics,
    /// Currently active section, for [`SnapTarget::ActiveSection`].
    pub active_section: Option<usize>,
}

/// Issues corrective scrolls when scrolling becomes idle.
#[derive(Clone, Debug)]
pub struct SnapNavigator {
    enabled: bool,
    target: SnapTarget,
    in_flight: Option<SnapCommand>,
}

impl SnapNavigator {
    /// Creates a navigator from the snap settings in `config`.
    #[must_use]
    pub fn new(config: &ChoreoConfig) -> Self {
        Self {
            enabled: config.snap_enabled,
            target: config.snap_target,
            in_flight: None,
        }
    }

    /// Whether snapping is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The correction currently in flight, if any.
    #[must_use]
    pub fn in_flight(&self) -> Option<SnapCommand> {
        self.in_flight
    }

    /// Handles the transition from scrolling to idle.
    ///
    /// Returns the command to issue, or `None` if snapping is disabled, the
    /// idle signal marks the end of our own correction, or the offset is
    /// already aligned.
    pub fn on_idle(&mut self, ctx: &SnapContext<'_>) -> Option<SnapCommand> {
        if !self.enabled {
            return None;
        }
        if let Some(done) = self.in_flight.take() {
            tracing::debug!(section = done.index, offset = done.offset, "snap correction settled");
            return None;
        }
        let command = self.plan(ctx)?;
        if (command.offset - ctx.offset).abs() < ALIGNED_EPSILON_PX {
            tracing::trace!(section = command.index, "already aligned; no snap");
            return None;
        }
        tracing::debug!(
            section = command.index,
            from = ctx.offset,
            to = command.offset,
            direction = ?ctx.direction,
            "snapping to section"
        );
        self.in_flight = Some(command);
        Some(command)
    }

    /// Completes the correction in flight if `offset` already rests on its
    /// target.
    ///
    /// Returns `true` if a correction was settled.
    pub fn settle_if_landed(&mut self, offset: f64) -> bool {
        match self.in_flight {
            Some(command) if (command.offset - offset).abs() < ALIGNED_EPSILON_PX => {
                tracing::debug!(section = command.index, offset, "snap correction landed");
                self.in_flight = None;
                true
            }
            _ => false,
        }
    }

    /// Computes the snap target without issuing it.
    #[must_use]
    pub fn plan(&self, ctx: &SnapContext<'_>) -> Option<SnapCommand> {
        let registry = ctx.registry;
        let len = registry.len();
        if len == 0 {
            return None;
        }
        let active_ordinal = match self.target {
            SnapTarget::ActiveSection => ctx
                .active_section
                .and_then(|index| registry.ordinal_of(index)),
            SnapTarget::Directional => None,
        };
        let ordinal = match active_ordinal {
            Some(ordinal) => ordinal,
            None => {
                let page = page_position(registry, ctx.offset, ctx.metrics.content_extent)?;
                match ctx.direction {
                    ScrollDirection::Down => ceil_index(page),
                    ScrollDirection::Up => floor_index(page),
                }
            }
        }
        .min(len - 1);
        let anchor = registry.anchor_px(ordinal, ctx.metrics.content_extent)?;
        Some(SnapCommand {
            index: registry.descriptors()[ordinal].index,
            offset: anchor.clamp(0.0, ctx.metrics.max_scroll()),
            behavior: ScrollBehavior::Smooth,
        })
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "Page positions are small non-negative section counts"
)]
fn floor_index(position: f64) -> usize {
    if position > 0.0 { position as usize } else { 0 }
}

fn ceil_index(position: f64) -> usize {
    let floor = floor_index(position);
    if (floor as f64) < position {
        floor + 1
    } else {
        floor
    }
}
