// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Engine configuration.
//!
//! Every behavioral difference between scroll-driven page variants is a field
//! here rather than a separate code path: touch layouts turn snapping off,
//! fixed-height scroll-jacking uses the viewport as the reference span, and
//! sections with unusual exit points declare a [`BoundaryOverride`].

use alloc::vec::Vec;

use crate::direction::ScrollDirection;
use crate::error::{ChoreoError, ConfigIssue};

/// Default throttle window for scroll samples.
pub const DEFAULT_SAMPLE_WAIT_MS: u64 = 100;
/// Default quiet period after which scrolling is considered idle.
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 150;
/// Default direction hysteresis.
pub const DEFAULT_DIRECTION_THRESHOLD_PX: f64 = 64.0;
/// Default intersection ratio for the first-section rule.
pub const DEFAULT_VISIBILITY_THRESHOLD: f64 = 0.99;

/// Which extent a section's progress is normalized against.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum ReferenceSpanPolicy {
    /// The section's own measured height. Suits variable-height sections.
    OwnHeight,
    /// The container's viewport height. Suits fixed-height scroll-jacking.
    #[default]
    ViewportHeight,
}

/// How the snap navigator picks its target once scrolling is idle.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum SnapTarget {
    /// `ceil` of the page position when the last direction was down,
    /// `floor` when it was up.
    #[default]
    Directional,
    /// The start of the currently active section, falling back to
    /// [`SnapTarget::Directional`] when no section is active.
    ActiveSection,
}

/// How a [`BoundaryOverride`] compares progress to its boundary value.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum BoundaryMatch {
    /// Exact floating-point equality.
    ///
    /// This reproduces pages that treat e.g. `p == 2/3` as an exit point.
    /// Progress rarely lands on such a value exactly, so prefer
    /// [`BoundaryMatch::Within`] for new content.
    Exact,
    /// `|progress - value| <= tolerance`.
    Within(f64),
}

impl BoundaryMatch {
    /// Returns `true` if `progress` hits `boundary` under this rule.
    #[must_use]
    pub fn matches(self, progress: f64, boundary: f64) -> bool {
        match self {
            Self::Exact => progress == boundary,
            Self::Within(tolerance) => (progress - boundary).abs() <= tolerance,
        }
    }
}

/// An extra exit boundary for one section.
///
/// When the section's progress matches `value`, the section is treated as
/// outside its active range even though `value` lies strictly inside `(0, 1)`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundaryOverride {
    /// Section index the override applies to.
    pub index: usize,
    /// Progress value treated as an exit boundary.
    pub value: f64,
    /// Comparison rule.
    pub matching: BoundaryMatch,
}

impl BoundaryOverride {
    /// An exact-equality exit boundary.
    #[must_use]
    pub const fn exact(index: usize, value: f64) -> Self {
        Self {
            index,
            value,
            matching: BoundaryMatch::Exact,
        }
    }

    /// A tolerance-based exit boundary.
    #[must_use]
    pub const fn within(index: usize, value: f64, tolerance: f64) -> Self {
        Self {
            index,
            value,
            matching: BoundaryMatch::Within(tolerance),
        }
    }

    /// Returns `true` if `progress` hits this boundary.
    #[must_use]
    pub fn matches(&self, progress: f64) -> bool {
        self.matching.matches(progress, self.value)
    }

    fn validate(&self) -> Result<(), ConfigIssue> {
        let tolerance_ok = match self.matching {
            BoundaryMatch::Exact => true,
            BoundaryMatch::Within(t) => t.is_finite() && t >= 0.0,
        };
        if !(0.0..=1.0).contains(&self.value) || !tolerance_ok {
            return Err(ConfigIssue::InvalidBoundaryOverride {
                index: self.index,
                value: self.value,
            });
        }
        Ok(())
    }
}

/// Configuration for a [`ChoreoEngine`](crate::ChoreoEngine).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct ChoreoConfig {
    /// Throttle window: at most one sample per window while scrolling
    /// continuously. `0` disables throttling.
    pub sample_wait_ms: u64,
    /// Quiet period after the last raw scroll event before scrolling is
    /// reported idle. The first event after such a period is sampled
    /// immediately.
    pub idle_timeout_ms: u64,
    /// Minimum movement before the reported direction may change.
    pub direction_threshold_px: f64,
    /// Direction reported before the first flip.
    pub initial_direction: ScrollDirection,
    /// What section progress is normalized against.
    pub reference_span_policy: ReferenceSpanPolicy,
    /// Whether the snap navigator issues corrective scrolls.
    ///
    /// Typically disabled on small viewports and touch devices, where native
    /// momentum scrolling fights programmatic correction.
    pub snap_enabled: bool,
    /// How the snap navigator chooses its target.
    pub snap_target: SnapTarget,
    /// Treat section `0` as active at progress `0` while it is in view.
    pub first_section_boundary_rule: bool,
    /// Intersection ratio passed to the visibility provider.
    pub visibility_threshold: f64,
    /// Per-section extra exit boundaries.
    pub boundary_overrides: Vec<BoundaryOverride>,
}

impl Default for ChoreoConfig {
    fn default() -> Self {
        Self {
            sample_wait_ms: DEFAULT_SAMPLE_WAIT_MS,
            idle_timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
            direction_threshold_px: DEFAULT_DIRECTION_THRESHOLD_PX,
            initial_direction: ScrollDirection::Down,
            reference_span_policy: ReferenceSpanPolicy::default(),
            snap_enabled: true,
            snap_target: SnapTarget::default(),
            first_section_boundary_rule: true,
            visibility_threshold: DEFAULT_VISIBILITY_THRESHOLD,
            boundary_overrides: Vec::new(),
        }
    }
}

impl ChoreoConfig {
    /// Sets [`ChoreoConfig::sample_wait_ms`].
    #[must_use]
    pub fn with_sample_wait_ms(mut self, wait: u64) -> Self {
        self.sample_wait_ms = wait;
        self
    }

    /// Sets [`ChoreoConfig::reference_span_policy`].
    #[must_use]
    pub fn with_reference_span(mut self, policy: ReferenceSpanPolicy) -> Self {
        self.reference_span_policy = policy;
        self
    }

    /// Sets [`ChoreoConfig::snap_enabled`].
    #[must_use]
    pub fn with_snap(mut self, enabled: bool) -> Self {
        self.snap_enabled = enabled;
        self
    }

    /// Sets [`ChoreoConfig::snap_target`].
    #[must_use]
    pub fn with_snap_target(mut self, target: SnapTarget) -> Self {
        self.snap_target = target;
        self
    }

    /// Adds a boundary override.
    #[must_use]
    pub fn with_boundary_override(mut self, boundary: BoundaryOverride) -> Self {
        self.boundary_overrides.push(boundary);
        self
    }

    /// Checks the configuration for values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ChoreoError> {
        if self.idle_timeout_ms == 0 {
            return Err(ConfigIssue::ZeroIdleTimeout.into());
        }
        if !self.direction_threshold_px.is_finite() || self.direction_threshold_px < 0.0 {
            return Err(ConfigIssue::InvalidDirectionThreshold(self.direction_threshold_px).into());
        }
        if !(0.0..=1.0).contains(&self.visibility_threshold) {
            return Err(ConfigIssue::InvalidVisibilityThreshold(self.visibility_threshold).into());
        }
        for boundary in &self.boundary_overrides {
            boundary.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ChoreoConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.sample_wait_ms, 100);
        assert_eq!(config.idle_timeout_ms, 150);
        assert_eq!(config.direction_threshold_px, 64.0);
    }

    #[test]
    fn zero_idle_timeout_is_rejected() {
        let config = ChoreoConfig {
            idle_timeout_ms: 0,
            ..ChoreoConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ChoreoError::InvalidConfiguration(ConfigIssue::ZeroIdleTimeout))
        );
    }

    #[test]
    fn nan_threshold_is_rejected() {
        let config = ChoreoConfig {
            direction_threshold_px: f64::NAN,
            ..ChoreoConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ChoreoError::InvalidConfiguration(
                ConfigIssue::InvalidDirectionThreshold(_)
            ))
        ));
    }

    #[test]
    fn out_of_range_boundary_is_rejected() {
        let config = ChoreoConfig::default().with_boundary_override(BoundaryOverride::exact(3, 1.5));
        assert_eq!(
            config.validate(),
            Err(ChoreoError::InvalidConfiguration(
                ConfigIssue::InvalidBoundaryOverride {
                    index: 3,
                    value: 1.5
                }
            ))
        );

        let negative_tolerance = ChoreoConfig::default()
            .with_boundary_override(BoundaryOverride::within(3, 0.5, -0.1));
        assert!(negative_tolerance.validate().is_err());
    }

    #[test]
    fn exact_boundary_only_matches_exactly() {
        let boundary = BoundaryOverride::exact(3, 2.0 / 3.0);
        assert!(boundary.matches(2.0 / 3.0));
        assert!(!boundary.matches(0.666_666));
    }

    #[test]
    fn tolerance_boundary_matches_nearby_values() {
        let boundary = BoundaryOverride::within(3, 2.0 / 3.0, 1e-3);
        assert!(boundary.matches(0.666_666));
        assert!(boundary.matches(0.6672));
        assert!(!boundary.matches(0.7));
    }
}
