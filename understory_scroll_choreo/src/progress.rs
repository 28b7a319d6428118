// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mapping scroll offsets to normalized section progress.
//!
//! For each section:
//!
//! ```text
//! value = clamp((offset - anchor) / reference_span, 0, 1)
//! ```
//!
//! where `anchor` is the section's weighted start offset (see
//! [`GeometryRegistry::anchor_px`]) and `reference_span` is either the
//! section's own measured height or the viewport height, per
//! [`ReferenceSpanPolicy`].
//!
//! Progress is *unknown* (`None`) rather than a number whenever it cannot be
//! trusted: the section has no current geometry, or the reference span is
//! zero. It is never NaN and never outside `[0, 1]`.

use alloc::vec::Vec;

use crate::config::ReferenceSpanPolicy;
use crate::geometry::{GeometryRegistry, SectionGeometry};

/// Progress of one section.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SectionProgress {
    /// Section index.
    pub index: usize,
    /// Progress in `[0, 1]`, or `None` when unknown.
    pub value: Option<f64>,
}

impl SectionProgress {
    /// `true` if the progress value is known.
    #[must_use]
    pub fn is_known(&self) -> bool {
        self.value.is_some()
    }
}

/// Container extents used for progress mapping, read once per sample.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScrollMetrics {
    /// Visible extent of the container.
    pub viewport_extent: f64,
    /// Total scrollable content extent.
    pub content_extent: f64,
}

impl ScrollMetrics {
    /// Largest valid scroll offset.
    #[must_use]
    pub fn max_scroll(&self) -> f64 {
        (self.content_extent - self.viewport_extent).max(0.0)
    }

    /// `(offset + viewport) / content`, clamped to `[0, 1]`.
    ///
    /// This is the "how much of the page has been seen" ratio. Returns
    /// `None` for an empty or non-finite content extent.
    #[must_use]
    pub fn scroll_ratio(&self, offset: f64) -> Option<f64> {
        if !(self.content_extent.is_finite() && self.content_extent > 0.0) {
            return None;
        }
        let ratio = (offset + self.viewport_extent) / self.content_extent;
        ratio.is_finite().then(|| ratio.clamp(0.0, 1.0))
    }
}

/// `clamp((offset - anchor) / span, 0, 1)`, or `None` if `span` is not a
/// positive finite number or any input is not finite.
#[must_use]
pub fn normalized_progress(offset: f64, anchor: f64, span: f64) -> Option<f64> {
    if !(span.is_finite() && span > 0.0 && offset.is_finite() && anchor.is_finite()) {
        return None;
    }
    Some(((offset - anchor) / span).clamp(0.0, 1.0))
}

/// Extent a section occupies after collapsing by `progress`.
///
/// Height-driven layouts shrink each section from its full weighted height
/// towards zero as it is scrolled through, capped at one viewport:
/// `min((1 - p) * weight * viewport, viewport)`. `weight` is in viewport
/// units (a weight of `3.0` is three viewports tall).
#[must_use]
pub fn collapsed_extent(progress: f64, weight: f64, viewport_extent: f64) -> f64 {
    let p = if progress.is_finite() {
        progress.clamp(0.0, 1.0)
    } else {
        0.0
    };
    ((1.0 - p) * weight * viewport_extent).min(viewport_extent)
}

/// Computes [`SectionProgress`] for registered sections.
#[derive(Copy, Clone, Debug, Default)]
pub struct ProgressMapper {
    policy: ReferenceSpanPolicy,
}

impl ProgressMapper {
    /// Creates a mapper with the given reference span policy.
    #[must_use]
    pub fn new(policy: ReferenceSpanPolicy) -> Self {
        Self { policy }
    }

    /// Active policy.
    #[must_use]
    pub fn policy(&self) -> ReferenceSpanPolicy {
        self.policy
    }

    /// The span a section's progress is normalized against.
    #[must_use]
    pub fn reference_span(&self, geometry: &SectionGeometry, metrics: &ScrollMetrics) -> f64 {
        match self.policy {
            ReferenceSpanPolicy::OwnHeight => geometry.height,
            ReferenceSpanPolicy::ViewportHeight => metrics.viewport_extent,
        }
    }

    /// Progress of the section at `ordinal`.
    #[must_use]
    pub fn map_section(
        &self,
        registry: &GeometryRegistry,
        ordinal: usize,
        offset: f64,
        metrics: &ScrollMetrics,
    ) -> Option<SectionProgress> {
        let index = registry.descriptors().get(ordinal)?.index;
        let value = registry.geometry(index).and_then(|geometry| {
            let anchor = registry.anchor_px(ordinal, metrics.content_extent)?;
            normalized_progress(offset, anchor, self.reference_span(geometry, metrics))
        });
        Some(SectionProgress { index, value })
    }

    /// Recomputes progress for every registered section into `out`.
    ///
    /// `out` is cleared first and ends up with one entry per section, in
    /// index order. Sections are not filtered by visibility.
    pub fn map_all(
        &self,
        registry: &GeometryRegistry,
        offset: f64,
        metrics: &ScrollMetrics,
        out: &mut Vec<SectionProgress>,
    ) {
        out.clear();
        out.extend(
            (0..registry.len()).filter_map(|ordinal| self.map_section(registry, ordinal, offset, metrics)),
        );
    }
}

/// Fractional position along the page in section units.
///
/// `ordinal + fraction` where `ordinal` is the section whose weighted span
/// contains `offset` and `fraction` is how far through that span it is.
/// Offsets are clamped to `[0, content_extent]`, so the result lies in
/// `[0, len]`. Returns `None` without sections or content.
#[must_use]
pub fn page_position(registry: &GeometryRegistry, offset: f64, content_extent: f64) -> Option<f64> {
    let len = registry.len();
    if len == 0 || !(content_extent.is_finite() && content_extent > 0.0) || !offset.is_finite() {
        return None;
    }
    let offset = offset.clamp(0.0, content_extent);
    for ordinal in 0..len {
        let start = registry.anchor_px(ordinal, content_extent)?;
        let extent = registry.weighted_extent_px(ordinal, content_extent)?;
        if offset < start + extent {
            return Some(ordinal as f64 + (offset - start) / extent);
        }
    }
    Some(len as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{GeometryRegistry, SectionDescriptor};
    use kurbo::Rect;

    const METRICS: ScrollMetrics = ScrollMetrics {
        viewport_extent: 1000.0,
        content_extent: 5000.0,
    };

    fn measured(weights: &[f64]) -> GeometryRegistry {
        let mut reg = GeometryRegistry::new();
        let total: f64 = weights.iter().sum();
        let mut top = 0.0;
        for (index, &weight) in weights.iter().enumerate() {
            reg.register(SectionDescriptor::new(index, "s", weight))
                .unwrap();
            let height = weight / total * METRICS.content_extent;
            let bounds = Rect::new(0.0, top, 100.0, top + height);
            reg.measure(index, &move |_: usize| Some(bounds)).unwrap();
            top += height;
        }
        reg
    }

    #[test]
    fn progress_is_clamped() {
        assert_eq!(normalized_progress(-500.0, 0.0, 1000.0), Some(0.0));
        assert_eq!(normalized_progress(250.0, 0.0, 1000.0), Some(0.25));
        assert_eq!(normalized_progress(9e300, 0.0, 1e-300), Some(1.0));
    }

    #[test]
    fn degenerate_span_is_unknown() {
        assert_eq!(normalized_progress(10.0, 0.0, 0.0), None);
        assert_eq!(normalized_progress(10.0, 0.0, -1.0), None);
        assert_eq!(normalized_progress(f64::NAN, 0.0, 10.0), None);
        assert_eq!(normalized_progress(10.0, 0.0, f64::INFINITY), None);
    }

    #[test]
    fn viewport_policy_uses_viewport_span() {
        let reg = measured(&[1.0, 3.0, 1.0]);
        let mapper = ProgressMapper::new(ReferenceSpanPolicy::ViewportHeight);
        // Section 1 starts at 1000 and is 3000 tall; the viewport span is 1000.
        let p = mapper.map_section(&reg, 1, 1500.0, &METRICS).unwrap();
        assert_eq!(p.value, Some(0.5));
    }

    #[test]
    fn own_height_policy_uses_measured_height() {
        let reg = measured(&[1.0, 3.0, 1.0]);
        let mapper = ProgressMapper::new(ReferenceSpanPolicy::OwnHeight);
        let p = mapper.map_section(&reg, 1, 2500.0, &METRICS).unwrap();
        assert_eq!(p.value, Some(0.5));
    }

    #[test]
    fn unmeasured_section_is_unknown() {
        let mut reg = GeometryRegistry::new();
        reg.register(SectionDescriptor::new(0, "s", 1.0)).unwrap();
        let mapper = ProgressMapper::default();
        let mut out = Vec::new();
        mapper.map_all(&reg, 100.0, &METRICS, &mut out);
        assert_eq!(
            out,
            [SectionProgress {
                index: 0,
                value: None
            }]
        );
    }

    #[test]
    fn progress_is_monotonic_in_offset() {
        let reg = measured(&[1.0, 2.0, 0.5, 1.5]);
        for policy in [
            ReferenceSpanPolicy::OwnHeight,
            ReferenceSpanPolicy::ViewportHeight,
        ] {
            let mapper = ProgressMapper::new(policy);
            let mut previous = [0.0_f64; 4];
            let mut out = Vec::new();
            let mut offset = -300.0;
            while offset < 6000.0 {
                mapper.map_all(&reg, offset, &METRICS, &mut out);
                for (p, prev) in out.iter().zip(previous.iter_mut()) {
                    let value = p.value.unwrap();
                    assert!((0.0..=1.0).contains(&value));
                    assert!(value >= *prev);
                    *prev = value;
                }
                offset += 37.0;
            }
        }
    }

    #[test]
    fn page_position_is_in_section_units() {
        let reg = measured(&[1.0; 5]);
        let at = |offset: f64| page_position(&reg, offset, 5000.0).unwrap();
        assert!((at(2600.0) - 2.6).abs() < 1e-9);
        assert!((at(3000.0) - 3.0).abs() < 1e-9);
        assert_eq!(at(0.0), 0.0);
        assert_eq!(at(-50.0), 0.0);
        assert_eq!(at(9000.0), 5.0);
        assert_eq!(page_position(&GeometryRegistry::new(), 10.0, 5000.0), None);
    }

    #[test]
    fn scroll_ratio_counts_the_viewport() {
        assert_eq!(METRICS.scroll_ratio(0.0), Some(0.2));
        assert_eq!(METRICS.scroll_ratio(4000.0), Some(1.0));
        assert_eq!(METRICS.max_scroll(), 4000.0);
    }

    #[test]
    fn collapsed_extent_shrinks_and_caps() {
        assert_eq!(collapsed_extent(0.0, 3.0, 800.0), 800.0);
        assert_eq!(collapsed_extent(0.5, 1.0, 800.0), 400.0);
        assert_eq!(collapsed_extent(1.0, 1.0, 800.0), 0.0);
        assert_eq!(collapsed_extent(f64::NAN, 1.0, 800.0), 800.0);
    }
}
