// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Section descriptors and the measured-geometry cache.
//!
//! Sections are declared once with a relative `height_weight` and never
//! change. Their measured geometry, on the other hand, goes stale whenever
//! layout changes. The [`GeometryRegistry`] keeps both, and makes staleness
//! explicit: after [`GeometryRegistry::invalidate`] a section has *no*
//! geometry until it is measured again, so nothing downstream can read an
//! outdated number by accident.
//!
//! Weights also define where each section starts along the scroll axis:
//! section `i` is anchored at the sum of the weights before it, as a fraction
//! of the total weight, scaled to the content extent.

use alloc::string::String;
use alloc::vec::Vec;

use hashbrown::HashMap;
use kurbo::Rect;

use crate::error::{ChoreoError, ConfigIssue};
use crate::host::LayoutProvider;

/// A declared section.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SectionDescriptor {
    /// Unique index; sections are ordered by it.
    pub index: usize,
    /// Human-readable label, used in logs.
    pub label: String,
    /// Relative share of the scrollable distance. Must be finite and positive.
    pub height_weight: f64,
}

impl SectionDescriptor {
    /// Creates a descriptor.
    #[must_use]
    pub fn new(index: usize, label: impl Into<String>, height_weight: f64) -> Self {
        Self {
            index,
            label: label.into(),
            height_weight,
        }
    }

    fn validate(&self) -> Result<(), ConfigIssue> {
        if self.height_weight.is_finite() && self.height_weight > 0.0 {
            Ok(())
        } else {
            Err(ConfigIssue::NonPositiveWeight {
                index: self.index,
                weight: self.height_weight,
            })
        }
    }
}

/// Measured geometry of a section, relative to the scroll container.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SectionGeometry {
    /// Section index.
    pub index: usize,
    /// Offset of the section's top edge in content coordinates.
    pub offset_top: f64,
    /// Measured height. Always finite and positive.
    pub height: f64,
}

impl SectionGeometry {
    /// Builds geometry from layout bounds, rejecting empty or non-finite ones.
    #[must_use]
    pub fn from_bounds(index: usize, bounds: Rect) -> Option<Self> {
        let height = bounds.height();
        if !bounds.y0.is_finite() || !height.is_finite() || height <= 0.0 {
            return None;
        }
        Some(Self {
            index,
            offset_top: bounds.y0,
            height,
        })
    }
}

/// What to invalidate after a layout change.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Invalidation {
    /// A single section (for example after its content loaded).
    Section(usize),
    /// Every section (resize, orientation change).
    All,
}

/// Registered sections plus their current geometry.
#[derive(Clone, Debug, Default)]
pub struct GeometryRegistry {
    /// Sorted by `index`.
    sections: Vec<SectionDescriptor>,
    /// `prefix[i]` is the total weight of sections before ordinal `i`;
    /// the last entry is the total weight.
    prefix: Vec<f64>,
    geometry: HashMap<usize, SectionGeometry>,
}

impl GeometryRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sections: Vec::new(),
            prefix: alloc::vec![0.0],
            geometry: HashMap::new(),
        }
    }

    /// Registers a section, returning its ordinal (position in index order).
    pub fn register(&mut self, descriptor: SectionDescriptor) -> Result<usize, ChoreoError> {
        descriptor.validate()?;
        let ordinal = match self
            .sections
            .binary_search_by_key(&descriptor.index, |s| s.index)
        {
            Ok(_) => {
                return Err(ConfigIssue::DuplicateIndex {
                    index: descriptor.index,
                }
                .into());
            }
            Err(ordinal) => ordinal,
        };
        tracing::debug!(
            index = descriptor.index,
            label = %descriptor.label,
            weight = descriptor.height_weight,
            "section registered"
        );
        self.sections.insert(ordinal, descriptor);
        self.rebuild_prefix();
        Ok(ordinal)
    }

    /// Number of registered sections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// `true` if no sections are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Registered descriptors in index order.
    #[must_use]
    pub fn descriptors(&self) -> &[SectionDescriptor] {
        &self.sections
    }

    /// Descriptor for `index`.
    #[must_use]
    pub fn descriptor(&self, index: usize) -> Option<&SectionDescriptor> {
        self.ordinal_of(index).map(|ordinal| &self.sections[ordinal])
    }

    /// Position of `index` in index order.
    #[must_use]
    pub fn ordinal_of(&self, index: usize) -> Option<usize> {
        self.sections
            .binary_search_by_key(&index, |s| s.index)
            .ok()
    }

    /// Measures section `index` from `layout` and caches the result.
    ///
    /// Measuring is idempotent: it only reads layout. On failure any cached
    /// geometry for the section is dropped, since it can no longer be
    /// trusted.
    pub fn measure<L>(&mut self, index: usize, layout: &L) -> Result<SectionGeometry, ChoreoError>
    where
        L: LayoutProvider + ?Sized,
    {
        if self.ordinal_of(index).is_none() {
            return Err(ChoreoError::UnknownSection { index });
        }
        match layout
            .section_bounds(index)
            .and_then(|bounds| SectionGeometry::from_bounds(index, bounds))
        {
            Some(geometry) => {
                tracing::trace!(index, offset_top = geometry.offset_top, height = geometry.height, "section measured");
                self.geometry.insert(index, geometry);
                Ok(geometry)
            }
            None => {
                self.geometry.remove(&index);
                Err(ChoreoError::GeometryUnavailable { index })
            }
        }
    }

    /// Measures every section without cached geometry.
    ///
    /// Returns the indices that could not be measured.
    pub fn measure_missing<L>(&mut self, layout: &L) -> Vec<usize>
    where
        L: LayoutProvider + ?Sized,
    {
        let missing: Vec<usize> = self
            .sections
            .iter()
            .map(|s| s.index)
            .filter(|index| !self.geometry.contains_key(index))
            .collect();
        missing
            .into_iter()
            .filter(|&index| self.measure(index, layout).is_err())
            .collect()
    }

    /// Drops cached geometry.
    pub fn invalidate(&mut self, what: Invalidation) {
        match what {
            Invalidation::Section(index) => {
                self.geometry.remove(&index);
            }
            Invalidation::All => self.geometry.clear(),
        }
        tracing::debug!(?what, "section geometry invalidated");
    }

    /// Cached geometry for `index`, if measured and not invalidated since.
    #[must_use]
    pub fn geometry(&self, index: usize) -> Option<&SectionGeometry> {
        self.geometry.get(&index)
    }

    /// Total weight of all sections.
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.prefix.last().copied().unwrap_or(0.0)
    }

    /// Fraction of the total weight that precedes `ordinal`.
    ///
    /// `ordinal == len()` yields `1.0`.
    #[must_use]
    pub fn anchor_fraction(&self, ordinal: usize) -> Option<f64> {
        let total = self.total_weight();
        if total <= 0.0 {
            return None;
        }
        self.prefix.get(ordinal).map(|&before| before / total)
    }

    /// Scroll offset at which `ordinal` starts, given the content extent.
    #[must_use]
    pub fn anchor_px(&self, ordinal: usize, content_extent: f64) -> Option<f64> {
        self.anchor_fraction(ordinal)
            .map(|fraction| fraction * content_extent)
    }

    /// Weighted extent of `ordinal` in pixels, given the content extent.
    #[must_use]
    pub fn weighted_extent_px(&self, ordinal: usize, content_extent: f64) -> Option<f64> {
        let start = self.anchor_px(ordinal, content_extent)?;
        let end = self.anchor_px(ordinal + 1, content_extent)?;
        Some(end - start)
    }

    fn rebuild_prefix(&mut self) {
        self.prefix.clear();
        let mut running = 0.0;
        self.prefix.push(running);
        for section in &self.sections {
            running += section.height_weight;
            self.prefix.push(running);
        }
    }
}
