// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scroll direction with pixel hysteresis.
//!
//! Direction is not read from consecutive raw offsets: trackpads and touch
//! screens report sub-pixel jitter that would make it flicker. Instead the
//! tracker keeps an *anchor* offset and only reconsiders the direction once
//! the raw offset has moved at least `threshold_px` away from it. Each time
//! that happens the anchor moves to the new offset.
//!
//! ```
//! use understory_scroll_choreo::{DirectionTracker, ScrollDirection};
//!
//! let mut dir = DirectionTracker::new(ScrollDirection::Down, 64.0, 500.0);
//!
//! // Jitter around the anchor never flips.
//! assert_eq!(dir.observe(470.0), None);
//! assert_eq!(dir.observe(530.0), None);
//!
//! // A real reversal does.
//! assert_eq!(dir.observe(400.0), Some(ScrollDirection::Up));
//! assert_eq!(dir.direction(), ScrollDirection::Up);
//! ```

/// Vertical scroll direction.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum ScrollDirection {
    /// Towards the start of the content (offset decreasing).
    Up,
    /// Towards the end of the content (offset increasing).
    #[default]
    Down,
}

/// Tracks [`ScrollDirection`] with a pixel threshold.
#[derive(Clone, Debug)]
pub struct DirectionTracker {
    direction: ScrollDirection,
    anchor: f64,
    threshold_px: f64,
}

impl DirectionTracker {
    /// Creates a tracker reporting `initial` until the first flip.
    ///
    /// `origin` is the starting anchor, normally the container's offset at
    /// setup. Negative origins are clamped to zero.
    #[must_use]
    pub fn new(initial: ScrollDirection, threshold_px: f64, origin: f64) -> Self {
        Self {
            direction: initial,
            anchor: origin.max(0.0),
            threshold_px,
        }
    }

    /// Returns the current direction.
    #[must_use]
    pub fn direction(&self) -> ScrollDirection {
        self.direction
    }

    /// Returns the offset the next movement is measured against.
    #[must_use]
    pub fn anchor(&self) -> f64 {
        self.anchor
    }

    /// Feeds a raw offset, returning the new direction if it flipped.
    ///
    /// Movements smaller than the threshold are ignored entirely: neither the
    /// direction nor the anchor changes.
    pub fn observe(&mut self, offset: f64) -> Option<ScrollDirection> {
        let delta = offset - self.anchor;
        if delta == 0.0 || delta.abs() < self.threshold_px {
            return None;
        }
        let next = if delta > 0.0 {
            ScrollDirection::Down
        } else {
            ScrollDirection::Up
        };
        self.anchor = offset.max(0.0);
        if next == self.direction {
            return None;
        }
        self.direction = next;
        tracing::debug!(direction = ?next, anchor = self.anchor, "scroll direction changed");
        Some(next)
    }
}
