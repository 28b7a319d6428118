// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collaborator traits implemented by the host.
//!
//! The engine never touches a window, document, or animation library
//! directly. Hosts hand it four collaborators:
//!
//! - a [`ScrollContainer`] (the page viewport, or any nested scroller),
//! - a [`LayoutProvider`] that reports section bounds,
//! - a [`VisibilityProvider`] for intersection checks,
//! - a [`TransitionSink`] that plays or cancels section transitions.
//!
//! Closures implement [`LayoutProvider`] and [`VisibilityProvider`], which is
//! usually all a test needs.

use kurbo::Rect;

/// How a programmatic scroll should move.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ScrollBehavior {
    /// Jump immediately.
    Instant,
    /// Animate to the target.
    #[default]
    Smooth,
}

/// A scrollable region.
pub trait ScrollContainer {
    /// Current scroll offset along the scroll axis, in pixels.
    fn scroll_offset(&self) -> f64;

    /// Requests a scroll to `offset`.
    ///
    /// A smooth scroll is expected to produce ordinary scroll events while it
    /// runs, which the host forwards to the engine as usual.
    fn scroll_to(&mut self, offset: f64, behavior: ScrollBehavior);

    /// Visible extent of the container (the viewport height), in pixels.
    fn viewport_extent(&self) -> f64;

    /// Total scrollable content extent, in pixels.
    fn content_extent(&self) -> f64;

    /// Whether the container exists and can be observed.
    fn is_attached(&self) -> bool {
        true
    }
}

/// Reports measured section bounds.
pub trait LayoutProvider {
    /// Bounds of section `index` in the container's content coordinates, or
    /// `None` if the section has not been laid out.
    ///
    /// Only the vertical extent (`y0` and `height()`) is used.
    fn section_bounds(&self, index: usize) -> Option<Rect>;
}

impl<F> LayoutProvider for F
where
    F: Fn(usize) -> Option<Rect>,
{
    fn section_bounds(&self, index: usize) -> Option<Rect> {
        self(index)
    }
}

/// Reports whether a section intersects the viewport.
pub trait VisibilityProvider {
    /// `true` if at least `threshold` (a ratio in `[0, 1]`) of section
    /// `index` is visible.
    fn is_in_view(&self, index: usize, threshold: f64) -> bool;
}

impl<F> VisibilityProvider for F
where
    F: Fn(usize, f64) -> bool,
{
    fn is_in_view(&self, index: usize, threshold: f64) -> bool {
        self(index, threshold)
    }
}

/// A [`VisibilityProvider`] that reports nothing in view.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoVisibility;

impl VisibilityProvider for NoVisibility {
    fn is_in_view(&self, _index: usize, _threshold: f64) -> bool {
        false
    }
}

/// Plays section transitions.
///
/// Implementations are expected to tolerate repeated calls; the engine
/// already suppresses redundant ones.
pub trait TransitionSink {
    /// Start the "enter" transition for section `index`.
    fn play_enter(&mut self, index: usize);

    /// Start the "exit" transition for section `index`.
    fn play_exit(&mut self, index: usize);

    /// Stop whatever transition section `index` is running.
    fn cancel(&mut self, index: usize);
}
