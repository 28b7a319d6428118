// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A synthetic page: host collaborators with no window behind them.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

use kurbo::Rect;
use understory_scroll_choreo::{
    LayoutProvider, ScrollBehavior, ScrollContainer, SectionDescriptor, TransitionSink,
    VisibilityProvider,
};

/// Simulated frame interval.
pub(crate) const FRAME_MS: u64 = 16;

/// Fraction of the remaining distance a smooth scroll covers per frame.
const SMOOTH_STEP: f64 = 0.3;

/// A scroll container whose offset is shared with [`InViewport`].
#[derive(Debug)]
pub(crate) struct SyntheticPage {
    offset: Rc<Cell<f64>>,
    viewport: f64,
    content: f64,
    animation: Option<f64>,
}

impl SyntheticPage {
    pub(crate) fn new(viewport: f64, content: f64) -> Self {
        Self {
            offset: Rc::new(Cell::new(0.0)),
            viewport,
            content,
            animation: None,
        }
    }

    pub(crate) fn offset_handle(&self) -> Rc<Cell<f64>> {
        Rc::clone(&self.offset)
    }

    pub(crate) fn offset(&self) -> f64 {
        self.offset.get()
    }

    pub(crate) fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    fn max_scroll(&self) -> f64 {
        (self.content - self.viewport).max(0.0)
    }

    fn set(&mut self, offset: f64) -> bool {
        let offset = offset.clamp(0.0, self.max_scroll());
        let moved = offset != self.offset.get();
        self.offset.set(offset);
        moved
    }

    /// A user scroll. Interrupts any running smooth scroll.
    pub(crate) fn scroll_by(&mut self, delta: f64) -> bool {
        self.animation = None;
        self.set(self.offset.get() + delta)
    }

    /// Steps a running smooth scroll. Returns `true` if the page moved.
    pub(crate) fn animate(&mut self) -> bool {
        let Some(target) = self.animation else {
            return false;
        };
        let remaining = target - self.offset.get();
        if remaining.abs() < 1.0 {
            self.animation = None;
            return self.set(target);
        }
        self.set(self.offset.get() + remaining * SMOOTH_STEP)
    }
}

impl ScrollContainer for SyntheticPage {
    fn scroll_offset(&self) -> f64 {
        self.offset.get()
    }

    fn scroll_to(&mut self, offset: f64, behavior: ScrollBehavior) {
        tracing::info!(offset, ?behavior, "scroll_to");
        match behavior {
            ScrollBehavior::Instant => {
                self.animation = None;
                self.set(offset);
            }
            ScrollBehavior::Smooth => self.animation = Some(offset),
        }
    }

    fn viewport_extent(&self) -> f64 {
        self.viewport
    }

    fn content_extent(&self) -> f64 {
        self.content
    }
}

/// Sections stacked top to bottom, each `height_weight` viewports tall.
#[derive(Debug)]
pub(crate) struct StackedLayout {
    spans: BTreeMap<usize, (f64, f64)>,
    width: f64,
    ready: bool,
}

impl StackedLayout {
    pub(crate) fn new(sections: &[SectionDescriptor], viewport: f64) -> Self {
        let mut ordered: Vec<&SectionDescriptor> = sections.iter().collect();
        ordered.sort_by_key(|s| s.index);
        let mut top = 0.0;
        let mut spans = BTreeMap::new();
        for section in ordered {
            let height = section.height_weight * viewport;
            spans.insert(section.index, (top, height));
            top += height;
        }
        Self {
            spans,
            width: viewport * 0.75,
            ready: true,
        }
    }

    pub(crate) fn content_extent(&self) -> f64 {
        self.spans.values().map(|&(_, height)| height).sum()
    }

    /// While not ready, no section reports bounds (layout in progress).
    pub(crate) fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    fn spans(&self) -> impl Iterator<Item = (usize, (f64, f64))> + '_ {
        self.spans.iter().map(|(&index, &span)| (index, span))
    }
}

impl LayoutProvider for StackedLayout {
    fn section_bounds(&self, index: usize) -> Option<Rect> {
        if !self.ready {
            return None;
        }
        let &(top, height) = self.spans.get(&index)?;
        Some(Rect::new(0.0, top, self.width, top + height))
    }
}

/// Intersection of each section with the viewport.
#[derive(Debug)]
pub(crate) struct InViewport {
    offset: Rc<Cell<f64>>,
    viewport: f64,
    spans: BTreeMap<usize, (f64, f64)>,
}

impl InViewport {
    pub(crate) fn new(offset: Rc<Cell<f64>>, viewport: f64, layout: &StackedLayout) -> Self {
        Self {
            offset,
            viewport,
            spans: layout.spans().collect(),
        }
    }
}

impl VisibilityProvider for InViewport {
    fn is_in_view(&self, index: usize, threshold: f64) -> bool {
        let Some(&(top, height)) = self.spans.get(&index) else {
            return false;
        };
        let view_top = self.offset.get();
        let visible = ((top + height).min(view_top + self.viewport) - top.max(view_top)).max(0.0);
        let visible_ratio = visible / height.min(self.viewport);
        visible_ratio >= threshold
    }
}

/// Logs transition calls instead of animating.
#[derive(Debug, Default)]
pub(crate) struct LoggingTransitions {
    labels: BTreeMap<usize, String>,
    pub(crate) enters: usize,
    pub(crate) exits: usize,
    pub(crate) cancels: usize,
}

impl LoggingTransitions {
    pub(crate) fn new(sections: &[SectionDescriptor]) -> Self {
        Self {
            labels: sections
                .iter()
                .map(|s| (s.index, s.label.clone()))
                .collect(),
            ..Self::default()
        }
    }

    fn label(&self, index: usize) -> &str {
        self.labels.get(&index).map_or("?", String::as_str)
    }
}

impl TransitionSink for LoggingTransitions {
    fn play_enter(&mut self, index: usize) {
        self.enters += 1;
        tracing::info!(section = index, label = self.label(index), "play enter");
    }

    fn play_exit(&mut self, index: usize) {
        self.exits += 1;
        tracing::info!(section = index, label = self.label(index), "play exit");
    }

    fn cancel(&mut self, index: usize) {
        self.cancels += 1;
        tracing::info!(section = index, label = self.label(index), "cancel");
    }
}
