// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Section activation state machine.
//!
//! Each section cycles through
//! `Inactive → Entering → Active → Exiting → Inactive`. A section wants to be
//! on while its progress lies strictly inside `(0, 1)`, with two exceptions:
//!
//! - Section `0` (when [`ChoreoConfig::first_section_boundary_rule`] is set)
//!   is also on at progress exactly `0` while the visibility provider reports
//!   it in view. Nothing precedes it, so without this rule it would never be
//!   active with the page at rest at the top.
//! - A [`BoundaryOverride`] turns an active section off when its progress
//!   matches the override value, even inside `(0, 1)`. It is an exit
//!   boundary only: an inactive section arriving at that value still enters.
//!
//! Entering and exiting are reported as two changes in one update
//! (`Inactive → Entering`, `Entering → Active`), so consumers can either
//! animate on the first or jump straight to the resting state on the second.
//!
//! Unknown progress never changes state: a section whose geometry is missing
//! keeps whatever state it had, and fires nothing.
//!
//! [`ChoreoConfig::first_section_boundary_rule`]: crate::ChoreoConfig::first_section_boundary_rule

use alloc::vec::Vec;

use smallvec::SmallVec;

use crate::config::{BoundaryOverride, ChoreoConfig};
use crate::progress::SectionProgress;

/// Activation state of a section.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SectionState {
    /// Not active.
    #[default]
    Inactive,
    /// Becoming active.
    Entering,
    /// Active.
    Active,
    /// Becoming inactive.
    Exiting,
}

impl SectionState {
    /// `true` for [`SectionState::Entering`] and [`SectionState::Active`].
    #[must_use]
    pub fn is_on(self) -> bool {
        matches!(self, Self::Entering | Self::Active)
    }
}

/// One state transition of one section.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct StateChange {
    /// Section index.
    pub index: usize,
    /// State before.
    pub from: SectionState,
    /// State after.
    pub to: SectionState,
}

/// Changes produced by one update; most updates produce at most a handful.
pub type StateChanges = SmallVec<[StateChange; 8]>;

/// Per-section activation state.
#[derive(Clone, Debug, Default)]
pub struct ActivationMachine {
    /// `(index, state)` in index order, parallel to the geometry registry.
    states: Vec<(usize, SectionState)>,
    first_section_rule: bool,
    overrides: Vec<BoundaryOverride>,
    last_entered: Option<usize>,
}

impl ActivationMachine {
    /// Creates a machine with the rules from `config` and no sections.
    #[must_use]
    pub fn new(config: &ChoreoConfig) -> Self {
        Self {
            states: Vec::new(),
            first_section_rule: config.first_section_boundary_rule,
            overrides: config.boundary_overrides.clone(),
            last_entered: None,
        }
    }

    /// Adds an inactive section at `ordinal`.
    pub fn insert(&mut self, ordinal: usize, index: usize) {
        let ordinal = ordinal.min(self.states.len());
        self.states.insert(ordinal, (index, SectionState::Inactive));
    }

    /// Current state of section `index`.
    #[must_use]
    pub fn state(&self, index: usize) -> Option<SectionState> {
        self.states
            .binary_search_by_key(&index, |&(i, _)| i)
            .ok()
            .map(|slot| self.states[slot].1)
    }

    /// All states in index order.
    pub fn states(&self) -> impl Iterator<Item = (usize, SectionState)> + '_ {
        self.states.iter().copied()
    }

    /// The most recently entered section if it is still on, otherwise the
    /// first section that is on.
    #[must_use]
    pub fn active_section(&self) -> Option<usize> {
        self.last_entered
            .filter(|&index| self.state(index).is_some_and(SectionState::is_on))
            .or_else(|| {
                self.states
                    .iter()
                    .find(|(_, state)| state.is_on())
                    .map(|&(index, _)| index)
            })
    }

    /// Whether a section currently in `previous` with `progress` should be on.
    ///
    /// `in_view` is only consulted for section `0` at progress `0`.
    pub fn wants_active(
        &self,
        index: usize,
        previous: SectionState,
        progress: f64,
        in_view: impl FnOnce() -> bool,
    ) -> bool {
        if previous.is_on()
            && self
                .overrides
                .iter()
                .any(|boundary| boundary.index == index && boundary.matches(progress))
        {
            return false;
        }
        if progress > 0.0 && progress < 1.0 {
            return true;
        }
        self.first_section_rule && index == 0 && progress == 0.0 && in_view()
    }

    /// Applies one sample's progress values, appending any changes to `out`.
    ///
    /// `progress` must be in index order (as produced by
    /// [`ProgressMapper::map_all`](crate::ProgressMapper::map_all)).
    /// Entries for unknown sections are skipped.
    /// `in_view` answers the visibility question for a section index.
    pub fn update(
        &mut self,
        progress: &[SectionProgress],
        mut in_view: impl FnMut(usize) -> bool,
        out: &mut StateChanges,
    ) {
        // Both sequences are sorted by index; walk them together.
        let mut slot = 0;
        for p in progress {
            while slot < self.states.len() && self.states[slot].0 < p.index {
                slot += 1;
            }
            if slot == self.states.len() {
                break;
            }
            if self.states[slot].0 != p.index {
                continue;
            }
            let previous = self.states[slot].1;
            let Some(value) = p.value else {
                tracing::debug!(
                    section = p.index,
                    state = ?previous,
                    "progress unknown (geometry unavailable); holding state"
                );
                continue;
            };
            let on = self.wants_active(p.index, previous, value, || in_view(p.index));
            match (previous.is_on(), on) {
                (false, true) => {
                    self.push(out, p.index, previous, SectionState::Entering);
                    self.push(out, p.index, SectionState::Entering, SectionState::Active);
                    self.states[slot].1 = SectionState::Active;
                    self.last_entered = Some(p.index);
                }
                (true, false) => {
                    self.push(out, p.index, previous, SectionState::Exiting);
                    self.push(out, p.index, SectionState::Exiting, SectionState::Inactive);
                    self.states[slot].1 = SectionState::Inactive;
                }
                _ => {}
            }
        }
    }

    fn push(&self, out: &mut StateChanges, index: usize, from: SectionState, to: SectionState) {
        tracing::debug!(section = index, ?from, ?to, "section state changed");
        out.push(StateChange { index, from, to });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn machine(config: &ChoreoConfig, sections: usize) -> ActivationMachine {
        let mut m = ActivationMachine::new(config);
        for index in 0..sections {
            m.insert(index, index);
        }
        m
    }

    fn progress(values: &[Option<f64>]) -> Vec<SectionProgress> {
        values
            .iter()
            .enumerate()
            .map(|(index, &value)| SectionProgress { index, value })
            .collect()
    }

    fn step(m: &mut ActivationMachine, values: &[Option<f64>], in_view: bool) -> StateChanges {
        let mut out = StateChanges::new();
        m.update(&progress(values), |_| in_view, &mut out);
        out
    }

    #[test]
    fn entering_fires_both_transitions() {
        let mut m = machine(&ChoreoConfig::default(), 2);
        let changes = step(&mut m, &[Some(1.0), Some(0.3)], false);
        assert_eq!(
            changes.as_slice(),
            [
                StateChange {
                    index: 1,
                    from: SectionState::Inactive,
                    to: SectionState::Entering
                },
                StateChange {
                    index: 1,
                    from: SectionState::Entering,
                    to: SectionState::Active
                },
            ]
        );
        assert_eq!(m.state(1), Some(SectionState::Active));
        assert_eq!(m.state(0), Some(SectionState::Inactive));
    }

    #[test]
    fn reaching_either_boundary_exits() {
        for boundary in [0.0, 1.0] {
            let mut m = machine(&ChoreoConfig::default(), 2);
            step(&mut m, &[Some(0.0), Some(0.5)], false);
            let changes = step(&mut m, &[Some(0.0), Some(boundary)], false);
            let targets: Vec<SectionState> = changes.iter().map(|c| c.to).collect();
            assert_eq!(targets, [SectionState::Exiting, SectionState::Inactive]);
            assert_eq!(m.state(1), Some(SectionState::Inactive));
        }
    }

    #[test]
    fn repeated_progress_inside_range_is_quiet() {
        let mut m = machine(&ChoreoConfig::default(), 1);
        step(&mut m, &[Some(0.2)], false);
        assert!(step(&mut m, &[Some(0.4)], false).is_empty());
        assert!(step(&mut m, &[Some(0.9)], false).is_empty());
    }

    #[test]
    fn unknown_progress_holds_state() {
        let mut m = machine(&ChoreoConfig::default(), 2);
        assert!(step(&mut m, &[None, None], true).is_empty());
        assert_eq!(m.state(0), Some(SectionState::Inactive));

        step(&mut m, &[Some(0.0), Some(0.5)], false);
        assert!(step(&mut m, &[Some(0.0), None], false).is_empty());
        assert_eq!(m.state(1), Some(SectionState::Active));
    }

    #[test]
    fn first_section_is_active_at_rest_when_in_view() {
        let mut m = machine(&ChoreoConfig::default(), 2);
        let changes = step(&mut m, &[Some(0.0), Some(0.0)], true);
        assert_eq!(changes.len(), 2);
        assert_eq!(m.state(0), Some(SectionState::Active));
        // The rule is specific to section 0.
        assert_eq!(m.state(1), Some(SectionState::Inactive));

        // Scrolling it out of view at p == 0 turns it off.
        step(&mut m, &[Some(0.0), Some(0.0)], false);
        assert_eq!(m.state(0), Some(SectionState::Inactive));
    }

    #[test]
    fn first_section_rule_can_be_disabled() {
        let config = ChoreoConfig {
            first_section_boundary_rule: false,
            ..ChoreoConfig::default()
        };
        let mut m = machine(&config, 1);
        assert!(step(&mut m, &[Some(0.0)], true).is_empty());
    }

    #[test]
    fn visibility_is_only_queried_for_first_section_at_zero() {
        let mut m = machine(&ChoreoConfig::default(), 3);
        let mut asked = vec![];
        let mut out = StateChanges::new();
        m.update(
            &progress(&[Some(0.0), Some(0.0), Some(0.5)]),
            |index| {
                asked.push(index);
                false
            },
            &mut out,
        );
        assert_eq!(asked, [0]);
    }

    #[test]
    fn exact_boundary_override_exits_only_on_exact_value() {
        let config =
            ChoreoConfig::default().with_boundary_override(BoundaryOverride::exact(0, 2.0 / 3.0));
        let mut m = machine(&config, 1);
        step(&mut m, &[Some(0.5)], false);
        assert_eq!(m.state(0), Some(SectionState::Active));

        // Close, but not equal: stays active.
        assert!(step(&mut m, &[Some(0.666)], false).is_empty());

        let changes = step(&mut m, &[Some(2.0 / 3.0)], false);
        assert_eq!(changes.len(), 2);
        assert_eq!(m.state(0), Some(SectionState::Inactive));

        // Moving past the boundary re-enters.
        step(&mut m, &[Some(0.7)], false);
        assert_eq!(m.state(0), Some(SectionState::Active));
    }

    #[test]
    fn inactive_section_enters_at_exact_override_value() {
        let config =
            ChoreoConfig::default().with_boundary_override(BoundaryOverride::exact(0, 2.0 / 3.0));
        let mut m = machine(&config, 1);
        let changes = step(&mut m, &[Some(2.0 / 3.0)], false);
        let targets: Vec<SectionState> = changes.iter().map(|c| c.to).collect();
        assert_eq!(targets, [SectionState::Entering, SectionState::Active]);
        assert_eq!(m.state(0), Some(SectionState::Active));

        // Once on, the same value is an exit.
        step(&mut m, &[Some(0.5)], false);
        step(&mut m, &[Some(2.0 / 3.0)], false);
        assert_eq!(m.state(0), Some(SectionState::Inactive));
    }

    #[test]
    fn update_skips_unknown_and_missing_sections() {
        let mut m = ActivationMachine::new(&ChoreoConfig::default());
        m.insert(0, 1);
        m.insert(1, 4);
        let mut out = StateChanges::new();
        let halfway = |index| SectionProgress {
            index,
            value: Some(0.5),
        };
        let progress = [halfway(0), halfway(4), halfway(7)];
        m.update(&progress, |_| false, &mut out);
        assert_eq!(m.state(1), Some(SectionState::Inactive));
        assert_eq!(m.state(4), Some(SectionState::Active));
        assert_eq!(m.state(7), None);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn override_on_other_section_is_ignored() {
        let config =
            ChoreoConfig::default().with_boundary_override(BoundaryOverride::exact(3, 0.5));
        let mut m = machine(&config, 1);
        step(&mut m, &[Some(0.5)], false);
        assert_eq!(m.state(0), Some(SectionState::Active));
    }

    #[test]
    fn active_section_prefers_most_recent_entry() {
        let mut m = machine(&ChoreoConfig::default(), 3);
        assert_eq!(m.active_section(), None);

        step(&mut m, &[Some(0.5), Some(0.0), Some(0.0)], false);
        assert_eq!(m.active_section(), Some(0));

        step(&mut m, &[Some(0.9), Some(0.1), Some(0.0)], false);
        assert_eq!(m.active_section(), Some(1));

        step(&mut m, &[Some(0.9), Some(1.0), Some(0.0)], false);
        assert_eq!(m.active_section(), Some(0));
    }
}
