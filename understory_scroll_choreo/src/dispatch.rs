// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Turning state changes into transition calls.
//!
//! The dispatcher sits between the [`ActivationMachine`](crate::ActivationMachine)
//! and the host's [`TransitionSink`]. It guarantees:
//!
//! - one call per real change: a section entering triggers `play_enter`,
//!   a section exiting triggers `play_exit`; the resting-state halves of a
//!   change (`Entering → Active`, `Exiting → Inactive`) trigger nothing;
//! - idempotence: an intent equal to the last one issued for the section is
//!   dropped;
//! - last intent wins: if a transition for the section may still be running,
//!   it is cancelled before the new one starts. Nothing is queued.
//!
//! ```
//! use understory_scroll_choreo::{
//!     SectionState, StateChange, TransitionDispatcher, TransitionSink,
//! };
//!
//! #[derive(Default)]
//! struct Log(Vec<String>);
//! impl TransitionSink for Log {
//!     fn play_enter(&mut self, i: usize) { self.0.push(format!("enter {i}")); }
//!     fn play_exit(&mut self, i: usize) { self.0.push(format!("exit {i}")); }
//!     fn cancel(&mut self, i: usize) { self.0.push(format!("cancel {i}")); }
//! }
//!
//! let enter = StateChange { index: 2, from: SectionState::Inactive, to: SectionState::Entering };
//! let exit = StateChange { index: 2, from: SectionState::Active, to: SectionState::Exiting };
//!
//! let mut dispatcher = TransitionDispatcher::new();
//! let mut log = Log::default();
//! dispatcher.dispatch(&enter, &mut log);
//! dispatcher.dispatch(&enter, &mut log); // redundant
//! dispatcher.dispatch(&exit, &mut log);
//!
//! assert_eq!(log.0, ["enter 2", "cancel 2", "exit 2"]);
//! ```

use hashbrown::HashMap;

use crate::activation::{SectionState, StateChange};
use crate::host::TransitionSink;

/// What a transition call asks for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TransitionIntent {
    /// `play_enter`.
    Enter,
    /// `play_exit`.
    Exit,
}

#[derive(Copy, Clone, Debug)]
struct Issued {
    intent: TransitionIntent,
    running: bool,
}

/// Issues transition calls for state changes.
#[derive(Clone, Debug, Default)]
pub struct TransitionDispatcher {
    issued: HashMap<usize, Issued>,
}

impl TransitionDispatcher {
    /// Creates a dispatcher with no history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The intent a change maps to, if any.
    #[must_use]
    pub fn intent_for(change: &StateChange) -> Option<TransitionIntent> {
        match change.to {
            SectionState::Entering => Some(TransitionIntent::Enter),
            SectionState::Exiting => Some(TransitionIntent::Exit),
            SectionState::Active | SectionState::Inactive => None,
        }
    }

    /// Issues the call for one change. Returns the intent if a call was made.
    pub fn dispatch<S>(&mut self, change: &StateChange, sink: &mut S) -> Option<TransitionIntent>
    where
        S: TransitionSink + ?Sized,
    {
        let intent = Self::intent_for(change)?;
        let index = change.index;
        if let Some(previous) = self.issued.get(&index) {
            if previous.intent == intent {
                tracing::debug!(section = index, ?intent, "transition already issued; skipping");
                return None;
            }
            if previous.running {
                sink.cancel(index);
            }
        }
        match intent {
            TransitionIntent::Enter => sink.play_enter(index),
            TransitionIntent::Exit => sink.play_exit(index),
        }
        tracing::debug!(section = index, ?intent, "transition issued");
        self.issued.insert(
            index,
            Issued {
                intent,
                running: true,
            },
        );
        Some(intent)
    }

    /// Issues calls for a batch of changes in order. Returns the number of
    /// calls to `play_enter`/`play_exit` made.
    pub fn dispatch_all<'a, S>(
        &mut self,
        changes: impl IntoIterator<Item = &'a StateChange>,
        sink: &mut S,
    ) -> usize
    where
        S: TransitionSink + ?Sized,
    {
        changes
            .into_iter()
            .filter(|change| self.dispatch(change, sink).is_some())
            .count()
    }

    /// Records that the last transition for `index` finished, so the next one
    /// starts without a `cancel`.
    ///
    /// Returns the intent that completed, if one was running.
    pub fn complete(&mut self, index: usize) -> Option<TransitionIntent> {
        let issued = self.issued.get_mut(&index)?;
        if !issued.running {
            return None;
        }
        issued.running = false;
        Some(issued.intent)
    }

    /// The last intent issued for `index`.
    #[must_use]
    pub fn last_intent(&self, index: usize) -> Option<TransitionIntent> {
        self.issued.get(&index).map(|issued| issued.intent)
    }

    /// `true` if a transition for `index` may still be running.
    #[must_use]
    pub fn is_running(&self, index: usize) -> bool {
        self.issued.get(&index).is_some_and(|issued| issued.running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    enum Call {
        Enter(usize),
        Exit(usize),
        Cancel(usize),
    }

    #[derive(Default)]
    struct Recorder(Vec<Call>);

    impl TransitionSink for Recorder {
        fn play_enter(&mut self, index: usize) {
            self.0.push(Call::Enter(index));
        }
        fn play_exit(&mut self, index: usize) {
            self.0.push(Call::Exit(index));
        }
        fn cancel(&mut self, index: usize) {
            self.0.push(Call::Cancel(index));
        }
    }

    fn change(index: usize, from: SectionState, to: SectionState) -> StateChange {
        StateChange { index, from, to }
    }

    fn enter(index: usize) -> [StateChange; 2] {
        [
            change(index, SectionState::Inactive, SectionState::Entering),
            change(index, SectionState::Entering, SectionState::Active),
        ]
    }

    fn exit(index: usize) -> [StateChange; 2] {
        [
            change(index, SectionState::Active, SectionState::Exiting),
            change(index, SectionState::Exiting, SectionState::Inactive),
        ]
    }

    #[test]
    fn resting_halves_issue_nothing() {
        let mut d = TransitionDispatcher::new();
        let mut sink = Recorder::default();
        assert_eq!(d.dispatch_all(&enter(1), &mut sink), 1);
        assert_eq!(sink.0, [Call::Enter(1)]);
    }

    #[test]
    fn same_intent_twice_is_one_call() {
        let mut d = TransitionDispatcher::new();
        let mut sink = Recorder::default();
        d.dispatch_all(&enter(1), &mut sink);
        d.dispatch_all(&enter(1), &mut sink);
        assert_eq!(sink.0, [Call::Enter(1)]);
    }

    #[test]
    fn reversal_cancels_running_transition_first() {
        let mut d = TransitionDispatcher::new();
        let mut sink = Recorder::default();
        d.dispatch_all(&enter(4), &mut sink);
        d.dispatch_all(&exit(4), &mut sink);
        d.dispatch_all(&enter(4), &mut sink);
        assert_eq!(
            sink.0,
            [
                Call::Enter(4),
                Call::Cancel(4),
                Call::Exit(4),
                Call::Cancel(4),
                Call::Enter(4)
            ]
        );
    }

    #[test]
    fn completed_transition_is_not_cancelled() {
        let mut d = TransitionDispatcher::new();
        let mut sink = Recorder::default();
        d.dispatch_all(&enter(0), &mut sink);
        assert!(d.is_running(0));
        assert_eq!(d.complete(0), Some(TransitionIntent::Enter));
        assert_eq!(d.complete(0), None);
        assert!(!d.is_running(0));

        d.dispatch_all(&exit(0), &mut sink);
        assert_eq!(sink.0, [Call::Enter(0), Call::Exit(0)]);
    }

    #[test]
    fn completion_does_not_break_idempotence() {
        let mut d = TransitionDispatcher::new();
        let mut sink = Recorder::default();
        d.dispatch_all(&enter(0), &mut sink);
        d.complete(0);
        d.dispatch_all(&enter(0), &mut sink);
        assert_eq!(sink.0, [Call::Enter(0)]);
        assert_eq!(d.last_intent(0), Some(TransitionIntent::Enter));
    }

    #[test]
    fn sections_are_independent() {
        let mut d = TransitionDispatcher::new();
        let mut sink = Recorder::default();
        d.dispatch_all(&enter(0), &mut sink);
        d.dispatch_all(&enter(1), &mut sink);
        d.dispatch_all(&exit(0), &mut sink);
        assert_eq!(
            sink.0,
            [Call::Enter(0), Call::Enter(1), Call::Cancel(0), Call::Exit(0)]
        );
    }
}
