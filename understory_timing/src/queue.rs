// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deadline-ordered timer queue with cancellable handles.

use alloc::collections::BTreeMap;

/// Handle for a scheduled timer.
///
/// Handles are never reused by the queue that issued them, so a stale handle
/// (for a timer that already fired or was cancelled) is simply ignored.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

impl TimerId {
    /// Returns the raw id value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// A timer whose deadline has passed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expired<T> {
    /// Handle the timer was scheduled under.
    pub id: TimerId,
    /// Deadline the timer was scheduled for (not the time it was drained).
    pub deadline: u64,
    /// The scheduled payload.
    pub payload: T,
}

/// Ordering key: deadline first, then scheduling sequence.
type SlotKey = (u64, u64);

/// A queue of payloads keyed by millisecond deadlines.
///
/// See the [crate documentation](crate) for an overview.
#[derive(Clone, Debug)]
pub struct TimerQueue<T> {
    slots: BTreeMap<SlotKey, (TimerId, T)>,
    keys: BTreeMap<TimerId, SlotKey>,
    next_id: u64,
    next_seq: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    /// Creates an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: BTreeMap::new(),
            keys: BTreeMap::new(),
            next_id: 0,
            next_seq: 0,
        }
    }

    /// Returns the number of pending timers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if no timers are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Schedules `payload` to expire at `deadline`.
    pub fn schedule(&mut self, deadline: u64, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let key = self.next_key(deadline);
        self.slots.insert(key, (id, payload));
        self.keys.insert(id, key);
        id
    }

    /// Cancels a pending timer, returning its payload.
    ///
    /// Returns `None` if the timer already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        let key = self.keys.remove(&id)?;
        self.slots.remove(&key).map(|(_, payload)| payload)
    }

    /// Moves a pending timer to a new deadline, keeping its handle.
    ///
    /// Returns `false` if the timer is no longer pending.
    pub fn reschedule(&mut self, id: TimerId, deadline: u64) -> bool {
        let Some(old) = self.keys.get(&id).copied() else {
            return false;
        };
        let Some(slot) = self.slots.remove(&old) else {
            return false;
        };
        let key = self.next_key(deadline);
        self.slots.insert(key, slot);
        self.keys.insert(id, key);
        true
    }

    /// Returns `true` if the timer is still pending.
    #[must_use]
    pub fn contains(&self, id: TimerId) -> bool {
        self.keys.contains_key(&id)
    }

    /// Returns the deadline of a pending timer.
    #[must_use]
    pub fn deadline_of(&self, id: TimerId) -> Option<u64> {
        self.keys.get(&id).map(|&(deadline, _)| deadline)
    }

    /// Returns the earliest pending deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<u64> {
        self.slots.keys().next().map(|&(deadline, _)| deadline)
    }

    /// Removes and returns the earliest timer whose deadline is `<= now`.
    pub fn pop_expired(&mut self, now: u64) -> Option<Expired<T>> {
        let entry = self.slots.first_entry()?;
        let (deadline, _) = *entry.key();
        if deadline > now {
            return None;
        }
        let (id, payload) = entry.remove();
        self.keys.remove(&id);
        Some(Expired {
            id,
            deadline,
            payload,
        })
    }

    /// Drains every timer whose deadline is `<= now`, in deadline order.
    ///
    /// The iterator is lazy: timers not yet pulled from it remain pending
    /// if it is dropped early.
    pub fn drain_expired(&mut self, now: u64) -> DrainExpired<'_, T> {
        DrainExpired { queue: self, now }
    }

    /// Cancels every pending timer.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.keys.clear();
    }

    fn next_key(&mut self, deadline: u64) -> SlotKey {
        let seq = self.next_seq;
        self.next_seq += 1;
        (deadline, seq)
    }
}

/// Iterator returned by [`TimerQueue::drain_expired`].
#[derive(Debug)]
pub struct DrainExpired<'a, T> {
    queue: &'a mut TimerQueue<T>,
    now: u64,
}

impl<T> Iterator for DrainExpired<'_, T> {
    type Item = Expired<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.queue.pop_expired(self.now)
    }
}
