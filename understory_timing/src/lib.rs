// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_timing --heading-base-level=0

//! Understory Timing: host-agnostic timer queue primitives for UI runtimes.
//!
//! UI state machines often need "call me back later" behavior: debounce
//! windows, throttle trailing edges, idle detection. Wiring those directly to
//! a platform timer (`setTimeout`, an event-loop timer, a tokio sleep) makes
//! them hard to test and ties them to one host.
//!
//! This crate provides a [`TimerQueue`] that only stores *intent*: a payload
//! and a deadline on a caller-chosen millisecond clock. Hosts:
//!
//! - schedule work with [`TimerQueue::schedule`] and keep the returned
//!   [`TimerId`] if they may need to cancel or move it,
//! - ask [`TimerQueue::next_deadline`] when to wake up next,
//! - and feed the current time into [`TimerQueue::drain_expired`] to collect
//!   every payload whose deadline has passed, in deadline order.
//!
//! The queue never reads a clock, so tests can simulate time exactly.
//!
//! ## Minimal example
//!
//! ```rust
//! use understory_timing::TimerQueue;
//!
//! let mut timers = TimerQueue::new();
//! let idle = timers.schedule(150, "idle");
//! timers.schedule(100, "trailing");
//!
//! // Another event arrives at t = 60: restart the idle window.
//! assert!(timers.reschedule(idle, 210));
//!
//! let fired: Vec<_> = timers.drain_expired(200).map(|e| e.payload).collect();
//! assert_eq!(fired, ["trailing"]);
//! assert_eq!(timers.next_deadline(), Some(210));
//! ```
//!
//! ## Ordering
//!
//! Expired timers are yielded by ascending deadline. Timers that share a
//! deadline are yielded in the order they were scheduled (a rescheduled
//! timer counts as scheduled at the time of the reschedule).
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod queue;

pub use queue::{DrainExpired, Expired, TimerId, TimerQueue};
