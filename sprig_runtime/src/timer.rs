// Copyright 2025 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Virtual-clock timers owned by component hosts.
//!
//! Time only moves through [`Runtime::advance_time`](crate::Runtime::advance_time).
//! Due timers fire in deadline order, ties broken by creation order. A host's
//! timers are dropped when it disconnects.
//!
//! A zero-delay timer armed while the clock is being advanced waits for the
//! next advance, so a callback that re-arms itself cannot stall the clock.

use std::fmt;
use std::time::Duration;

use sprig_dom::NodeId;

use crate::runtime::Cx;

/// Handle of a scheduled timer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

pub(crate) type TimerCallback = Box<dyn FnOnce(&mut Cx<'_>)>;

pub(crate) struct Timer {
    pub(crate) id: TimerId,
    pub(crate) due: Duration,
    armed: Duration,
    pub(crate) host: NodeId,
    pub(crate) callback: TimerCallback,
}

#[derive(Default)]
pub(crate) struct Timers {
    now: Duration,
    next: u64,
    pending: Vec<Timer>,
}

impl fmt::Debug for Timers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timers")
            .field("now", &self.now)
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl Timers {
    pub(crate) fn now(&self) -> Duration {
        self.now
    }

    pub(crate) fn schedule(&mut self, host: NodeId, delay: Duration, callback: TimerCallback) -> TimerId {
        self.next += 1;
        let id = TimerId(self.next);
        self.pending.push(Timer {
            id,
            due: self.now.saturating_add(delay),
            armed: self.now,
            host,
            callback,
        });
        id
    }

    /// Cancel a timer. Returns true if it was still pending.
    pub(crate) fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|t| t.id != id);
        self.pending.len() != before
    }

    /// Drop every timer owned by `host`. Returns how many were dropped.
    pub(crate) fn clear_host(&mut self, host: NodeId) -> usize {
        let before = self.pending.len();
        self.pending.retain(|t| t.host != host);
        before - self.pending.len()
    }

    /// Newest timer id handed out so far.
    pub(crate) fn watermark(&self) -> TimerId {
        TimerId(self.next)
    }

    /// Remove and return the earliest timer due at or before `until`,
    /// moving the clock to its deadline.
    ///
    /// Timers newer than `watermark` only qualify if they were armed with a
    /// non-zero delay.
    pub(crate) fn pop_due(&mut self, until: Duration, watermark: TimerId) -> Option<Timer> {
        let (idx, _) = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= until && (t.id <= watermark || t.due > t.armed))
            .min_by_key(|(_, t)| (t.due, t.id))?;
        let timer = self.pending.swap_remove(idx);
        self.now = self.now.max(timer.due);
        Some(timer)
    }

    /// Move the clock forward to `to` without firing anything.
    pub(crate) fn settle(&mut self, to: Duration) {
        self.now = self.now.max(to);
    }

    #[cfg(test)]
    fn count_for(&self, host: NodeId) -> usize {
        self.pending.iter().filter(|t| t.host == host).count()
    }
}
