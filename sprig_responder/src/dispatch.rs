// Copyright 2025 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Walking a dispatch sequence and locating delegation targets.

use crate::types::{Dispatch, Outcome, ParentLookup};

/// Walk the dispatch sequence produced by the router.
///
/// Groups contiguous entries by phase. A [`Outcome::Stop`] skips the remaining
/// entries of the current phase; [`Outcome::StopAndConsume`] aborts everything
/// that follows. Returns true if the event was consumed.
pub fn run_dispatch<K, F>(seq: &[Dispatch<K>], mut deliver: F) -> bool
where
    F: FnMut(&Dispatch<K>) -> Outcome,
{
    let mut i = 0;
    while i < seq.len() {
        let phase = seq[i].phase;
        // Process contiguous entries for the same phase.
        while i < seq.len() && seq[i].phase == phase {
            match deliver(&seq[i]) {
                Outcome::Continue => {}
                Outcome::Stop => {
                    // Skip remaining entries in this phase.
                    while i + 1 < seq.len() && seq[i + 1].phase == phase {
                        i += 1;
                    }
                }
                Outcome::StopAndConsume => return true,
            }
            i += 1;
        }
    }
    false
}

/// Find the innermost node among `target` and its ancestors that satisfies
/// `predicate`, without climbing past `boundary`.
///
/// This is the event-delegation lookup: a listener on `boundary` inspects the
/// actual event target and finds the interactive descendant it belongs to.
/// `boundary` itself is a candidate. Returns `None` when `target` is not inside
/// `boundary` or nothing on the way matches.
pub fn closest_within<K, P, F>(target: K, boundary: K, parents: &P, mut predicate: F) -> Option<K>
where
    K: Copy + Eq,
    P: ParentLookup<K>,
    F: FnMut(&K) -> bool,
{
    let mut cur = target;
    let mut found = None;
    loop {
        if found.is_none() && predicate(&cur) {
            found = Some(cur);
        }
        if cur == boundary {
            return found;
        }
        cur = parents.parent_of(&cur)?;
    }
}
