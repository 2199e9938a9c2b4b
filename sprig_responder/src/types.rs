// Copyright 2025 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types for the responder: phases, outcomes, parent lookups, and dispatch steps.
//!
//! ## Overview
//!
//! These types describe the propagation protocol and its inputs/outputs.
//! They are referenced by the [`router`](crate::router) and used by the runtime's dispatcher.

/// Phases of event propagation.
///
/// Appears on each [`Dispatch`] item produced by
/// [`Router::route`](crate::router::Router::route).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Phase {
    /// Root-to-target traversal.
    Capture,
    /// Target node.
    Target,
    /// Target-to-root traversal.
    Bubble,
}

/// Handler outcome controlling propagation.
///
/// [`run_dispatch`](crate::dispatch::run_dispatch) uses this as the return
/// value from per-step delivery to decide whether to continue within a phase
/// or abort remaining phases.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// Continue within the current phase.
    Continue,
    /// Stop propagation within the current phase.
    Stop,
    /// Stop and mark consumed; no later step runs.
    StopAndConsume,
}

/// Look up the parent of a node to reconstruct a root→target path for propagation.
pub trait ParentLookup<K> {
    /// Returns the parent of `node`, or `None` if `node` is a root.
    fn parent_of(&self, node: &K) -> Option<K>;
}

/// A no‑op parent provider: every node is its own root.
///
/// Used by [`Router::new`](crate::router::Router::new). All calls to
/// [`ParentLookup::parent_of`] return `None`.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoParent;

impl<K> ParentLookup<K> for NoParent {
    #[inline]
    fn parent_of(&self, _node: &K) -> Option<K> {
        None
    }
}

impl<K, F: Fn(&K) -> Option<K>> ParentLookup<K> for F {
    #[inline]
    fn parent_of(&self, node: &K) -> Option<K> {
        self(node)
    }
}

/// Per-route options.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RouteOptions {
    /// Emit the bubble phase. Non-bubbling events stop at the target.
    pub bubbles: bool,
}

impl Default for RouteOptions {
    fn default() -> Self {
        Self { bubbles: true }
    }
}

/// A single dispatch item.
///
/// Produced by [`Router::route`](crate::router::Router::route), and fed into
/// [`run_dispatch`](crate::dispatch::run_dispatch) which invokes handlers in
/// [`Capture`](Phase::Capture), then [`Target`](Phase::Target), then
/// [`Bubble`](Phase::Bubble) order.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Dispatch<K> {
    /// Propagation phase for this step.
    pub phase: Phase,
    /// Node associated with this dispatch step.
    pub node: K,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_parent_lookups() {
        let parents = |n: &u32| if *n > 1 { Some(n - 1) } else { None };
        assert_eq!(parents.parent_of(&3), Some(2));
        assert_eq!(parents.parent_of(&1), None);
        assert_eq!(ParentLookup::<u32>::parent_of(&NoParent, &3), None);
    }

    #[test]
    fn route_options_default_bubbles() {
        assert!(RouteOptions::default().bubbles);
    }
}
