// Copyright 2025 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Router implementation.
//!
//! ## Overview
//!
//! Reconstructs the root→target path for an event target and emits dispatch steps.
//! Produces a capture → target → bubble sequence for that path.
//!
//! ## Path
//!
//! - The path is computed once, at routing time. Mutations made by handlers while
//!   the sequence is being delivered do not change who is visited.
//! - Without a parent lookup the path is the target alone.
//! - `set_scope` drops ancestors from capture and bubble; the target itself is always routed.
//!
//! ## See Also
//!
//! [`dispatch`](crate::dispatch) for walking the sequence with stop semantics.

use alloc::vec::Vec;

use crate::types::{Dispatch, NoParent, ParentLookup, Phase, RouteOptions};

/// Deterministic propagation router.
///
/// ## Usage
///
/// - Construct with [`Router::new`] for flat targets, or with [`Router::with_parent`]
///   to enable path reconstruction via a [`ParentLookup`].
/// - Optionally call [`Router::set_scope`] to skip ancestors (for example nodes that
///   should never observe events).
/// - Call [`Router::route`] for each event to produce a capture → target → bubble sequence.
pub struct Router<K, P: ParentLookup<K> = NoParent> {
    pub(crate) parent: P,
    pub(crate) scope: Option<fn(&K) -> bool>,
    pub(crate) _phantom: core::marker::PhantomData<fn() -> K>,
}

impl<K: Copy + Eq, P: ParentLookup<K>> core::fmt::Debug for Router<K, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Router")
            .field("scoped", &self.scope.is_some())
            .finish_non_exhaustive()
    }
}

impl<K: Copy + Eq, P: ParentLookup<K> + Default> Router<K, P> {
    /// Create a router with a default parent lookup.
    pub fn new() -> Self {
        Self::with_parent(P::default())
    }
}

impl<K: Copy + Eq, P: ParentLookup<K> + Default> Default for Router<K, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Copy + Eq, P: ParentLookup<K>> Router<K, P> {
    /// Create a router with an explicit parent lookup provider.
    pub fn with_parent(parent: P) -> Self {
        Self {
            parent,
            scope: None,
            _phantom: core::marker::PhantomData,
        }
    }

    /// Set an optional scope filter; ancestors that fail the predicate are not routed.
    pub fn set_scope(&mut self, scope: Option<fn(&K) -> bool>) {
        self.scope = scope;
    }

    /// Root→target path for `target`.
    pub fn path(&self, target: K) -> Vec<K> {
        let mut out = Vec::new();
        let mut cur = target;
        // Collect to root; caller ensures acyclic ancestry.
        loop {
            out.push(cur);
            match self.parent.parent_of(&cur) {
                Some(p) => cur = p,
                None => break,
            }
        }
        out.reverse();
        out
    }

    /// Produce the propagation sequence for an event aimed at `target`.
    pub fn route(&self, target: K, options: RouteOptions) -> Vec<Dispatch<K>> {
        let path: Vec<K> = self
            .path(target)
            .into_iter()
            .filter(|n| *n == target || self.scope.is_none_or(|f| f(n)))
            .collect();
        self.emit_path(&path, target, options)
    }

    fn emit_path(&self, path: &[K], target: K, options: RouteOptions) -> Vec<Dispatch<K>> {
        let ancestors = &path[..path.len().saturating_sub(1)];
        let mut out = Vec::with_capacity(ancestors.len() * 2 + 1);
        // Capture: root→parent
        for &node in ancestors {
            out.push(Dispatch {
                phase: Phase::Capture,
                node,
            });
        }
        out.push(Dispatch {
            phase: Phase::Target,
            node: target,
        });
        // Bubble: parent→root
        if options.bubbles {
            for &node in ancestors.iter().rev() {
                out.push(Dispatch {
                    phase: Phase::Bubble,
                    node,
                });
            }
        }
        out
    }
}
