// Copyright 2025 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sprig Responder: a deterministic, `no_std` propagation router for UI events.
//!
//! ## Overview
//!
//! This crate builds the propagation sequence (capture → target → bubble) for an event target.
//! It does not own listeners or run handlers.
//! Instead, give it a [`ParentLookup`](crate::types::ParentLookup) (for example a document's parent links)
//! and it emits a deterministic sequence of [`Dispatch`](crate::types::Dispatch) steps that a higher layer delivers.
//!
//! ## Propagation
//!
//! - Capture visits ancestors from the root down to the target's parent.
//! - Target visits the target once.
//! - Bubble visits ancestors from the parent back up to the root, unless
//!   [`RouteOptions::bubbles`](crate::types::RouteOptions::bubbles) is false.
//!
//! The path is fixed when the sequence is built, so handlers that restructure the
//! tree mid-dispatch do not change who is visited.
//!
//! ## Delegation
//!
//! Components attach one listener to their stable host node and find the element
//! that was actually interacted with by walking up from the event target.
//! [`closest_within`](crate::dispatch::closest_within) performs that walk without
//! escaping the host; the DOM adapter wraps it with selector matching.
//!
//! ## Dispatcher
//!
//! [`run_dispatch`](crate::dispatch::run_dispatch) walks a sequence and honors stop rules:
//!
//! ```
//! use sprig_responder::dispatch::run_dispatch;
//! use sprig_responder::router::Router;
//! use sprig_responder::types::{Outcome, Phase, RouteOptions};
//!
//! // 3 → 2 → 1 (root).
//! let router = Router::with_parent(|n: &u32| (*n > 1).then(|| n - 1));
//! let seq = router.route(3, RouteOptions::default());
//!
//! let mut visited = Vec::new();
//! let consumed = run_dispatch(&seq, |d| {
//!     visited.push((d.phase, d.node));
//!     // A handler on node 2 stops propagation during bubble.
//!     if d.phase == Phase::Bubble && d.node == 2 {
//!         Outcome::StopAndConsume
//!     } else {
//!         Outcome::Continue
//!     }
//! });
//! assert!(consumed);
//! assert_eq!(visited.last(), Some(&(Phase::Bubble, 2)));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod adapters;
pub mod dispatch;
pub mod router;
pub mod types;
