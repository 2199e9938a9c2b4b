// Copyright 2025 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Listener storage and synchronous event dispatch.
//!
//! The propagation path is computed once, when dispatch starts, by the
//! responder's router over the document's parent links. Capture listeners run
//! on the ancestors from the root down, every listener runs on the target, and
//! non-capture listeners run on the ancestors back up (unless the event does
//! not bubble). Within a node, listeners run in registration order.
//!
//! Listeners registered during dispatch do not run for the current event.
//! Listeners removed during dispatch (including those on nodes freed by a
//! commit) are skipped.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use sprig_dom::NodeId;
use sprig_responder::adapters::dom::route_in_document;
use sprig_responder::dispatch::run_dispatch;
use sprig_responder::types::{Outcome, Phase, RouteOptions};
use tracing::{trace, warn};

use crate::event::{Event, ListenerId, ListenerOptions};
use crate::runtime::{Cx, Runtime};

pub(crate) type Handler = dyn FnMut(&mut Cx<'_>, &mut Event);

struct Listener {
    id: ListenerId,
    event: String,
    options: ListenerOptions,
    /// Component whose `Cx` the callback receives, when registered through `Cx::listen`.
    owner: Option<NodeId>,
    callback: Rc<RefCell<Handler>>,
}

/// A listener picked for one dispatch step.
struct Armed {
    id: ListenerId,
    once: bool,
    host: NodeId,
    callback: Rc<RefCell<Handler>>,
}

#[derive(Default)]
pub(crate) struct Listeners {
    next: u64,
    by_node: HashMap<NodeId, Vec<Listener>>,
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("nodes", &self.by_node.len())
            .field("total", &self.by_node.values().map(Vec::len).sum::<usize>())
            .finish_non_exhaustive()
    }
}

impl Listeners {
    pub(crate) fn add(
        &mut self,
        node: NodeId,
        event: &str,
        options: ListenerOptions,
        owner: Option<NodeId>,
        callback: Rc<RefCell<Handler>>,
    ) -> ListenerId {
        self.next += 1;
        let id = ListenerId(self.next);
        self.by_node.entry(node).or_default().push(Listener {
            id,
            event: event.to_string(),
            options,
            owner,
            callback,
        });
        id
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let mut removed = false;
        self.by_node.retain(|_, list| {
            let before = list.len();
            list.retain(|l| l.id != id);
            removed |= list.len() != before;
            !list.is_empty()
        });
        removed
    }

    fn contains(&self, node: NodeId, id: ListenerId) -> bool {
        self.by_node
            .get(&node)
            .is_some_and(|list| list.iter().any(|l| l.id == id))
    }

    /// Drop everything registered on `node`.
    pub(crate) fn remove_node(&mut self, node: NodeId) -> usize {
        self.by_node.remove(&node).map_or(0, |list| list.len())
    }

    /// Drop everything registered on behalf of `owner`, wherever it lives.
    pub(crate) fn remove_owned(&mut self, owner: NodeId) -> usize {
        let mut removed = 0;
        self.by_node.retain(|_, list| {
            let before = list.len();
            list.retain(|l| l.owner != Some(owner));
            removed += before - list.len();
            !list.is_empty()
        });
        removed
    }

    pub(crate) fn count(&self, node: NodeId) -> usize {
        self.by_node.get(&node).map_or(0, Vec::len)
    }

    /// Listeners on `node` that take part in `phase` for `event`, in registration order.
    fn snapshot(&self, node: NodeId, event: &str, phase: Phase) -> Vec<Armed> {
        let Some(list) = self.by_node.get(&node) else {
            return Vec::new();
        };
        list.iter()
            .filter(|l| l.event == event)
            .filter(|l| match phase {
                Phase::Capture => l.options.capture,
                Phase::Target => true,
                Phase::Bubble => !l.options.capture,
            })
            .map(|l| Armed {
                id: l.id,
                once: l.options.once,
                host: l.owner.unwrap_or(node),
                callback: l.callback.clone(),
            })
            .collect()
    }
}

impl Runtime {
    /// Deliver `event` along the path to `target`. Returns false if a listener
    /// called [`Event::prevent_default`].
    pub(crate) fn dispatch(&mut self, target: NodeId, event: &mut Event) -> bool {
        let path = route_in_document(
            &self.doc,
            target,
            RouteOptions {
                bubbles: event.bubbles(),
            },
        );
        trace!(%target, event = event.name(), steps = path.len(), "dispatch");
        event.target = Some(target);
        event.propagation_stopped = false;
        event.immediate_stopped = false;
        run_dispatch(&path, |step| {
            event.phase = step.phase;
            event.current_target = Some(step.node);
            let listeners = self.listeners.snapshot(step.node, event.name(), step.phase);
            for armed in listeners {
                if !self.listeners.contains(step.node, armed.id) {
                    continue;
                }
                if armed.once {
                    self.listeners.remove(armed.id);
                }
                let Ok(mut callback) = armed.callback.try_borrow_mut() else {
                    warn!(node = %step.node, event = event.name(), "listener is already running; re-entrant call skipped");
                    continue;
                };
                (&mut *callback)(&mut Cx::new(self, armed.host), event);
                if event.immediate_stopped {
                    break;
                }
            }
            if event.propagation_stopped {
                Outcome::StopAndConsume
            } else {
                Outcome::Continue
            }
        });
        event.current_target = None;
        !event.default_prevented()
    }
}
