// Copyright 2025 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Custom element lifecycle: upgrade, connect, disconnect, attribute changes.
//!
//! Every structural mutation returns a [`TreeChange`]. [`Runtime::apply_change`]
//! turns it into lifecycle transitions, in this order:
//!
//! 1. Hosts that left the document are disconnected.
//! 2. Freed nodes lose their listeners; freed hosts lose their instance.
//! 3. New elements with a defined tag are upgraded.
//! 4. Hosts that entered the document are connected (upgrading first if needed).
//!
//! Moving a host between two connected parents shows up in both lists, so the
//! same instance is disconnected and then connected again, state intact.

use sprig_dom::{AttributeChange, NodeId, TreeChange};
use tracing::{debug, trace, warn};

use crate::component::Component;
use crate::instance::Instance;
use crate::runtime::{Cx, Runtime};

impl Runtime {
    pub(crate) fn apply_change(&mut self, change: TreeChange) {
        for &node in &change.disconnected {
            self.disconnect(node);
        }
        for &node in &change.freed {
            self.listeners.remove_node(node);
            self.destroy(node);
        }
        for &node in &change.inserted {
            if self.doc.is_alive(node) && !self.instances.contains_key(&node) {
                self.upgrade(node);
            }
        }
        for &node in &change.connected {
            if !self.doc.is_connected(node) {
                continue;
            }
            if self.instances.contains_key(&node) {
                self.connect(node);
            } else {
                self.upgrade(node);
            }
        }
    }

    /// Attach a component instance to `node` if its tag is defined.
    pub(crate) fn upgrade(&mut self, node: NodeId) {
        let Some(tag) = self.doc.tag(node).map(str::to_string) else {
            return;
        };
        let Some(factory) = self.registry.get(&tag) else {
            return;
        };
        self.instances.insert(node, Instance::new(&tag, factory()));
        debug!(host = %node, %tag, "upgraded");
        self.call_hook(node, |c, cx| c.created(cx));

        let present: Vec<AttributeChange> = self
            .doc
            .attributes(node)
            .iter()
            .map(|a| AttributeChange {
                name: a.name.clone(),
                old: None,
                new: Some(a.value.clone()),
            })
            .collect();
        for change in present {
            self.notify_attribute(node, &change);
        }

        if self.doc.is_connected(node) {
            self.connect(node);
        }
    }

    pub(crate) fn connect(&mut self, host: NodeId) {
        let Some(inst) = self.instances.get_mut(&host) else {
            return;
        };
        if inst.render.mounted {
            return;
        }
        inst.render.mounted = true;
        debug!(%host, tag = %inst.tag, "connected");
        if !inst.render.rendered {
            inst.render.pending = false;
            self.commit(host);
        } else if inst.render.dirty {
            self.request_render(host);
        }
        self.call_hook(host, |c, cx| c.connected(cx));
    }

    pub(crate) fn disconnect(&mut self, host: NodeId) {
        if !self.instances.get(&host).is_some_and(|i| i.render.mounted) {
            return;
        }
        self.call_hook(host, |c, cx| c.disconnected(cx));
        if let Some(inst) = self.instances.get_mut(&host) {
            inst.render.mounted = false;
            if inst.render.pending {
                trace!(%host, "pending render cancelled");
            }
            inst.render.pending = false;
            debug!(%host, tag = %inst.tag, "disconnected");
        }
        let listeners = self.listeners.remove_owned(host);
        let timers = self.timers.clear_host(host);
        if listeners + timers > 0 {
            trace!(%host, listeners, timers, "released");
        }
    }

    fn destroy(&mut self, node: NodeId) {
        if let Some(inst) = self.instances.remove(&node) {
            self.listeners.remove_owned(node);
            self.timers.clear_host(node);
            debug!(host = %node, tag = %inst.tag, "destroyed");
        }
    }

    /// Deliver an attribute change to `host` if it observes that attribute.
    pub(crate) fn notify_attribute(&mut self, host: NodeId, change: &AttributeChange) {
        if !self.instances.get(&host).is_some_and(|i| i.observes(&change.name)) {
            return;
        }
        self.call_hook(host, |c, cx| c.attribute_changed(cx, change));
    }

    /// Run a hook with the component taken out of its instance.
    ///
    /// A hook that reaches its own host again (for example by moving it) finds
    /// the component missing; that nested hook is skipped.
    pub(crate) fn call_hook(&mut self, host: NodeId, hook: impl FnOnce(&mut dyn Component, &mut Cx<'_>)) {
        let Some(inst) = self.instances.get_mut(&host) else {
            return;
        };
        let Some(mut component) = inst.component.take() else {
            warn!(%host, tag = %inst.tag, "component busy; nested lifecycle hook skipped");
            return;
        };
        hook(component.as_mut(), &mut Cx::new(self, host));
        if let Some(inst) = self.instances.get_mut(&host) {
            inst.component = Some(component);
        }
    }
}
