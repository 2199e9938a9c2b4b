// Copyright 2025 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The runtime and the per-host context handed to component code.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use sprig_dom::{Document, NodeId, SelectorList};
use sprig_responder::adapters::dom::closest_matching;
use tracing::{trace, warn};

use crate::attr::parse_json_attribute;
use crate::catalog::EventName;
use crate::commit::RenderFailure;
use crate::component::{Component, Registry};
use crate::config::RuntimeConfig;
use crate::dispatch::{Handler, Listeners};
use crate::error::{AttributeError, RuntimeError};
use crate::event::{Event, ListenerId, ListenerOptions};
use crate::instance::{Instance, RequestTag};
use crate::scheduler::Scheduler;
use crate::session::{NoSession, SessionProvider};
use crate::state::{StateKey, StateStore};
use crate::timer::{TimerId, Timers};

/// A document plus the component instances living in it.
///
/// Every public method that can run component code is an entry point: when the
/// outermost one returns, pending renders are flushed (unless
/// [`RuntimeConfig::auto_flush`] is off). Calls made from inside a hook or a
/// listener never flush on their own.
pub struct Runtime {
    pub(crate) doc: Document,
    pub(crate) registry: Registry,
    pub(crate) instances: HashMap<NodeId, Instance>,
    pub(crate) listeners: Listeners,
    pub(crate) scheduler: Scheduler,
    pub(crate) timers: Timers,
    pub(crate) session: Rc<dyn SessionProvider>,
    pub(crate) config: RuntimeConfig,
    pub(crate) failures: Vec<RenderFailure>,
    depth: usize,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("registry", &self.registry)
            .field("instances", &self.instances.len())
            .field("listeners", &self.listeners)
            .field("queued", &self.scheduler.len())
            .field("timers", &self.timers)
            .field("config", &self.config)
            .field("failures", &self.failures.len())
            .finish_non_exhaustive()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    /// A runtime with an empty document and the default configuration.
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    /// A runtime with an empty document.
    pub fn with_config(config: RuntimeConfig) -> Self {
        Self {
            doc: Document::new(),
            registry: Registry::default(),
            instances: HashMap::new(),
            listeners: Listeners::default(),
            scheduler: Scheduler::default(),
            timers: Timers::default(),
            session: Rc::new(NoSession),
            config,
            failures: Vec::new(),
            depth: 0,
        }
    }

    /// Replace the session components read through [`Cx::session`].
    #[must_use]
    pub fn with_session<S: SessionProvider + 'static>(mut self, session: Rc<S>) -> Self {
        self.session = session;
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    fn entry<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.depth += 1;
        let out = f(self);
        self.depth -= 1;
        if self.depth == 0 && self.config.auto_flush {
            self.checkpoint();
        }
        out
    }

    /// Register a component for `tag` and upgrade matching elements already
    /// in the document.
    pub fn define<C, F>(&mut self, tag: &str, factory: F) -> Result<(), RuntimeError>
    where
        C: Component + 'static,
        F: Fn() -> C + 'static,
    {
        self.registry
            .define(tag, Rc::new(move || Box::new(factory()) as Box<dyn Component>))?;
        self.entry(|rt| {
            let root = rt.doc.root();
            let existing: Vec<NodeId> = rt
                .doc
                .subtree(root)
                .into_iter()
                .filter(|&n| rt.doc.tag(n) == Some(tag) && !rt.instances.contains_key(&n))
                .collect();
            for node in existing {
                if rt.doc.is_connected(node) && !rt.instances.contains_key(&node) {
                    rt.upgrade(node);
                }
            }
        });
        Ok(())
    }

    /// The defined tags.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Read-only view of the document.
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// The document root.
    pub fn root(&self) -> NodeId {
        self.doc.root()
    }

    fn check(&self, node: NodeId) -> Result<(), RuntimeError> {
        if self.doc.is_alive(node) {
            Ok(())
        } else {
            Err(RuntimeError::UnknownNode(node))
        }
    }

    /// Create a detached element. Defined tags are upgraded right away; the
    /// instance connects when the element is inserted.
    pub fn create_element(&mut self, tag: &str) -> Result<NodeId, RuntimeError> {
        Ok(self.entry(|rt| {
            let node = rt.doc.create_element(tag);
            rt.upgrade(node);
            node
        }))
    }

    /// Append `child` to `parent`, moving it if it already has a parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), RuntimeError> {
        self.entry(|rt| -> Result<(), RuntimeError> {
            let change = rt.doc.append_child(parent, child)?;
            rt.apply_change(change);
            Ok(())
        })
    }

    /// Unlink `node` from its parent. The subtree and its instances stay alive
    /// and can be inserted again.
    pub fn detach(&mut self, node: NodeId) -> Result<(), RuntimeError> {
        self.check(node)?;
        self.entry(|rt| {
            let change = rt.doc.detach(node);
            rt.apply_change(change);
        });
        Ok(())
    }

    /// Unlink `node` and free its subtree, dropping any instances in it.
    pub fn remove(&mut self, node: NodeId) -> Result<(), RuntimeError> {
        self.check(node)?;
        self.entry(|rt| {
            let change = rt.doc.remove(node);
            rt.apply_change(change);
        });
        Ok(())
    }

    /// Replace the children of `node` with parsed markup.
    ///
    /// This bypasses the owning component's render; its next render overwrites it.
    pub fn set_inner_html(&mut self, node: NodeId, markup: &str) -> Result<(), RuntimeError> {
        self.entry(|rt| -> Result<(), RuntimeError> {
            let change = rt.doc.set_inner_html(node, markup)?;
            rt.apply_change(change);
            Ok(())
        })
    }

    /// Parse `markup` and append it to `parent`. Returns the new top-level nodes.
    pub fn mount_markup(&mut self, parent: NodeId, markup: &str) -> Result<Vec<NodeId>, RuntimeError> {
        self.entry(|rt| -> Result<Vec<NodeId>, RuntimeError> {
            let change = rt.doc.append_markup(parent, markup)?;
            let top: Vec<NodeId> = change
                .inserted
                .iter()
                .copied()
                .filter(|&n| rt.doc.parent(n) == Some(parent))
                .collect();
            rt.apply_change(change);
            Ok(top)
        })
    }

    /// Set an attribute, notifying the host's component if it observes it.
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), RuntimeError> {
        self.check(node)?;
        self.entry(|rt| {
            if let Some(change) = rt.doc.set_attribute(node, name, value) {
                rt.notify_attribute(node, &change);
            }
        });
        Ok(())
    }

    /// Remove an attribute, notifying the host's component if it observes it.
    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), RuntimeError> {
        self.check(node)?;
        self.entry(|rt| {
            if let Some(change) = rt.doc.remove_attribute(node, name) {
                rt.notify_attribute(node, &change);
            }
        });
        Ok(())
    }

    /// Attach a listener to any node.
    ///
    /// The callback's [`Cx`] is scoped to `node`. Listeners on nodes created by
    /// a render are freed with those nodes on the next commit.
    pub fn add_event_listener(
        &mut self,
        node: NodeId,
        event: impl Into<EventName>,
        options: ListenerOptions,
        callback: impl FnMut(&mut Cx<'_>, &mut Event) + 'static,
    ) -> Result<ListenerId, RuntimeError> {
        self.check(node)?;
        let event: EventName = event.into();
        let callback: Rc<RefCell<Handler>> = Rc::new(RefCell::new(callback));
        Ok(self
            .listeners
            .add(node, &event.as_str(), options, None, callback))
    }

    /// Remove a listener. Returns true if it was registered.
    pub fn remove_event_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Number of listeners registered on `node`.
    pub fn listener_count(&self, node: NodeId) -> usize {
        self.listeners.count(node)
    }

    /// Dispatch `event` at `target`. Returns false if a listener prevented the default.
    pub fn dispatch_event(&mut self, target: NodeId, mut event: Event) -> Result<bool, RuntimeError> {
        self.check(target)?;
        Ok(self.entry(|rt| rt.dispatch(target, &mut event)))
    }

    /// Dispatch a bubbling `click` at `target`.
    pub fn click(&mut self, target: NodeId) -> Result<bool, RuntimeError> {
        self.dispatch_event(target, Event::new(EventName::Click).with_bubbles(true))
    }

    /// Run `f` against the component on `host`, as an asynchronous continuation would.
    ///
    /// Returns `None` if `host` is no longer a live component host. On a
    /// detached host the writes are stored and the render waits for reconnection.
    pub fn update<R>(&mut self, host: NodeId, f: impl FnOnce(&mut Cx<'_>) -> R) -> Option<R> {
        if !self.doc.is_alive(host) || !self.instances.contains_key(&host) {
            return None;
        }
        Some(self.entry(|rt| f(&mut Cx::new(rt, host))))
    }

    /// Run every pending render now.
    pub fn flush(&mut self) {
        self.checkpoint();
    }

    /// Move the virtual clock forward, firing due timers in order.
    ///
    /// Each timer callback is its own entry point, so renders it requests are
    /// flushed before the next timer fires. Zero-delay timers armed by those
    /// callbacks fire on the next call. Timers whose host is out of the
    /// document are dropped unfired.
    pub fn advance_time(&mut self, by: Duration) {
        let until = self.timers.now().saturating_add(by);
        let watermark = self.timers.watermark();
        while let Some(timer) = self.timers.pop_due(until, watermark) {
            if !self.doc.is_connected(timer.host) {
                trace!(host = %timer.host, "timer dropped; host is not in the document");
                continue;
            }
            let callback = timer.callback;
            let host = timer.host;
            self.entry(|rt| callback(&mut Cx::new(rt, host)));
        }
        self.timers.settle(until);
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.timers.now()
    }

    /// State of the component on `host`.
    pub fn state(&self, host: NodeId) -> Option<&StateStore> {
        self.instances.get(&host).map(|i| &i.state)
    }

    /// Number of times `render` was called for `host`, failed passes included.
    pub fn render_count(&self, host: NodeId) -> Option<u64> {
        self.instances.get(&host).map(|i| i.render.count)
    }

    /// Whether `host` has a mounted component.
    pub fn is_mounted(&self, host: NodeId) -> bool {
        self.instances.get(&host).is_some_and(|i| i.render.mounted)
    }

    /// Serialized children of `node`.
    pub fn inner_html(&self, node: NodeId) -> String {
        self.doc.inner_html(node)
    }

    /// Take the render failures recorded so far.
    pub fn drain_render_failures(&mut self) -> Vec<RenderFailure> {
        std::mem::take(&mut self.failures)
    }
}

/// Component-side view of the runtime, scoped to one host element.
pub struct Cx<'a> {
    rt: &'a mut Runtime,
    host: NodeId,
}

impl fmt::Debug for Cx<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cx").field("host", &self.host).finish_non_exhaustive()
    }
}

impl<'a> Cx<'a> {
    pub(crate) fn new(rt: &'a mut Runtime, host: NodeId) -> Self {
        Self { rt, host }
    }

    /// The host element.
    pub fn host(&self) -> NodeId {
        self.host
    }

    /// Read-only view of the document.
    pub fn document(&self) -> &Document {
        &self.rt.doc
    }

    /// The whole runtime, for tree mutations and dispatch to other nodes.
    ///
    /// Calls made through it do not flush until the outermost entry point returns.
    pub fn runtime(&mut self) -> &mut Runtime {
        self.rt
    }

    /// The host's state store.
    pub fn state(&self) -> Option<&StateStore> {
        self.rt.state(self.host)
    }

    /// Latest value under `key`, whether or not it has been rendered yet.
    pub fn get<T: 'static>(&self, key: &str) -> Option<&T> {
        self.state()?.get(key)
    }

    /// Typed read.
    pub fn read<T: 'static>(&self, key: StateKey<T>) -> Option<&T> {
        self.state()?.read(key)
    }

    /// Store `value` under `key` and request a render.
    ///
    /// Writes coalesce: any number of them before the next checkpoint produce
    /// one render. On an unmounted host the value is kept for the next connect.
    pub fn set<T: 'static>(&mut self, key: impl Into<String>, value: T) {
        let host = self.host;
        let Some(inst) = self.rt.instances.get_mut(&host) else {
            warn!(%host, "state write on a node without a component; ignored");
            return;
        };
        inst.state.insert(key, value);
        self.rt.request_render(host);
    }

    /// Typed write.
    pub fn put<T: 'static>(&mut self, key: StateKey<T>, value: T) {
        self.set(key.name(), value);
    }

    /// Modify the value under `key` in place, starting from `T::default()` when
    /// absent or of another type, and request a render.
    pub fn update<T: Default + 'static>(&mut self, key: &str, f: impl FnOnce(&mut T)) {
        let host = self.host;
        let Some(inst) = self.rt.instances.get_mut(&host) else {
            warn!(%host, "state write on a node without a component; ignored");
            return;
        };
        if inst.state.get::<T>(key).is_none() {
            inst.state.insert(key, T::default());
        }
        if let Some(value) = inst.state.get_mut::<T>(key) {
            f(value);
        }
        self.rt.request_render(host);
    }

    /// Whether the host is currently mounted.
    pub fn is_mounted(&self) -> bool {
        self.rt.is_mounted(self.host)
    }

    /// Raw attribute value on the host.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.rt.doc.attribute(self.host, name)
    }

    /// Decode a JSON host attribute. `Ok(None)` when the attribute is absent.
    pub fn json_attribute<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, AttributeError> {
        self.attribute(name)
            .map(|raw| parse_json_attribute(name, raw))
            .transpose()
    }

    /// Decode a JSON host attribute, falling back to `T::default()` when it is
    /// absent or malformed.
    pub fn json_attribute_or_default<T: DeserializeOwned + Default>(&self, name: &str) -> T {
        match self.json_attribute(name) {
            Ok(value) => value.unwrap_or_default(),
            Err(err) => {
                warn!(host = %self.host, %err, "using default for malformed attribute");
                T::default()
            }
        }
    }

    /// Listen on the host for the whole mounted lifetime.
    ///
    /// The listener is released when the host disconnects, so registering in
    /// [`Component::connected`] never accumulates duplicates.
    pub fn listen(
        &mut self,
        event: impl Into<EventName>,
        callback: impl FnMut(&mut Cx<'_>, &mut Event) + 'static,
    ) -> ListenerId {
        self.listen_with(event, ListenerOptions::default(), callback)
    }

    /// [`listen`](Self::listen) with options.
    pub fn listen_with(
        &mut self,
        event: impl Into<EventName>,
        options: ListenerOptions,
        callback: impl FnMut(&mut Cx<'_>, &mut Event) + 'static,
    ) -> ListenerId {
        let event: EventName = event.into();
        let callback: Rc<RefCell<Handler>> = Rc::new(RefCell::new(callback));
        self.rt.listeners.add(
            self.host,
            &event.as_str(),
            options,
            Some(self.host),
            callback,
        )
    }

    /// Remove a listener.
    pub fn unlisten(&mut self, id: ListenerId) -> bool {
        self.rt.listeners.remove(id)
    }

    /// Dispatch a bubbling, composed custom event from the host, synchronously.
    ///
    /// Returns false if a listener prevented the default.
    pub fn emit<T: 'static>(&mut self, event: impl Into<EventName>, detail: T) -> bool {
        let host = self.host;
        if !self.rt.doc.is_alive(host) {
            return true;
        }
        self.rt.dispatch(host, &mut Event::custom(event, detail))
    }

    fn selector(&self, selector: &str) -> Option<SelectorList> {
        SelectorList::parse(selector)
            .inspect_err(|err| warn!(host = %self.host, selector, %err, "invalid selector"))
            .ok()
    }

    /// Nearest inclusive ancestor of `node` matching `selector`.
    pub fn closest(&self, node: NodeId, selector: &str) -> Option<NodeId> {
        let selector = self.selector(selector)?;
        self.rt.doc.closest(node, &selector)
    }

    /// The element matching `selector` between the event target and the host.
    ///
    /// This is the delegation lookup for host-level listeners: it never
    /// escapes the host, so markup outside the component cannot match.
    pub fn delegate(&self, event: &Event, selector: &str) -> Option<NodeId> {
        let selector = self.selector(selector)?;
        closest_matching(&self.rt.doc, event.target()?, self.host, &selector)
    }

    /// First descendant of the host matching `selector`.
    pub fn query(&self, selector: &str) -> Option<NodeId> {
        let selector = self.selector(selector)?;
        self.rt.doc.query_selector(self.host, &selector)
    }

    /// The injected session.
    pub fn session(&self) -> &dyn SessionProvider {
        &*self.rt.session
    }

    /// Run `callback` after `delay` of virtual time, unless the host
    /// disconnects first or is out of the document when the timer comes due.
    pub fn set_timeout(&mut self, delay: Duration, callback: impl FnOnce(&mut Cx<'_>) + 'static) -> TimerId {
        self.rt.timers.schedule(self.host, delay, Box::new(callback))
    }

    /// Cancel a timer. Returns true if it had not fired yet.
    pub fn clear_timeout(&mut self, id: TimerId) -> bool {
        self.rt.timers.cancel(id)
    }

    /// Tag a new request on `channel`, superseding earlier ones.
    ///
    /// This is opt-in last-write-wins: the runtime never drops responses on
    /// its own. Returns `None` if the host has no component.
    pub fn begin_request(&mut self, channel: &str) -> Option<RequestTag> {
        Some(self.rt.instances.get_mut(&self.host)?.begin_request(channel))
    }

    /// Whether `tag` is still the newest request on its channel.
    pub fn is_latest(&self, tag: &RequestTag) -> bool {
        self.rt
            .instances
            .get(&self.host)
            .is_some_and(|i| i.is_latest(tag))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use std::time::Duration;

    use crate::{
        Component, Cx, EventName, ListenerOptions, MemorySession, Profile, RenderError, Runtime,
        RuntimeConfig, SessionProvider, StateKey, StateStore, Token,
    };

    /// `<span>{count}</span>`, incremented by clicks on the host.
    struct Counter;

    impl Component for Counter {
        fn render(&self, state: &StateStore) -> Result<String, RenderError> {
            Ok(format!(
                "<span>{}</span>",
                state.get::<u32>("count").copied().unwrap_or(0)
            ))
        }

        fn connected(&mut self, cx: &mut Cx<'_>) {
            cx.listen(EventName::Click, |cx, _| {
                let next = cx.get::<u32>("count").copied().unwrap_or(0) + 1;
                cx.set("count", next);
            });
        }
    }

    fn counter() -> (Runtime, sprig_dom::NodeId) {
        let mut rt = Runtime::new();
        rt.define("x-counter", || Counter).unwrap();
        let host = rt.mount_markup(rt.root(), "<x-counter></x-counter>").unwrap()[0];
        (rt, host)
    }

    #[test]
    fn counter_scenario() {
        let (mut rt, host) = counter();
        assert_eq!(rt.inner_html(host), "<span>0</span>");
        assert_eq!(rt.render_count(host), Some(1));
        for _ in 0..5 {
            rt.click(host).unwrap();
        }
        assert_eq!(rt.inner_html(host), "<span>5</span>");
        assert_eq!(rt.render_count(host), Some(6));
    }

    #[test]
    fn clicks_on_rendered_children_reach_the_host() {
        let (mut rt, host) = counter();
        for _ in 0..3 {
            let span = rt.document().children(host)[0];
            rt.click(span).unwrap();
        }
        assert_eq!(rt.inner_html(host), "<span>3</span>");
    }

    struct Multi;

    impl Component for Multi {
        fn render(&self, state: &StateStore) -> Result<String, RenderError> {
            let a = state.get::<u32>("a").copied().unwrap_or(0);
            let b = state.get::<String>("b").map_or("-", String::as_str);
            let c = state.get::<bool>("c").copied().unwrap_or(false);
            Ok(format!("{a}/{b}/{c}"))
        }

        fn connected(&mut self, cx: &mut Cx<'_>) {
            cx.listen("load", |cx, _| {
                cx.set("a", 1_u32);
                cx.set("b", String::from("two"));
                cx.set("c", true);
                // Reads see the writes before anything is committed.
                assert_eq!(cx.get::<u32>("a"), Some(&1));
                assert_eq!(cx.document().inner_html(cx.host()), "0/-/false");
            });
        }
    }

    #[test]
    fn writes_in_one_handler_coalesce() {
        let mut rt = Runtime::new();
        rt.define("x-multi", || Multi).unwrap();
        let host = rt.mount_markup(rt.root(), "<x-multi></x-multi>").unwrap()[0];
        assert_eq!(rt.render_count(host), Some(1));
        rt.dispatch_event(host, crate::Event::new("load")).unwrap();
        assert_eq!(rt.render_count(host), Some(2));
        assert_eq!(rt.inner_html(host), "1/two/true");
    }

    #[test]
    fn read_after_write_without_flush() {
        let mut rt = Runtime::with_config(RuntimeConfig {
            auto_flush: false,
            ..RuntimeConfig::default()
        });
        rt.define("x-counter", || Counter).unwrap();
        let host = rt.mount_markup(rt.root(), "<x-counter></x-counter>").unwrap()[0];
        rt.update(host, |cx| {
            cx.set("count", 5_u32);
            assert_eq!(cx.get::<u32>("count"), Some(&5));
        });
        assert_eq!(rt.state(host).unwrap().get::<u32>("count"), Some(&5));
        assert_eq!(rt.inner_html(host), "<span>0</span>");
        rt.flush();
        assert_eq!(rt.inner_html(host), "<span>5</span>");
    }

    #[test]
    fn host_listener_survives_rerenders_without_duplication() {
        let mut rt = Runtime::new();
        rt.define("x-counter", || Counter).unwrap();
        let host = rt.mount_markup(rt.root(), "<x-counter></x-counter>").unwrap()[0];
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        rt.add_event_listener(host, "ping", ListenerOptions::default(), move |_, _| {
            h.set(h.get() + 1);
        })
        .unwrap();
        const N: u32 = 7;
        for i in 1..=N {
            rt.update(host, |cx| cx.set("count", i)).unwrap();
        }
        assert_eq!(rt.render_count(host), Some(u64::from(N) + 1));
        for _ in 0..N {
            rt.dispatch_event(host, crate::Event::new("ping")).unwrap();
        }
        assert_eq!(hits.get(), N);
        assert_eq!(rt.listener_count(host), 2);
    }

    /// Renders successfully once, then fails.
    struct Flaky {
        calls: Cell<u32>,
    }

    impl Component for Flaky {
        fn render(&self, state: &StateStore) -> Result<String, RenderError> {
            self.calls.set(self.calls.get() + 1);
            if self.calls.get() >= 2 {
                return Err(RenderError::msg("backend shape changed"));
            }
            Ok(format!("<p>{}</p>", state.get::<u32>("n").copied().unwrap_or(0)))
        }

        fn connected(&mut self, cx: &mut Cx<'_>) {
            cx.listen(EventName::Click, |cx, _| cx.update::<u32>("n", |n| *n += 1));
        }
    }

    #[test]
    fn failed_render_keeps_previous_content() {
        let mut rt = Runtime::new();
        rt.define("x-flaky", || Flaky { calls: Cell::new(0) }).unwrap();
        let host = rt.mount_markup(rt.root(), "<x-flaky></x-flaky>").unwrap()[0];
        assert_eq!(rt.inner_html(host), "<p>0</p>");

        rt.click(host).unwrap();
        assert_eq!(rt.inner_html(host), "<p>0</p>");
        let failures = rt.drain_render_failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].host, host);
        assert_eq!(failures[0].tag, "x-flaky");

        // Host listener still works; the write goes through even though the DOM cannot follow.
        rt.click(host).unwrap();
        assert_eq!(rt.state(host).unwrap().get::<u32>("n"), Some(&2));
        assert_eq!(rt.drain_render_failures().len(), 1);
    }

    struct Panicky;

    impl Component for Panicky {
        fn render(&self, state: &StateStore) -> Result<String, RenderError> {
            if state.contains("boom") {
                panic!("boom");
            }
            Ok("<em>ok</em>".into())
        }
    }

    #[test]
    fn panicking_and_malformed_renders_are_contained() {
        let mut rt = Runtime::new();
        rt.define("x-panicky", || Panicky).unwrap();
        let host = rt.mount_markup(rt.root(), "<x-panicky></x-panicky>").unwrap()[0];
        let sibling = rt.mount_markup(rt.root(), "<x-counter></x-counter>").unwrap()[0];
        rt.define("x-counter", || Counter).unwrap();

        rt.update(host, |cx| cx.set("boom", ())).unwrap();
        assert_eq!(rt.inner_html(host), "<em>ok</em>");
        assert!(matches!(
            rt.drain_render_failures()[0].error,
            RenderError::Panicked(_)
        ));

        // A sibling component is unaffected.
        rt.click(sibling).unwrap();
        assert_eq!(rt.inner_html(sibling), "<span>1</span>");
    }

    struct Broken;

    impl Component for Broken {
        fn render(&self, state: &StateStore) -> Result<String, RenderError> {
            Ok(if state.contains("bad") {
                "<div><span></div>".into()
            } else {
                "<div>fine</div>".into()
            })
        }
    }

    #[test]
    fn malformed_markup_is_a_render_failure() {
        let mut rt = Runtime::new();
        rt.define("x-broken", || Broken).unwrap();
        let host = rt.mount_markup(rt.root(), "<x-broken></x-broken>").unwrap()[0];
        rt.update(host, |cx| cx.set("bad", true)).unwrap();
        assert_eq!(rt.inner_html(host), "<div>fine</div>");
        assert!(matches!(
            rt.drain_render_failures()[0].error,
            RenderError::Markup(_)
        ));
    }

    #[test]
    fn writes_after_disconnect_are_silent() {
        let (mut rt, host) = counter();
        rt.update(host, |cx| cx.set("count", 1_u32)).unwrap();
        assert_eq!(rt.inner_html(host), "<span>1</span>");

        rt.detach(host).unwrap();
        assert!(!rt.is_mounted(host));
        let epoch = rt.document().epoch();
        let renders = rt.render_count(host);
        assert_eq!(rt.update(host, |cx| cx.set("count", 99_u32)), Some(()));
        rt.flush();
        assert_eq!(rt.document().epoch(), epoch);
        assert_eq!(rt.render_count(host), renders);
        assert_eq!(rt.listener_count(host), 0);

        rt.remove(host).unwrap();
        assert_eq!(rt.update(host, |cx| cx.set("count", 100_u32)), None);
        assert_eq!(rt.document().epoch(), epoch + 1);
    }

    #[test]
    fn disconnect_cancels_a_pending_render() {
        let mut rt = Runtime::with_config(RuntimeConfig {
            auto_flush: false,
            ..RuntimeConfig::default()
        });
        rt.define("x-counter", || Counter).unwrap();
        let host = rt.mount_markup(rt.root(), "<x-counter></x-counter>").unwrap()[0];
        rt.update(host, |cx| cx.set("count", 3_u32)).unwrap();
        rt.detach(host).unwrap();
        rt.flush();
        assert_eq!(rt.render_count(host), Some(1));
        assert_eq!(rt.inner_html(host), "<span>0</span>");

        // Reconnecting renders the buffered state once.
        rt.append_child(rt.root(), host).unwrap();
        rt.flush();
        assert_eq!(rt.inner_html(host), "<span>3</span>");
        assert_eq!(rt.render_count(host), Some(2));
        assert_eq!(rt.listener_count(host), 1);
    }

    struct Preloaded;

    impl Component for Preloaded {
        fn render(&self, state: &StateStore) -> Result<String, RenderError> {
            Ok(format!(
                "<h1>{}</h1>",
                state.get::<&str>("title").copied().unwrap_or("?")
            ))
        }

        fn created(&mut self, cx: &mut Cx<'_>) {
            assert!(!cx.is_mounted());
            cx.set("title", "Admissions");
        }
    }

    #[test]
    fn writes_before_mount_show_in_first_render() {
        let mut rt = Runtime::new();
        rt.define("x-preloaded", || Preloaded).unwrap();
        let host = rt.create_element("x-preloaded").unwrap();
        assert_eq!(rt.render_count(host), Some(0));
        assert_eq!(rt.inner_html(host), "");
        rt.append_child(rt.root(), host).unwrap();
        assert_eq!(rt.inner_html(host), "<h1>Admissions</h1>");
        assert_eq!(rt.render_count(host), Some(1));
    }

    /// A table page: one host listener, actions found by delegation.
    struct Table {
        removed: Rc<RefCell<Vec<String>>>,
    }

    impl Component for Table {
        fn render(&self, state: &StateStore) -> Result<String, RenderError> {
            let rows = state.get::<Vec<String>>("rows").cloned().unwrap_or_default();
            let mut out = String::from("<table>");
            for id in rows {
                out.push_str(&format!(
                    r#"<tr data-id="{id}"><td>{id}</td><td><button data-action="delete"><i>x</i></button></td></tr>"#
                ));
            }
            out.push_str("</table>");
            Ok(out)
        }

        fn created(&mut self, cx: &mut Cx<'_>) {
            cx.set("rows", vec!["a".to_string(), "b".to_string(), "c".to_string()]);
        }

        fn connected(&mut self, cx: &mut Cx<'_>) {
            let removed = self.removed.clone();
            cx.listen(EventName::Click, move |cx, event| {
                let Some(button) = cx.delegate(event, "button[data-action=delete]") else {
                    return;
                };
                let Some(row) = cx.closest(button, "tr[data-id]") else {
                    return;
                };
                let Some(id) = cx.document().attribute(row, "data-id").map(str::to_string) else {
                    return;
                };
                removed.borrow_mut().push(id.clone());
                cx.update::<Vec<String>>("rows", |rows| rows.retain(|r| *r != id));
                cx.emit(EventName::TableDelete, id);
            });
        }
    }

    #[test]
    fn delegated_actions_across_rerenders() {
        let removed = Rc::new(RefCell::new(Vec::new()));
        let mut rt = Runtime::new();
        let r = removed.clone();
        rt.define("x-table", move || Table { removed: r.clone() }).unwrap();
        let page = rt.mount_markup(rt.root(), "<main><x-table></x-table></main>").unwrap()[0];
        let table = rt.document().children(page)[0];

        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        rt.add_event_listener(page, EventName::TableDelete, ListenerOptions::default(), move |_, e| {
            s.borrow_mut().push(e.detail::<String>().cloned().unwrap_or_default());
        })
        .unwrap();

        let icon = |rt: &Runtime| {
            let doc = rt.document();
            let sel = sprig_dom::SelectorList::parse("i").unwrap();
            doc.query_selector(table, &sel).unwrap()
        };

        let first = icon(&rt);
        rt.click(first).unwrap();
        let next = icon(&rt);
        assert!(!rt.document().is_alive(first));
        rt.click(next).unwrap();

        // Clicking outside any action does nothing.
        let cell = rt
            .document()
            .query_selector(table, &sprig_dom::SelectorList::parse("td").unwrap())
            .unwrap();
        rt.click(cell).unwrap();

        assert_eq!(*removed.borrow(), ["a", "b"]);
        assert_eq!(*seen.borrow(), ["a", "b"]);
        assert_eq!(rt.listener_count(table), 1);
        assert!(rt.inner_html(table).contains(r#"data-id="c""#));
        assert!(!rt.inner_html(table).contains(r#"data-id="a""#));
    }

    #[test]
    fn descendant_listeners_die_with_their_nodes() {
        let (mut rt, host) = counter();
        let span = rt.document().children(host)[0];
        rt.add_event_listener(span, "click", ListenerOptions::default(), |_, _| {})
            .unwrap();
        assert_eq!(rt.listener_count(span), 1);
        rt.click(span).unwrap();
        assert!(!rt.document().is_alive(span));
        assert_eq!(rt.listener_count(span), 0);
    }

    struct Poller {
        ticks: Rc<Cell<u32>>,
    }

    impl Component for Poller {
        fn render(&self, state: &StateStore) -> Result<String, RenderError> {
            Ok(format!("{}", state.get::<u32>("t").copied().unwrap_or(0)))
        }

        fn connected(&mut self, cx: &mut Cx<'_>) {
            let ticks = self.ticks.clone();
            cx.set_timeout(Duration::from_millis(100), move |cx| {
                ticks.set(ticks.get() + 1);
                cx.set("t", ticks.get());
            });
        }
    }

    #[test]
    fn timers_fire_and_are_cleared_on_disconnect() {
        let ticks = Rc::new(Cell::new(0));
        let mut rt = Runtime::new();
        let t = ticks.clone();
        rt.define("x-poller", move || Poller { ticks: t.clone() }).unwrap();
        let host = rt.mount_markup(rt.root(), "<x-poller></x-poller>").unwrap()[0];

        rt.advance_time(Duration::from_millis(99));
        assert_eq!(ticks.get(), 0);
        rt.advance_time(Duration::from_millis(1));
        assert_eq!(ticks.get(), 1);
        assert_eq!(rt.inner_html(host), "1");
        assert_eq!(rt.now(), Duration::from_millis(100));

        rt.update(host, |cx| {
            cx.set_timeout(Duration::from_millis(10), |cx| cx.set("t", 50_u32));
        });
        rt.detach(host).unwrap();
        rt.advance_time(Duration::from_secs(1));
        assert_eq!(rt.state(host).unwrap().get::<u32>("t"), Some(&1));
    }

    fn rearm(cx: &mut Cx<'_>, delay: Duration, fired: Rc<Cell<u32>>) {
        cx.set_timeout(delay, move |cx| {
            fired.set(fired.get() + 1);
            rearm(cx, delay, fired);
        });
    }

    #[test]
    fn self_rearming_zero_delay_timer_yields_each_advance() {
        let (mut rt, host) = counter();
        let fired = Rc::new(Cell::new(0));
        let f = fired.clone();
        rt.update(host, move |cx| rearm(cx, Duration::ZERO, f));

        rt.advance_time(Duration::from_millis(1));
        assert_eq!(fired.get(), 1);
        rt.advance_time(Duration::ZERO);
        assert_eq!(fired.get(), 2);
        assert_eq!(rt.now(), Duration::from_millis(1));
    }

    #[test]
    fn positive_delay_chain_runs_within_one_advance() {
        let (mut rt, host) = counter();
        let fired = Rc::new(Cell::new(0));
        let f = fired.clone();
        rt.update(host, move |cx| rearm(cx, Duration::from_millis(1), f));

        rt.advance_time(Duration::from_millis(10));
        assert_eq!(fired.get(), 10);
        assert_eq!(rt.now(), Duration::from_millis(10));
    }

    #[test]
    fn timers_armed_on_detached_hosts_never_fire() {
        let (mut rt, host) = counter();
        rt.detach(host).unwrap();
        let fired = Rc::new(Cell::new(false));
        let f = fired.clone();
        rt.update(host, move |cx| {
            cx.set_timeout(Duration::from_millis(10), move |_| f.set(true));
        })
        .unwrap();

        rt.advance_time(Duration::from_secs(1));
        assert!(!fired.get());
        let root = rt.root();
        rt.append_child(root, host).unwrap();
        rt.advance_time(Duration::from_secs(1));
        assert!(!fired.get());
    }

    #[test]
    fn typed_keys_and_in_place_updates() {
        const ROWS: StateKey<Vec<u32>> = StateKey::new("rows");
        let (mut rt, host) = counter();
        rt.update(host, |cx| {
            cx.put(ROWS, vec![1, 2]);
            cx.update::<Vec<u32>>(ROWS.name(), |rows| rows.push(3));
            assert_eq!(cx.read(ROWS), Some(&vec![1, 2, 3]));
            // A different stored type is replaced by the default first.
            cx.set("count", "not a number");
            cx.update::<u32>("count", |n| *n += 2);
            assert_eq!(cx.get::<u32>("count"), Some(&2));
        })
        .unwrap();
        assert_eq!(rt.inner_html(host), "<span>2</span>");
    }

    #[derive(Debug, Default, PartialEq, serde::Deserialize)]
    struct ChartSettings {
        title: String,
        stacked: bool,
    }

    #[test]
    fn json_attributes_decode_and_degrade() {
        let (mut rt, host) = counter();
        let encoded = crate::attr::escape_json_for_attribute(&serde_json::json!({
            "title": "Fees \"2025\"",
            "stacked": true,
        }))
        .unwrap();
        rt.set_attribute(host, "settings", &encoded).unwrap();
        rt.set_attribute(host, "broken", "{nope").unwrap();
        rt.update(host, |cx| {
            let settings: ChartSettings = cx.json_attribute("settings").unwrap().unwrap();
            assert_eq!(settings.title, "Fees \"2025\"");
            assert!(settings.stacked);
            assert!(cx.json_attribute::<ChartSettings>("missing").unwrap().is_none());
            assert!(cx.json_attribute::<ChartSettings>("broken").is_err());
            assert_eq!(
                cx.json_attribute_or_default::<ChartSettings>("broken"),
                ChartSettings::default()
            );
        })
        .unwrap();
    }

    #[test]
    fn session_is_injected() {
        let session = Rc::new(MemorySession::new());
        let mut rt = Runtime::new().with_session(session.clone());
        rt.define("x-counter", || Counter).unwrap();
        let host = rt.mount_markup(rt.root(), "<x-counter></x-counter>").unwrap()[0];
        assert_eq!(rt.update(host, |cx| cx.session().token()), Some(None));
        session.sign_in(
            Token::new("t0k"),
            Profile {
                id: "1".into(),
                name: "Ada".into(),
                role: None,
            },
        );
        let bearer = rt.update(host, |cx| cx.session().token().map(|t| t.bearer()));
        assert_eq!(bearer, Some(Some("Bearer t0k".to_string())));
    }

    #[test]
    fn request_guard_marks_stale_responses() {
        let (mut rt, host) = counter();
        let first = rt.update(host, |cx| cx.begin_request("load")).flatten().unwrap();
        let second = rt.update(host, |cx| cx.begin_request("load")).flatten().unwrap();
        // The slow first response arrives last and is discarded by the component.
        rt.update(host, |cx| {
            if cx.is_latest(&second) {
                cx.set("count", 2_u32);
            }
        });
        rt.update(host, |cx| {
            if cx.is_latest(&first) {
                cx.set("count", 1_u32);
            }
        });
        assert_eq!(rt.inner_html(host), "<span>2</span>");
    }

    #[test]
    fn entry_points_reject_stale_nodes() {
        let (mut rt, host) = counter();
        rt.remove(host).unwrap();
        assert!(rt.click(host).is_err());
        assert!(rt.set_attribute(host, "a", "b").is_err());
        assert!(rt.detach(host).is_err());
        assert!(rt.append_child(rt.root(), host).is_err());
        assert!(rt.define("bad", || Counter).is_err());
    }
}
