// Copyright 2025 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Events and listener options.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use sprig_dom::NodeId;
use sprig_responder::types::Phase;

use crate::catalog::EventName;

/// An event travelling through the document.
///
/// Built by the caller, then routed by
/// [`Runtime::dispatch_event`](crate::Runtime::dispatch_event) or
/// [`Cx::emit`](crate::Cx::emit). Routing fills in the target, the current
/// target, and the phase.
pub struct Event {
    name: String,
    pub(crate) target: Option<NodeId>,
    pub(crate) current_target: Option<NodeId>,
    pub(crate) phase: Phase,
    bubbles: bool,
    composed: bool,
    detail: Option<Rc<dyn Any>>,
    default_prevented: bool,
    pub(crate) propagation_stopped: bool,
    pub(crate) immediate_stopped: bool,
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("name", &self.name)
            .field("target", &self.target)
            .field("current_target", &self.current_target)
            .field("phase", &self.phase)
            .field("bubbles", &self.bubbles)
            .field("composed", &self.composed)
            .field("detail", &self.detail.is_some())
            .field("default_prevented", &self.default_prevented)
            .field("propagation_stopped", &self.propagation_stopped)
            .field("immediate_stopped", &self.immediate_stopped)
            .finish()
    }
}

impl Event {
    /// A non-bubbling event with no detail.
    pub fn new(name: impl Into<EventName>) -> Self {
        let name: EventName = name.into();
        Self {
            name: name.to_string(),
            target: None,
            current_target: None,
            phase: Phase::Target,
            bubbles: false,
            composed: false,
            detail: None,
            default_prevented: false,
            propagation_stopped: false,
            immediate_stopped: false,
        }
    }

    /// A bubbling, composed event carrying `detail`.
    ///
    /// This is the shape components use to talk to their ancestors.
    pub fn custom<T: Any>(name: impl Into<EventName>, detail: T) -> Self {
        Self::new(name)
            .with_bubbles(true)
            .with_composed(true)
            .with_detail(detail)
    }

    /// Set whether the event bubbles.
    #[must_use]
    pub fn with_bubbles(mut self, bubbles: bool) -> Self {
        self.bubbles = bubbles;
        self
    }

    /// Set the composed flag.
    ///
    /// There are no shadow roots here, so this is informational.
    #[must_use]
    pub fn with_composed(mut self, composed: bool) -> Self {
        self.composed = composed;
        self
    }

    /// Attach a payload.
    #[must_use]
    pub fn with_detail<T: Any>(mut self, detail: T) -> Self {
        self.detail = Some(Rc::new(detail));
        self
    }

    /// Wire name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name classified into the catalog.
    pub fn kind(&self) -> EventName {
        EventName::parse(&self.name)
    }

    /// Node the event was dispatched at. `None` before dispatch.
    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    /// Node whose listeners are running. `None` outside dispatch.
    pub fn current_target(&self) -> Option<NodeId> {
        self.current_target
    }

    /// Current propagation phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the event bubbles.
    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    /// Whether the event was marked composed.
    pub fn composed(&self) -> bool {
        self.composed
    }

    /// The payload, if present and of type `T`.
    pub fn detail<T: Any>(&self) -> Option<&T> {
        self.detail.as_deref()?.downcast_ref::<T>()
    }

    /// Stop after the listeners of the current node.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Stop before the next listener, even on the current node.
    pub fn stop_immediate_propagation(&mut self) {
        self.propagation_stopped = true;
        self.immediate_stopped = true;
    }

    /// Mark the default action as cancelled.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Whether [`prevent_default`](Self::prevent_default) was called.
    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Whether propagation was stopped.
    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

/// Options for a listener registration.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    /// Run during the capture phase instead of the bubble phase.
    pub capture: bool,
    /// Remove the listener before its first invocation.
    pub once: bool,
}

impl ListenerOptions {
    /// Capture-phase listener.
    pub const CAPTURE: Self = Self {
        capture: true,
        once: false,
    };

    /// One-shot bubble-phase listener.
    pub const ONCE: Self = Self {
        capture: false,
        once: true,
    };
}

/// Handle of a registered listener.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) u64);
