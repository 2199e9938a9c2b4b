// Copyright 2025 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sprig Runtime: a small reactive component runtime over custom elements.
//!
//! A component is a type implementing [`Component`]: a `render` function from
//! its [`StateStore`] to a markup string, plus optional lifecycle hooks. The
//! [`Runtime`] owns the document, upgrades elements whose tag has been
//! [defined](Runtime::define), and keeps their content in sync with their state.
//!
//! - State writes through [`Cx::set`] mark the instance dirty and schedule one render; later writes coalesce.
//! - Reads through [`Cx::get`] always see the latest write, even before the render commits.
//! - A commit replaces the host's children wholesale. The host node, its attributes, and its listeners survive.
//! - Render failures (errors, panics, malformed markup) leave the previous content in place and are recorded.
//! - Disconnecting a host cancels its pending render and releases its listeners and timers.
//!
//! ## Where this fits
//!
//! - Host tree: structure, attributes, markup (`sprig_dom`).
//! - Responder: capture → target → bubble routing (`sprig_responder`).
//! - Runtime: component state, render scheduling, lifecycle, events (this crate).
//!
//! ## Scheduling
//!
//! Renders run at a checkpoint, not at the write. The checkpoint runs when the
//! outermost runtime entry point returns: [`Runtime::dispatch_event`],
//! [`Runtime::update`], [`Runtime::advance_time`], tree mutations, and
//! [`Runtime::define`]. With [`RuntimeConfig::auto_flush`] off, call
//! [`Runtime::flush`] yourself. The first render on connect is synchronous.
//!
//! ## Event delegation
//!
//! Listeners belong on the host, registered once in [`Component::connected`]
//! through [`Cx::listen`]. Descendants are recreated by every commit, so
//! handlers find the element that was interacted with by walking up from the
//! event target with [`Cx::delegate`]:
//!
//! ```
//! use sprig_runtime::{Component, Cx, EventName, RenderError, Runtime, StateStore};
//!
//! struct Counter;
//!
//! impl Component for Counter {
//!     fn render(&self, state: &StateStore) -> Result<String, RenderError> {
//!         let count = state.get::<u32>("count").copied().unwrap_or(0);
//!         Ok(format!(
//!             r#"<span>{count}</span><button data-action="inc">+</button><button data-action="reset">0</button>"#
//!         ))
//!     }
//!
//!     fn connected(&mut self, cx: &mut Cx<'_>) {
//!         cx.listen(EventName::Click, |cx, event| {
//!             let Some(button) = cx.delegate(event, "[data-action]") else {
//!                 return;
//!             };
//!             let action = cx.document().attribute(button, "data-action").map(str::to_string);
//!             match action.as_deref() {
//!                 Some("inc") => cx.update::<u32>("count", |n| *n += 1),
//!                 Some("reset") => cx.set("count", 0_u32),
//!                 _ => {}
//!             }
//!         });
//!     }
//! }
//!
//! let mut rt = Runtime::new();
//! rt.define("app-counter", || Counter).unwrap();
//! let host = rt.mount_markup(rt.root(), "<app-counter></app-counter>").unwrap()[0];
//!
//! for _ in 0..3 {
//!     // The button is a fresh node after every render.
//!     let inc = rt.document().children(host)[1];
//!     rt.click(inc).unwrap();
//! }
//! assert!(rt.inner_html(host).starts_with("<span>3</span>"));
//! assert_eq!(rt.render_count(host), Some(4));
//! assert_eq!(rt.listener_count(host), 1);
//! ```
//!
//! ## Logging
//!
//! The runtime emits [`tracing`] events: `trace` for scheduling, `debug` for
//! commits and lifecycle transitions, `warn` for tolerated misuse, and `error`
//! for render failures. It never installs a subscriber.

pub mod attr;
mod catalog;
mod commit;
mod component;
mod config;
mod dispatch;
mod error;
mod event;
mod instance;
mod lifecycle;
mod runtime;
mod scheduler;
mod session;
mod state;
mod timer;

pub use catalog::EventName;
pub use commit::RenderFailure;
pub use component::{Component, Registry, is_valid_custom_element_name};
pub use config::RuntimeConfig;
pub use error::{AttributeError, DefineError, RenderError, RuntimeError};
pub use event::{Event, ListenerId, ListenerOptions};
pub use instance::RequestTag;
pub use runtime::{Cx, Runtime};
pub use session::{MemorySession, NoSession, Profile, SessionProvider, Token};
pub use state::{StateKey, StateStore};
pub use timer::TimerId;

pub use sprig_responder::types::Phase;
