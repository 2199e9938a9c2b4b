// Copyright 2025 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Writing rendered markup into a host.
//!
//! A commit is a full replacement of the host's children. The host node is
//! kept, so its attributes and the listeners registered on it stay in place.
//! Everything below it is freed and rebuilt from the markup.
//!
//! A render that returns `Err`, panics, or produces markup that does not parse
//! leaves the previous content untouched. The failure is logged and recorded as
//! a [`RenderFailure`]; the instance stays dirty so the next write retries.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use sprig_dom::{DomError, NodeId};
use tracing::{debug, error};

use crate::component::Component;
use crate::error::RenderError;
use crate::runtime::Runtime;
use crate::state::StateStore;

/// A render pass that did not commit.
#[derive(Debug)]
pub struct RenderFailure {
    /// Host element.
    pub host: NodeId,
    /// Host tag name.
    pub tag: String,
    /// What went wrong.
    pub error: RenderError,
}

/// Call `render`, turning a panic into [`RenderError::Panicked`] when `catch_panics` is set.
pub(crate) fn render_markup(
    component: &dyn Component,
    state: &StateStore,
    catch_panics: bool,
) -> Result<String, RenderError> {
    if !catch_panics {
        return component.render(state);
    }
    panic::catch_unwind(AssertUnwindSafe(|| component.render(state)))
        .unwrap_or_else(|payload| Err(RenderError::Panicked(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl Runtime {
    /// Render `host` and replace its content.
    ///
    /// Does nothing if the host has no instance or its component is busy.
    pub(crate) fn commit(&mut self, host: NodeId) {
        let catch_panics = self.config.catch_panics;
        let Some(inst) = self.instances.get_mut(&host) else {
            return;
        };
        let Some(component) = inst.component.as_deref() else {
            return;
        };
        inst.render.count += 1;
        let pass = inst.render.count;
        let outcome = render_markup(component, &inst.state, catch_panics).and_then(|markup| {
            self.doc.set_inner_html(host, &markup).map_err(|e| match e {
                DomError::Markup(m) => RenderError::Markup(m),
                other => RenderError::msg(other.to_string()),
            })
        });
        let Some(inst) = self.instances.get_mut(&host) else {
            return;
        };
        match outcome {
            Ok(change) => {
                inst.render.dirty = false;
                inst.render.rendered = true;
                debug!(
                    %host,
                    tag = %inst.tag,
                    pass,
                    inserted = change.inserted.len(),
                    freed = change.freed.len(),
                    "committed"
                );
                self.apply_change(change);
            }
            Err(error) => {
                error!(%host, tag = %inst.tag, pass, %error, "render failed; previous content kept");
                self.failures.push(RenderFailure {
                    host,
                    tag: inst.tag.clone(),
                    error,
                });
            }
        }
    }
}
