// Copyright 2025 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render scheduling: dirty tracking, coalescing, and the microtask checkpoint.
//!
//! ## Model
//!
//! Each instance carries a [`RenderState`]. A state write marks it dirty. If the
//! instance is mounted and has no render pending, exactly one render task is
//! pushed onto a FIFO queue; further writes before that task runs only update
//! state. Writes on an unmounted instance are buffered: the instance stays
//! dirty and the render happens on connect.
//!
//! The queue is drained by the checkpoint, which runs when the outermost
//! runtime entry point returns (or on [`Runtime::flush`]). Tasks queued while
//! draining run in the same checkpoint, up to
//! [`RuntimeConfig::max_flush_passes`](crate::RuntimeConfig::max_flush_passes).
//!
//! A task is a no-op when its instance is gone, unmounted, or no longer
//! pending. Disconnect clears the pending flag, which is how a queued render
//! gets cancelled without searching the queue.

use std::collections::VecDeque;

use sprig_dom::NodeId;
use tracing::{error, trace, warn};

use crate::runtime::Runtime;

/// Per-instance render bookkeeping.
#[derive(Clone, Debug, Default)]
pub(crate) struct RenderState {
    /// Between connect and disconnect.
    pub(crate) mounted: bool,
    /// Written since the last successful commit.
    pub(crate) dirty: bool,
    /// A task for this instance is queued.
    pub(crate) pending: bool,
    /// At least one commit succeeded.
    pub(crate) rendered: bool,
    /// Calls to `render`, successful or not.
    pub(crate) count: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Scheduler {
    queue: VecDeque<NodeId>,
    flushing: bool,
}

impl Scheduler {
    pub(crate) fn len(&self) -> usize {
        self.queue.len()
    }
}

impl Runtime {
    /// Mark `host` dirty and queue a render if it is mounted and none is pending.
    pub(crate) fn request_render(&mut self, host: NodeId) {
        let Some(inst) = self.instances.get_mut(&host) else {
            return;
        };
        inst.render.dirty = true;
        if !inst.render.mounted {
            trace!(%host, "render buffered until connect");
            return;
        }
        if inst.render.pending {
            trace!(%host, "render coalesced");
            return;
        }
        inst.render.pending = true;
        self.scheduler.queue.push_back(host);
        trace!(%host, queued = self.scheduler.queue.len(), "render scheduled");
    }

    /// Drain the render queue.
    pub(crate) fn checkpoint(&mut self) {
        if self.scheduler.flushing {
            return;
        }
        self.scheduler.flushing = true;
        let mut passes = 0_usize;
        let mut deferred = Vec::new();
        while let Some(host) = self.scheduler.queue.pop_front() {
            if passes >= self.config.max_flush_passes {
                self.scheduler.queue.push_front(host);
                error!(
                    limit = self.config.max_flush_passes,
                    remaining = self.scheduler.queue.len(),
                    "render queue did not settle; leaving the rest for the next checkpoint"
                );
                break;
            }
            passes += 1;
            let Some(inst) = self.instances.get_mut(&host) else {
                continue;
            };
            if !inst.render.pending || !inst.render.mounted {
                trace!(%host, "render task cancelled");
                continue;
            }
            if inst.component.is_none() {
                warn!(%host, "component busy in a hook; render deferred");
                deferred.push(host);
                continue;
            }
            inst.render.pending = false;
            self.commit(host);
        }
        self.scheduler.queue.extend(deferred);
        self.scheduler.flushing = false;
    }
}

#[cfg(test)]
mod tests {
    use crate::{Component, RenderError, Runtime, RuntimeConfig, StateStore};

    struct Echo;

    impl Component for Echo {
        fn render(&self, state: &StateStore) -> Result<String, RenderError> {
            Ok(format!("<b>{}</b>", state.get::<u32>("n").copied().unwrap_or(0)))
        }
    }

    #[test]
    fn unmounted_writes_are_buffered() {
        let mut rt = Runtime::new();
        rt.define("x-echo", || Echo).unwrap();
        let host = rt.create_element("x-echo").unwrap();
        rt.update(host, |cx| cx.set("n", 3_u32)).unwrap();
        assert_eq!(rt.scheduler.len(), 0);
        assert_eq!(rt.render_count(host), Some(0));
        rt.append_child(rt.root(), host).unwrap();
        assert_eq!(rt.inner_html(host), "<b>3</b>");
        assert_eq!(rt.render_count(host), Some(1));
    }

    #[test]
    fn overrun_keeps_remaining_tasks() {
        let mut rt = Runtime::with_config(RuntimeConfig {
            auto_flush: false,
            max_flush_passes: 1,
            ..RuntimeConfig::default()
        });
        rt.define("x-echo", || Echo).unwrap();
        let hosts = rt
            .mount_markup(rt.root(), "<x-echo></x-echo><x-echo></x-echo>")
            .unwrap();
        for &h in &hosts {
            rt.update(h, |cx| cx.set("n", 1_u32)).unwrap();
        }
        assert_eq!(rt.scheduler.len(), 2);
        rt.flush();
        assert_eq!(rt.scheduler.len(), 1);
        assert_eq!(rt.inner_html(hosts[0]), "<b>1</b>");
        assert_eq!(rt.inner_html(hosts[1]), "<b>0</b>");
        rt.flush();
        assert_eq!(rt.inner_html(hosts[1]), "<b>1</b>");
    }
}
