// Copyright 2025 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One live component: the user object plus everything the runtime tracks for it.

use std::collections::HashMap;
use std::fmt;

use crate::component::Component;
use crate::scheduler::RenderState;
use crate::state::StateStore;

pub(crate) struct Instance {
    pub(crate) tag: String,
    /// `None` while one of its hooks is running.
    pub(crate) component: Option<Box<dyn Component>>,
    pub(crate) observed: &'static [&'static str],
    pub(crate) state: StateStore,
    pub(crate) render: RenderState,
    /// Latest request sequence per channel.
    pub(crate) requests: HashMap<String, u64>,
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("tag", &self.tag)
            .field("busy", &self.component.is_none())
            .field("observed", &self.observed)
            .field("state", &self.state)
            .field("render", &self.render)
            .field("requests", &self.requests)
            .finish()
    }
}

impl Instance {
    pub(crate) fn new(tag: &str, component: Box<dyn Component>) -> Self {
        Self {
            tag: tag.to_string(),
            observed: component.observed_attributes(),
            component: Some(component),
            state: StateStore::new(),
            render: RenderState::default(),
            requests: HashMap::new(),
        }
    }

    pub(crate) fn observes(&self, name: &str) -> bool {
        self.observed.iter().any(|o| o.eq_ignore_ascii_case(name))
    }
}

/// Tag for an asynchronous request issued by a component.
///
/// Obtained from [`Cx::begin_request`](crate::Cx::begin_request). When the
/// response arrives, [`Cx::is_latest`](crate::Cx::is_latest) tells whether a
/// newer request on the same channel was issued in the meantime.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RequestTag {
    pub(crate) channel: String,
    pub(crate) seq: u64,
}

impl RequestTag {
    /// Channel name.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Sequence number within the channel, starting at 1.
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl Instance {
    pub(crate) fn begin_request(&mut self, channel: &str) -> RequestTag {
        let seq = self.requests.entry(channel.to_string()).or_insert(0);
        *seq += 1;
        RequestTag {
            channel: channel.to_string(),
            seq: *seq,
        }
    }

    pub(crate) fn is_latest(&self, tag: &RequestTag) -> bool {
        self.requests.get(&tag.channel) == Some(&tag.seq)
    }
}
