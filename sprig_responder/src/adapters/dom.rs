// Copyright 2025 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Adapter helpers for Sprig DOM.
//!
//! ## Feature
//!
//! Enable with `dom_adapter`.
//!
//! ## Notes
//!
//! These helpers route over a [`Document`]'s parent links. Routing stops at the
//! root of whatever subtree the target lives in, so detached subtrees route too.

use alloc::vec::Vec;

use sprig_dom::{Document, NodeId, SelectorList};

use crate::dispatch::closest_within;
use crate::router::Router;
use crate::types::{Dispatch, ParentLookup, RouteOptions};

/// [`ParentLookup`] over a document's parent links.
#[derive(Copy, Clone, Debug)]
pub struct DocumentParents<'a>(pub &'a Document);

impl ParentLookup<NodeId> for DocumentParents<'_> {
    fn parent_of(&self, node: &NodeId) -> Option<NodeId> {
        self.0.parent(*node)
    }
}

/// Build the capture → target → bubble sequence for an event aimed at `target`.
///
/// Returns an empty sequence for stale ids.
pub fn route_in_document(
    doc: &Document,
    target: NodeId,
    options: RouteOptions,
) -> Vec<Dispatch<NodeId>> {
    if !doc.is_alive(target) {
        return Vec::new();
    }
    Router::with_parent(DocumentParents(doc)).route(target, options)
}

/// The innermost element between `target` and `boundary` (inclusive) matching `selector`.
///
/// This is `closest(selector)` limited to one component host.
pub fn closest_matching(
    doc: &Document,
    target: NodeId,
    boundary: NodeId,
    selector: &SelectorList,
) -> Option<NodeId> {
    if !doc.is_alive(target) {
        return None;
    }
    closest_within(target, boundary, &DocumentParents(doc), |n| {
        doc.matches(*n, selector)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Phase;

    #[test]
    fn routes_through_document_ancestry() {
        let mut doc = Document::new();
        let host = doc.create_element("app-page");
        doc.append_child(doc.root(), host).unwrap();
        let change = doc
            .set_inner_html(host, "<button data-action=\"save\">ok</button>")
            .unwrap();
        let button = change.inserted[0];
        let out = route_in_document(&doc, button, RouteOptions::default());
        let root = doc.root();
        assert_eq!(
            out,
            alloc::vec![
                Dispatch { phase: Phase::Capture, node: root },
                Dispatch { phase: Phase::Capture, node: host },
                Dispatch { phase: Phase::Target, node: button },
                Dispatch { phase: Phase::Bubble, node: host },
                Dispatch { phase: Phase::Bubble, node: root },
            ]
        );
    }

    #[test]
    fn closest_matching_stops_at_host() {
        let mut doc = Document::new();
        let outer = doc.create_element("div");
        doc.set_attribute(outer, "data-action", "outer");
        let host = doc.create_element("app-row");
        doc.append_child(outer, host).unwrap();
        let change = doc
            .set_inner_html(host, "<button data-action=\"delete\"><i>x</i></button><span>y</span>")
            .unwrap();
        let icon = change.inserted[1];
        let span = change.inserted[3];
        let actions = SelectorList::parse("[data-action]").unwrap();
        let button = closest_matching(&doc, icon, host, &actions).unwrap();
        assert_eq!(doc.attribute(button, "data-action"), Some("delete"));
        // The outer match lies beyond the host.
        assert_eq!(closest_matching(&doc, span, host, &actions), None);
        assert!(route_in_document(&doc, span, RouteOptions::default()).len() > 1);
    }
}
