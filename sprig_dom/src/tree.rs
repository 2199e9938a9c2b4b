// Copyright 2025 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core document implementation: structure, content replacement, attributes, queries.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::escape::{escape_attribute, escape_text};
use crate::markup::{Fragment, is_void_element, parse_fragment};
use crate::selector::SelectorList;
use crate::types::{
    Attribute, AttributeChange, DomError, ElementData, NodeData, NodeFlags, NodeId, TreeChange,
};

// Serialized without escaping their text content.
const RAW_SERIALIZED: &[&str] = &["script", "style"];

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// A document: a generational arena of nodes under a single connected root.
pub struct Document {
    nodes: Vec<Option<Node>>, // slots
    generations: Vec<u32>,    // last generation per slot (persists across frees)
    free_list: Vec<usize>,
    epoch: u64,
    root: NodeId,
}

impl core::fmt::Debug for Document {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        let free = self.free_list.len();
        f.debug_struct("Document")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &free)
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug)]
struct Node {
    generation: u32,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
    flags: NodeFlags,
}

impl Document {
    /// Create a document holding only its root.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            epoch: 0,
            root: NodeId::new(0, 0),
        };
        doc.root = doc.alloc(NodeData::Document, NodeFlags::CONNECTED);
        doc
    }

    /// The document root. Always alive and connected.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Mutation counter, bumped by every structural or attribute change.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    fn alloc(&mut self, data: NodeData, flags: NodeFlags) -> NodeId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            (idx, generation)
        } else {
            self.generations.push(1);
            self.nodes.push(None);
            (self.nodes.len() - 1, 1_u32)
        };
        self.nodes[idx] = Some(Node {
            generation,
            parent: None,
            children: Vec::new(),
            data,
            flags,
        });
        #[allow(
            clippy::cast_possible_truncation,
            reason = "NodeId slots are 32-bit."
        )]
        let slot = idx as u32;
        NodeId::new(slot, generation)
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes
            .get(id.idx())
            .and_then(Option::as_ref)
            .filter(|n| n.generation == id.1)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes
            .get_mut(id.idx())
            .and_then(Option::as_mut)
            .filter(|n| n.generation == id.1)
    }

    /// Returns true if `id` refers to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Returns true if `id` is alive and reachable from the root.
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.flags(id).contains(NodeFlags::CONNECTED)
    }

    /// Flags of a node; empty for stale ids.
    pub fn flags(&self, id: NodeId) -> NodeFlags {
        self.node(id).map_or(NodeFlags::empty(), |n| n.flags)
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(
            NodeData::Element(ElementData {
                tag: tag.to_ascii_lowercase(),
                attributes: Vec::new(),
            }),
            NodeFlags::ELEMENT,
        )
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeData::Text(text.to_string()), NodeFlags::empty())
    }

    /// Node payload.
    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.node(id).map(|n| &n.data)
    }

    /// Element payload, `None` for text, the root, or stale ids.
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.data(id)? {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Tag name of an element.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.tag.as_str())
    }

    /// Parent of a node, `None` for roots of detached subtrees and the document root.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    /// Children in order; empty for stale ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Iterate `id` and its ancestors, innermost first.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.is_alive(id).then_some(id),
        }
    }

    /// The subtree rooted at `id` in preorder (including `id`).
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.is_alive(id) {
            return out;
        }
        let mut stack = alloc::vec![id];
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children(n).iter().rev().copied());
        }
        out
    }

    fn is_container(&self, id: NodeId) -> bool {
        matches!(
            self.data(id),
            Some(NodeData::Document | NodeData::Element(_))
        )
    }

    /// Append `child` as the last child of `parent`, moving it if it already has a parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<TreeChange, DomError> {
        if !self.is_alive(parent) {
            return Err(DomError::StaleNode(parent));
        }
        if !self.is_alive(child) {
            return Err(DomError::StaleNode(child));
        }
        if !self.is_container(parent) {
            return Err(DomError::NotAContainer(parent));
        }
        if child == self.root || self.ancestors(parent).any(|a| a == child) {
            return Err(DomError::HierarchyCycle { parent, child });
        }
        let mut change = self.unlink(child);
        self.link(parent, child, &mut change.connected);
        self.epoch += 1;
        Ok(change)
    }

    /// Unlink `id` from its parent, keeping the subtree alive.
    ///
    /// The root and already-detached nodes are left alone.
    pub fn detach(&mut self, id: NodeId) -> TreeChange {
        if id == self.root || self.parent(id).is_none() {
            return TreeChange::default();
        }
        let change = self.unlink(id);
        self.epoch += 1;
        change
    }

    /// Unlink `id` and free its whole subtree.
    pub fn remove(&mut self, id: NodeId) -> TreeChange {
        if id == self.root || !self.is_alive(id) {
            return TreeChange::default();
        }
        let mut change = self.unlink(id);
        self.free_subtree(id, &mut change.freed);
        self.epoch += 1;
        change
    }

    /// Replace the children of `id` with the parsed `markup`.
    ///
    /// Parsing happens before anything is touched: on error the existing
    /// children stay in place. The node itself is never replaced.
    pub fn set_inner_html(&mut self, id: NodeId, markup: &str) -> Result<TreeChange, DomError> {
        self.check_container(id)?;
        let fragments = parse_fragment(markup)?;
        let mut change = TreeChange::default();
        let connected = self.is_connected(id);
        let old = self
            .node_mut(id)
            .map(|n| core::mem::take(&mut n.children))
            .unwrap_or_default();
        for child in old {
            if let Some(n) = self.node_mut(child) {
                n.parent = None;
            }
            if connected {
                change.disconnected.extend(self.subtree(child));
            }
            self.free_subtree(child, &mut change.freed);
        }
        self.build(id, fragments, connected, &mut change);
        self.epoch += 1;
        Ok(change)
    }

    /// Parse `markup` and append the result after the existing children of `parent`.
    pub fn append_markup(&mut self, parent: NodeId, markup: &str) -> Result<TreeChange, DomError> {
        self.check_container(parent)?;
        let fragments = parse_fragment(markup)?;
        let mut change = TreeChange::default();
        let connected = self.is_connected(parent);
        self.build(parent, fragments, connected, &mut change);
        self.epoch += 1;
        Ok(change)
    }

    fn check_container(&self, id: NodeId) -> Result<(), DomError> {
        if !self.is_alive(id) {
            return Err(DomError::StaleNode(id));
        }
        if !self.is_container(id) {
            return Err(DomError::NotAContainer(id));
        }
        Ok(())
    }

    fn build(
        &mut self,
        parent: NodeId,
        fragments: Vec<Fragment>,
        connected: bool,
        change: &mut TreeChange,
    ) {
        let extra = if connected {
            NodeFlags::CONNECTED
        } else {
            NodeFlags::empty()
        };
        for fragment in fragments {
            let (id, children) = match fragment {
                Fragment::Text(text) => (self.alloc(NodeData::Text(text), extra), Vec::new()),
                Fragment::Element {
                    tag,
                    attributes,
                    children,
                } => (
                    self.alloc(
                        NodeData::Element(ElementData { tag, attributes }),
                        NodeFlags::ELEMENT | extra,
                    ),
                    children,
                ),
            };
            if let Some(n) = self.node_mut(id) {
                n.parent = Some(parent);
            }
            if let Some(p) = self.node_mut(parent) {
                p.children.push(id);
            }
            change.inserted.push(id);
            if connected {
                change.connected.push(id);
            }
            self.build(id, children, connected, change);
        }
    }

    fn unlink(&mut self, id: NodeId) -> TreeChange {
        let mut change = TreeChange::default();
        let Some(parent) = self.parent(id) else {
            return change;
        };
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|c| *c != id);
        }
        if let Some(n) = self.node_mut(id) {
            n.parent = None;
        }
        if self.is_connected(id) {
            for n in self.subtree(id) {
                if let Some(node) = self.node_mut(n) {
                    node.flags.remove(NodeFlags::CONNECTED);
                }
                change.disconnected.push(n);
            }
        }
        change
    }

    fn link(&mut self, parent: NodeId, child: NodeId, connected: &mut Vec<NodeId>) {
        if let Some(p) = self.node_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = self.node_mut(child) {
            c.parent = Some(parent);
        }
        if self.is_connected(parent) {
            for n in self.subtree(child) {
                if let Some(node) = self.node_mut(n) {
                    node.flags.insert(NodeFlags::CONNECTED);
                }
                connected.push(n);
            }
        }
    }

    fn free_subtree(&mut self, id: NodeId, freed: &mut Vec<NodeId>) {
        for n in self.subtree(id) {
            self.nodes[n.idx()] = None;
            self.free_list.push(n.idx());
            freed.push(n);
        }
    }

    /// Value of an attribute on an element.
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attribute(name)
    }

    /// All attributes of an element in insertion order.
    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        self.element(id).map_or(&[], |e| e.attributes.as_slice())
    }

    /// Set an attribute. Returns the transition, or `None` when nothing changed
    /// (identical value, non-element, or stale id).
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Option<AttributeChange> {
        let name = name.to_ascii_lowercase();
        let Some(Node {
            data: NodeData::Element(element),
            ..
        }) = self.node_mut(id)
        else {
            return None;
        };
        let old = match element.attributes.iter_mut().find(|a| a.name == name) {
            Some(a) if a.value == value => return None,
            Some(a) => Some(core::mem::replace(&mut a.value, value.to_string())),
            None => {
                element.attributes.push(Attribute {
                    name: name.clone(),
                    value: value.to_string(),
                });
                None
            }
        };
        self.epoch += 1;
        Some(AttributeChange {
            name,
            old,
            new: Some(value.to_string()),
        })
    }

    /// Remove an attribute. Returns the transition, or `None` if it was absent.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<AttributeChange> {
        let name = name.to_ascii_lowercase();
        let Some(Node {
            data: NodeData::Element(element),
            ..
        }) = self.node_mut(id)
        else {
            return None;
        };
        let pos = element.attributes.iter().position(|a| a.name == name)?;
        let removed = element.attributes.remove(pos);
        self.epoch += 1;
        Some(AttributeChange {
            name,
            old: Some(removed.value),
            new: None,
        })
    }

    /// Returns true if `id` is an element matching `selector`.
    pub fn matches(&self, id: NodeId, selector: &SelectorList) -> bool {
        self.element(id).is_some_and(|e| selector.matches(e))
    }

    /// The innermost element among `id` and its ancestors that matches `selector`.
    pub fn closest(&self, id: NodeId, selector: &SelectorList) -> Option<NodeId> {
        self.ancestors(id).find(|&a| self.matches(a, selector))
    }

    /// First descendant of `root` (excluding `root`) matching `selector`, in preorder.
    pub fn query_selector(&self, root: NodeId, selector: &SelectorList) -> Option<NodeId> {
        self.subtree(root)
            .into_iter()
            .skip(1)
            .find(|&n| self.matches(n, selector))
    }

    /// All descendants of `root` (excluding `root`) matching `selector`, in preorder.
    pub fn query_selector_all(&self, root: NodeId, selector: &SelectorList) -> Vec<NodeId> {
        self.subtree(root)
            .into_iter()
            .skip(1)
            .filter(|&n| self.matches(n, selector))
            .collect()
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for n in self.subtree(id) {
            if let Some(NodeData::Text(t)) = self.data(n) {
                out.push_str(t);
            }
        }
        out
    }

    /// Serialize the children of `id`.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        let raw = self.tag(id).is_some_and(|t| RAW_SERIALIZED.contains(&t));
        for &c in self.children(id) {
            self.write_node(c, raw, &mut out);
        }
        out
    }

    /// Serialize `id` including its own tag.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, false, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, raw_parent: bool, out: &mut String) {
        match self.data(id) {
            Some(NodeData::Text(t)) if raw_parent => out.push_str(t),
            Some(NodeData::Text(t)) => out.push_str(&escape_text(t)),
            Some(NodeData::Element(e)) => {
                out.push('<');
                out.push_str(&e.tag);
                for a in &e.attributes {
                    out.push(' ');
                    out.push_str(&a.name);
                    out.push_str("=\"");
                    out.push_str(&escape_attribute(&a.value));
                    out.push('"');
                }
                out.push('>');
                if is_void_element(&e.tag) {
                    return;
                }
                out.push_str(&self.inner_html(id));
                out.push_str("</");
                out.push_str(&e.tag);
                out.push('>');
            }
            Some(NodeData::Document) => out.push_str(&self.inner_html(id)),
            None => {}
        }
    }
}

/// Iterator over a node and its ancestors, innermost first.
#[derive(Debug)]
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let cur = self.next?;
        self.next = self.doc.parent(cur);
        Some(cur)
    }
}
