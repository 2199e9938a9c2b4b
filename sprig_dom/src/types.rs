// Copyright 2025 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the host tree: node identifiers, flags, node payloads, and change reports.

use alloc::string::String;
use alloc::vec::Vec;

/// Identifier for a node in the document.
///
/// This is a small, copyable handle that stays stable across updates but becomes
/// invalid when the underlying slot is reused.
/// It consists of a slot index and a generation counter.
///
/// ## Semantics
///
/// - On creation, a fresh slot is allocated with generation `1`.
/// - On free, the slot is released; any existing `NodeId` that pointed to that slot is now stale.
/// - On reuse of a freed slot, its generation is incremented, producing a new, distinct `NodeId`.
///
/// ### Liveness
///
/// Use [`Document::is_alive`](crate::Document::is_alive) to check whether a `NodeId` still refers to a live node.
/// Stale `NodeId`s never alias a different live node because the generation must match.
///
/// ### Notes
///
/// - The generation increments on slot reuse and never decreases.
/// - `u32` is ample for practical lifetimes; behavior on generation overflow is unspecified.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    /// Slot index of this handle, useful for logging.
    pub const fn slot(self) -> u32 {
        self.0
    }

    /// Generation of this handle.
    pub const fn generation(self) -> u32 {
        self.1
    }
}

impl core::fmt::Display for NodeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}v{}", self.0, self.1)
    }
}

bitflags::bitflags! {
    /// Per-node state flags.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// Node is reachable from the document root.
        const CONNECTED = 0b0000_0001;
        /// Node is an element (can carry attributes and children).
        const ELEMENT   = 0b0000_0010;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// A single attribute on an element. Names are stored ASCII-lowercased.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute name.
    pub name: String,
    /// Attribute value (empty for boolean attributes).
    pub value: String,
}

/// Element payload: tag name plus attributes in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ElementData {
    /// ASCII-lowercased tag name.
    pub tag: String,
    /// Attributes in insertion order.
    pub attributes: Vec<Attribute>,
}

impl ElementData {
    /// Look up an attribute value by (case-insensitive) name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_str())
    }
}

/// What a node holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeData {
    /// The document root. Exactly one per [`Document`](crate::Document).
    Document,
    /// An element.
    Element(ElementData),
    /// A text node.
    Text(String),
}

/// An attribute transition reported by
/// [`Document::set_attribute`](crate::Document::set_attribute) and
/// [`Document::remove_attribute`](crate::Document::remove_attribute).
///
/// Only produced when the value actually changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeChange {
    /// Attribute name (lowercased).
    pub name: String,
    /// Previous value, `None` if the attribute was absent.
    pub old: Option<String>,
    /// New value, `None` if the attribute was removed.
    pub new: Option<String>,
}

/// Nodes affected by a structural mutation, each list in tree order.
///
/// A node that was moved between two connected parents shows up in both
/// `disconnected` and `connected`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TreeChange {
    /// Nodes that became reachable from the document root.
    pub connected: Vec<NodeId>,
    /// Nodes that stopped being reachable from the document root.
    pub disconnected: Vec<NodeId>,
    /// Nodes created by the mutation (markup commits).
    pub inserted: Vec<NodeId>,
    /// Nodes whose slots were released. Their ids are stale after the call returns.
    pub freed: Vec<NodeId>,
}

impl TreeChange {
    /// Returns true when the mutation affected nothing.
    pub fn is_empty(&self) -> bool {
        self.connected.is_empty()
            && self.disconnected.is_empty()
            && self.inserted.is_empty()
            && self.freed.is_empty()
    }

    /// Append another change report after this one.
    pub fn extend(&mut self, other: Self) {
        self.connected.extend(other.connected);
        self.disconnected.extend(other.disconnected);
        self.inserted.extend(other.inserted);
        self.freed.extend(other.freed);
    }
}

/// Errors from structural operations on a [`Document`](crate::Document).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// The node id is stale or was never issued by this document.
    #[error("node {0} is not alive")]
    StaleNode(NodeId),
    /// The node cannot hold children (text nodes).
    #[error("node {0} cannot hold children")]
    NotAContainer(NodeId),
    /// The operation would make a node its own ancestor, or move the document root.
    #[error("inserting {child} under {parent} would create a cycle")]
    HierarchyCycle {
        /// Prospective parent.
        parent: NodeId,
        /// Node being inserted.
        child: NodeId,
    },
    /// Markup could not be parsed; the tree is unchanged.
    #[error(transparent)]
    Markup(#[from] crate::markup::MarkupError),
}
