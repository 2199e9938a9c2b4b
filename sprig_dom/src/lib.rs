// Copyright 2025 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sprig DOM: a generational host tree that components commit markup into.
//!
//! Sprig DOM is the document half of the Sprig component runtime. It stands in
//! for the browser document: a hierarchy of elements and text nodes under a
//! single connected root, with attributes, markup commits, and selector queries.
//!
//! - Represents the node hierarchy with generational [`NodeId`] handles that never alias reused slots.
//! - Replaces a node's content from a markup string with [`Document::set_inner_html`], keeping the node itself.
//! - Tracks which nodes are reachable from the root and reports every transition in a [`TreeChange`].
//! - Resolves delegation lookups with [`Document::closest`] over a small [`SelectorList`] language.
//!
//! ## Where this fits
//!
//! - Host tree: structure, attributes, markup (this crate).
//! - Responder: capture → target → bubble routing over any parent lookup (`sprig_responder`).
//! - Runtime: component state, render scheduling, lifecycle (`sprig_runtime`).
//!
//! The runtime reads the [`TreeChange`] returned by each structural call to decide
//! which component hosts to connect, disconnect, or upgrade.
//!
//! ## Commit semantics
//!
//! [`Document::set_inner_html`] parses the whole string before it touches the tree.
//! A [`MarkupError`](markup::MarkupError) leaves the existing children in place.
//! On success every previous child is freed (its id goes stale) and the parsed
//! nodes are inserted. There is no diffing: state that only lives in the old
//! nodes is gone after a commit.
//!
//! ## API overview
//!
//! - [`Document`]: node arena with structure, attributes, serialization, and queries.
//! - [`NodeId`]: generational handle of a node.
//! - [`NodeFlags`]: connection and element bits.
//! - [`TreeChange`]: nodes connected, disconnected, inserted, and freed by a mutation.
//! - [`AttributeChange`]: before/after values, only produced for real changes.
//! - [`SelectorList`]: `tag`, `#id`, `.class`, `[attr]`, `[attr="value"]`, comma lists.
//!
//! ### Minimal usage
//!
//! ```
//! use sprig_dom::{Document, SelectorList};
//!
//! let mut doc = Document::new();
//! let host = doc.create_element("app-students");
//! doc.append_child(doc.root(), host).unwrap();
//!
//! // Commit rendered markup.
//! doc.set_inner_html(host, r#"<table><tr data-id="7"><td><button data-action="edit">Edit</button></td></tr></table>"#)
//!     .unwrap();
//!
//! // Delegation: from the clicked node to the nearest action.
//! let actions = SelectorList::parse("[data-action]").unwrap();
//! let button = doc.query_selector(host, &actions).unwrap();
//! let label = doc.children(button)[0];
//! assert_eq!(doc.closest(label, &actions), Some(button));
//!
//! // A second commit replaces the content but keeps the host.
//! doc.set_inner_html(host, "<p>empty</p>").unwrap();
//! assert!(doc.is_alive(host));
//! assert!(!doc.is_alive(button));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod escape;
pub mod markup;
pub mod selector;
mod tree;
mod types;

pub use selector::{SelectorError, SelectorList};
pub use tree::{Ancestors, Document};
pub use types::{
    Attribute, AttributeChange, DomError, ElementData, NodeData, NodeFlags, NodeId, TreeChange,
};
