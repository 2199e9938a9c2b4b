// Copyright 2025 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.

use std::borrow::Cow;

use sprig_dom::{DomError, NodeId};

/// Errors from runtime entry points.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The node id is stale.
    #[error("node {0} is not alive")]
    UnknownNode(NodeId),
    /// A structural document operation failed.
    #[error(transparent)]
    Dom(#[from] DomError),
    /// A component definition was rejected.
    #[error(transparent)]
    Define(#[from] DefineError),
}

/// Errors from [`Runtime::define`](crate::Runtime::define).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DefineError {
    /// Not a valid custom element name.
    #[error("{0:?} is not a valid custom element name")]
    InvalidName(String),
    /// The name is already registered.
    #[error("{0:?} has already been defined")]
    AlreadyDefined(String),
}

/// A failed render pass.
///
/// Returned from [`Component::render`](crate::Component::render), or produced by the
/// runtime when the render panicked or its markup did not parse. The previously
/// committed content stays in place.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The component reported a failure.
    #[error("{0}")]
    Message(Cow<'static, str>),
    /// A value needed by the template could not be serialized.
    #[error("template value could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
    /// Formatting into the template failed.
    #[error("template formatting failed")]
    Format(#[from] std::fmt::Error),
    /// The render function panicked.
    #[error("render panicked: {0}")]
    Panicked(String),
    /// The rendered markup was malformed.
    #[error("rendered markup rejected: {0}")]
    Markup(#[from] sprig_dom::markup::MarkupError),
}

impl RenderError {
    /// A render failure with a message.
    pub fn msg(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Message(message.into())
    }
}

/// JSON attribute decoding failure.
#[derive(Debug, thiserror::Error)]
#[error("attribute {name:?} does not hold valid JSON for the expected shape")]
pub struct AttributeError {
    /// Attribute name.
    pub name: String,
    /// Underlying decode error.
    #[source]
    pub source: serde_json::Error,
}
