// Copyright 2025 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The component contract and the tag registry.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use sprig_dom::AttributeChange;

use crate::error::{DefineError, RenderError};
use crate::runtime::Cx;
use crate::state::StateStore;

/// A custom element implementation.
///
/// `render` is the only required method. It reads state and instance fields and
/// returns markup; it must not touch the document. The hooks receive a [`Cx`]
/// scoped to the host element.
///
/// ```
/// use sprig_runtime::{Component, Cx, RenderError, StateStore};
///
/// struct Badge;
///
/// impl Component for Badge {
///     fn render(&self, state: &StateStore) -> Result<String, RenderError> {
///         let label = state.get::<String>("label").map_or("new", String::as_str);
///         Ok(format!("<span class=\"badge\">{label}</span>"))
///     }
///
///     fn created(&mut self, cx: &mut Cx<'_>) {
///         cx.set("label", String::from("draft"));
///     }
/// }
/// ```
pub trait Component {
    /// Produce the host's content from current state.
    fn render(&self, state: &StateStore) -> Result<String, RenderError>;

    /// Attribute names that trigger [`attribute_changed`](Self::attribute_changed).
    fn observed_attributes(&self) -> &'static [&'static str] {
        &[]
    }

    /// Runs once after construction, before the host is connected.
    ///
    /// State written here is picked up by the first render.
    fn created(&mut self, cx: &mut Cx<'_>) {
        let _ = cx;
    }

    /// Runs each time the host enters the document, after it has been mounted
    /// and rendered. Attach host listeners and start data loads here.
    fn connected(&mut self, cx: &mut Cx<'_>) {
        let _ = cx;
    }

    /// Runs each time the host leaves the document, before its pending render
    /// is cancelled and its listeners and timers are released.
    fn disconnected(&mut self, cx: &mut Cx<'_>) {
        let _ = cx;
    }

    /// An observed attribute changed value.
    fn attribute_changed(&mut self, cx: &mut Cx<'_>, change: &AttributeChange) {
        let _ = (cx, change);
    }
}

/// Constructor registered for a tag.
pub(crate) type Factory = Rc<dyn Fn() -> Box<dyn Component>>;

/// Tag name to constructor map.
#[derive(Default)]
pub struct Registry {
    factories: HashMap<String, Factory>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<_> = self.factories.keys().collect();
        tags.sort();
        f.debug_struct("Registry").field("tags", &tags).finish()
    }
}

impl Registry {
    /// Register `factory` under `tag`.
    pub(crate) fn define(&mut self, tag: &str, factory: Factory) -> Result<(), DefineError> {
        if !is_valid_custom_element_name(tag) {
            return Err(DefineError::InvalidName(tag.to_string()));
        }
        if self.factories.contains_key(tag) {
            return Err(DefineError::AlreadyDefined(tag.to_string()));
        }
        self.factories.insert(tag.to_string(), factory);
        Ok(())
    }

    pub(crate) fn get(&self, tag: &str) -> Option<Factory> {
        self.factories.get(tag).cloned()
    }

    /// Returns true if `tag` has been defined.
    pub fn is_defined(&self, tag: &str) -> bool {
        self.factories.contains_key(tag)
    }

    /// Number of defined tags.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns true if nothing has been defined.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

const RESERVED: &[&str] = &[
    "annotation-xml",
    "color-profile",
    "font-face",
    "font-face-src",
    "font-face-uri",
    "font-face-format",
    "font-face-name",
    "missing-glyph",
];

/// Whether `name` may be registered as a custom element.
///
/// It must start with a lowercase ASCII letter, contain a hyphen, contain no
/// uppercase ASCII, and not be one of the names reserved by SVG and `MathML`.
pub fn is_valid_custom_element_name(name: &str) -> bool {
    let mut chars = name.chars();
    if !chars.next().is_some_and(|c| c.is_ascii_lowercase()) {
        return false;
    }
    name.contains('-')
        && chars.all(|c| {
            matches!(c, 'a'..='z' | '0'..='9' | '-' | '.' | '_' | '\u{B7}')
                || (!c.is_ascii() && !c.is_whitespace())
        })
        && !RESERVED.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Empty;

    impl Component for Empty {
        fn render(&self, _: &StateStore) -> Result<String, RenderError> {
            Ok(String::new())
        }
    }

    fn factory() -> Factory {
        Rc::new(|| Box::new(Empty) as Box<dyn Component>)
    }

    #[test]
    fn name_rules() {
        for ok in ["app-page", "x-1", "app-admin-announcements-page", "a-b.c_d", "emoji-\u{1F600}"] {
            assert!(is_valid_custom_element_name(ok), "{ok} should be valid");
        }
        for bad in ["app", "App-page", "-app", "1-app", "app-Page", "app page", "font-face", ""] {
            assert!(!is_valid_custom_element_name(bad), "{bad:?} should be invalid");
        }
    }

    #[test]
    fn define_twice_fails() {
        let mut reg = Registry::default();
        reg.define("app-list", factory()).unwrap();
        assert_eq!(
            reg.define("app-list", factory()),
            Err(DefineError::AlreadyDefined("app-list".into()))
        );
        assert_eq!(
            reg.define("list", factory()),
            Err(DefineError::InvalidName("list".into()))
        );
        assert!(reg.is_defined("app-list"));
        assert_eq!(reg.len(), 1);
        assert!(reg.get("app-list").is_some());
    }
}
