// Copyright 2025 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A small selector language for delegation lookups.
//!
//! Supports comma-separated compound selectors made of an optional type
//! (`button` or `*`), `#id`, `.class`, `[attr]`, and `[attr=value]` with the
//! value optionally quoted. There are no combinators; ancestry is handled by
//! [`Document::closest`](crate::Document::closest).

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::iter::Peekable;
use core::str::CharIndices;

use crate::types::ElementData;

/// One attribute condition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttrMatch {
    /// `[name]`
    Present(String),
    /// `[name=value]`
    Equals(String, String),
}

/// A compound selector such as `button[data-action="delete"].danger`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrMatch>,
}

/// A comma-separated list of selectors; matches when any member matches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectorList(Vec<Selector>);

/// Selector parse errors.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    /// Nothing to match.
    #[error("empty selector")]
    Empty,
    /// Unsupported or malformed syntax.
    #[error("unexpected {found:?} at byte {offset} in selector")]
    Unexpected {
        /// Byte offset.
        offset: usize,
        /// Offending character.
        found: char,
    },
    /// An attribute selector was not closed.
    #[error("unterminated attribute selector")]
    Unterminated,
}

impl Selector {
    /// Returns true when `element` satisfies every condition.
    pub fn matches(&self, element: &ElementData) -> bool {
        if let Some(tag) = &self.tag
            && *tag != element.tag
        {
            return false;
        }
        if let Some(id) = &self.id
            && element.attribute("id") != Some(id.as_str())
        {
            return false;
        }
        if !self.classes.is_empty() {
            let class = element.attribute("class").unwrap_or("");
            if !self
                .classes
                .iter()
                .all(|c| class.split_ascii_whitespace().any(|have| have == c))
            {
                return false;
            }
        }
        self.attrs.iter().all(|a| match a {
            AttrMatch::Present(name) => element.attribute(name).is_some(),
            AttrMatch::Equals(name, value) => element.attribute(name) == Some(value.as_str()),
        })
    }
}

impl SelectorList {
    /// Parse a selector list.
    pub fn parse(src: &str) -> Result<Self, SelectorError> {
        split_top_level(src)
            .into_iter()
            .map(|(offset, part)| parse_compound(part, offset))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    /// Returns true when any selector in the list matches `element`.
    pub fn matches(&self, element: &ElementData) -> bool {
        self.0.iter().any(|s| s.matches(element))
    }
}

impl core::str::FromStr for SelectorList {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Split on commas outside `[...]` and quoted values, keeping each part's byte offset.
fn split_top_level(src: &str) -> Vec<(usize, &str)> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_brackets = false;
    let mut quote: Option<char> = None;
    for (i, c) in src.char_indices() {
        match (quote, c) {
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') if in_brackets => quote = Some(c),
            (None, '[') => in_brackets = true,
            (None, ']') => in_brackets = false,
            (None, ',') if !in_brackets => {
                parts.push((start, &src[start..i]));
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push((start, &src[start..]));
    parts
}

fn is_ident(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_')
}

fn take_ident(chars: &mut Peekable<CharIndices<'_>>) -> String {
    let mut s = String::new();
    while let Some(&(_, c)) = chars.peek() {
        if !is_ident(c) {
            break;
        }
        s.push(c);
        chars.next();
    }
    s
}

fn parse_compound(part: &str, base: usize) -> Result<Selector, SelectorError> {
    let trimmed_start = part.len() - part.trim_start().len();
    let src = part.trim();
    if src.is_empty() {
        return Err(SelectorError::Empty);
    }
    let base = base + trimmed_start;
    let mut sel = Selector::default();
    let mut chars = src.char_indices().peekable();

    if let Some(&(_, c)) = chars.peek() {
        if c == '*' {
            chars.next();
        } else if is_ident(c) {
            sel.tag = Some(take_ident(&mut chars).to_ascii_lowercase());
        }
    }

    while let Some((i, c)) = chars.next() {
        match c {
            '#' | '.' => {
                let ident = take_ident(&mut chars);
                if ident.is_empty() {
                    return Err(SelectorError::Unexpected {
                        offset: base + i,
                        found: c,
                    });
                }
                if c == '#' {
                    sel.id = Some(ident);
                } else {
                    sel.classes.push(ident);
                }
            }
            '[' => {
                let rest = &src[i + 1..];
                let Some(close) = find_close(rest) else {
                    return Err(SelectorError::Unterminated);
                };
                sel.attrs.push(parse_attr(&rest[..close], base + i + 1)?);
                // Skip past the closing bracket.
                while let Some(&(j, _)) = chars.peek() {
                    chars.next();
                    if j == i + 1 + close {
                        break;
                    }
                }
            }
            _ => {
                return Err(SelectorError::Unexpected {
                    offset: base + i,
                    found: c,
                });
            }
        }
    }
    Ok(sel)
}

/// Byte index of the `]` closing an attribute selector, ignoring quoted text.
fn find_close(rest: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in rest.char_indices() {
        match (quote, c) {
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, ']') => return Some(i),
            _ => {}
        }
    }
    None
}

fn parse_attr(body: &str, offset: usize) -> Result<AttrMatch, SelectorError> {
    let Some((name, value)) = body.split_once('=') else {
        let name = body.trim();
        if name.is_empty() || !name.chars().all(is_ident) {
            return Err(SelectorError::Unexpected {
                offset,
                found: body.chars().next().unwrap_or(']'),
            });
        }
        return Ok(AttrMatch::Present(name.to_ascii_lowercase()));
    };
    let name = name.trim();
    if name.is_empty() || !name.chars().all(is_ident) {
        return Err(SelectorError::Unexpected {
            offset,
            found: '=',
        });
    }
    let value = value.trim();
    let unquoted = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value);
    Ok(AttrMatch::Equals(
        name.to_ascii_lowercase(),
        unquoted.to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Attribute;
    use alloc::vec;

    fn element(tag: &str, attrs: &[(&str, &str)]) -> ElementData {
        ElementData {
            tag: tag.to_string(),
            attributes: attrs
                .iter()
                .map(|(n, v)| Attribute {
                    name: n.to_string(),
                    value: v.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn data_action_patterns() {
        let button = element("button", &[("data-action", "delete"), ("class", "btn danger")]);
        let any_action = SelectorList::parse("[data-action]").unwrap();
        assert!(any_action.matches(&button));
        let delete = SelectorList::parse(r#"button[data-action="delete"]"#).unwrap();
        assert!(delete.matches(&button));
        let edit = SelectorList::parse("button[data-action='edit']").unwrap();
        assert!(!edit.matches(&button));
        let class = SelectorList::parse("button.btn.danger").unwrap();
        assert!(class.matches(&button));
        assert!(!SelectorList::parse("a[data-action]").unwrap().matches(&button));
    }

    #[test]
    fn ids_universal_and_lists() {
        let row = element("tr", &[("id", "row-3")]);
        assert!(SelectorList::parse("#row-3").unwrap().matches(&row));
        assert!(SelectorList::parse("*").unwrap().matches(&row));
        assert!(SelectorList::parse("td, tr").unwrap().matches(&row));
        assert!(!SelectorList::parse("td, li").unwrap().matches(&row));
    }

    #[test]
    fn parse_shape() {
        let list = SelectorList::parse(r#"button[data-action = "x"][disabled]"#).unwrap();
        assert_eq!(
            list.0,
            vec![Selector {
                tag: Some("button".to_string()),
                id: None,
                classes: vec![],
                attrs: vec![
                    AttrMatch::Equals("data-action".to_string(), "x".to_string()),
                    AttrMatch::Present("disabled".to_string()),
                ],
            }]
        );
    }

    #[test]
    fn commas_inside_attribute_values_do_not_split() {
        let button = element("button", &[("data-label", "a,b")]);
        let list = SelectorList::parse(r#"button[data-label="a,b"], .other"#).unwrap();
        assert!(list.matches(&button));
        assert!(SelectorList::parse("[data-label='x,y']").unwrap().matches(&element(
            "i",
            &[("data-label", "x,y")]
        )));
        assert!(SelectorList::parse(r#"[data-label="[1]"]"#).unwrap().matches(&element(
            "i",
            &[("data-label", "[1]")]
        )));
        assert!(!SelectorList::parse(r#"[data-label="a,b"]"#).unwrap().matches(&element(
            "i",
            &[("data-label", "a")]
        )));
    }

    #[test]
    fn rejects_unsupported_syntax() {
        assert_eq!(SelectorList::parse(""), Err(SelectorError::Empty));
        assert_eq!(SelectorList::parse("a,"), Err(SelectorError::Empty));
        assert_eq!(
            SelectorList::parse("[data-action"),
            Err(SelectorError::Unterminated)
        );
        assert!(matches!(
            SelectorList::parse("div > span"),
            Err(SelectorError::Unexpected { found: ' ', .. })
        ));
        assert!(matches!(
            SelectorList::parse("li:hover"),
            Err(SelectorError::Unexpected { found: ':', .. })
        ));
    }
}
