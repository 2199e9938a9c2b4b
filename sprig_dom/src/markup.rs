// Copyright 2025 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Markup parsing into detached fragments.
//!
//! ## Overview
//!
//! [`parse_fragment`] turns the string returned by a component's render pass into
//! a list of [`Fragment`] trees. The [`Document`](crate::Document) only swaps a
//! node's children after parsing succeeded, so a malformed template never wipes
//! committed content.
//!
//! ## Accepted subset
//!
//! - Elements with quoted, unquoted, and boolean attributes. Names are ASCII-lowercased.
//! - Void elements (`br`, `img`, `input`, ...) and `/>` self-closing syntax.
//! - Raw-text elements (`script`, `style`, `textarea`, `title`): content runs to the matching end tag.
//! - Comments, doctypes, and processing instructions are skipped.
//! - Character references are decoded in text and attribute values (see [`decode_entities`](crate::escape::decode_entities)).
//!
//! Structure is strict: unterminated tags, stray or mismatched end tags, and
//! elements left open at end of input are errors.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::escape::decode_entities;
use crate::types::Attribute;

/// Elements that never have children or an end tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose content is taken verbatim up to the matching end tag.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

/// Raw-text elements whose content still has character references decoded.
const ESCAPABLE_RAW_TEXT_ELEMENTS: &[&str] = &["textarea", "title"];

/// Returns true for void element tag names.
pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// A parsed, detached node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Fragment {
    /// An element with its attributes and children.
    Element {
        /// ASCII-lowercased tag name.
        tag: String,
        /// Attributes in source order; duplicates keep the first occurrence.
        attributes: Vec<Attribute>,
        /// Child fragments.
        children: Vec<Fragment>,
    },
    /// Decoded text.
    Text(String),
}

/// Markup errors. Offsets are byte positions into the input.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MarkupError {
    /// Input ended inside a tag, comment, or quoted value.
    #[error("unexpected end of markup inside {context} starting at byte {offset}")]
    UnexpectedEof {
        /// Where the unterminated construct starts.
        offset: usize,
        /// What was being parsed.
        context: &'static str,
    },
    /// An end tag did not match the innermost open element.
    #[error("expected </{expected}> but found </{found}> at byte {offset}")]
    MismatchedEndTag {
        /// Offset of the end tag.
        offset: usize,
        /// Innermost open element.
        expected: String,
        /// Tag actually closed.
        found: String,
    },
    /// An end tag with no open element.
    #[error("stray end tag </{tag}> at byte {offset}")]
    StrayEndTag {
        /// Offset of the end tag.
        offset: usize,
        /// Tag name.
        tag: String,
    },
    /// An element was still open when the input ended.
    #[error("element <{tag}> opened at byte {offset} is never closed")]
    Unclosed {
        /// Offset of the start tag.
        offset: usize,
        /// Tag name.
        tag: String,
    },
    /// A tag or attribute was malformed.
    #[error("malformed {context} at byte {offset}")]
    Malformed {
        /// Offset of the offending character.
        offset: usize,
        /// What was being parsed.
        context: &'static str,
    },
}

/// Parse a markup string into detached fragments.
///
/// ```
/// use sprig_dom::markup::{parse_fragment, Fragment};
///
/// let frags = parse_fragment(r#"<button data-action="save">Save &amp; close</button>"#).unwrap();
/// let Fragment::Element { tag, attributes, children } = &frags[0] else { unreachable!() };
/// assert_eq!(tag, "button");
/// assert_eq!(attributes[0].value, "save");
/// assert_eq!(children[0], Fragment::Text("Save & close".into()));
/// ```
pub fn parse_fragment(input: &str) -> Result<Vec<Fragment>, MarkupError> {
    Parser { src: input, pos: 0 }.run()
}

struct Open {
    tag: String,
    attributes: Vec<Attribute>,
    children: Vec<Fragment>,
    offset: usize,
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if !b.is_ascii_whitespace() {
                break;
            }
            self.pos += 1;
        }
    }

    fn run(mut self) -> Result<Vec<Fragment>, MarkupError> {
        let mut stack: Vec<Open> = Vec::new();
        let mut top: Vec<Fragment> = Vec::new();

        while self.pos < self.src.len() {
            let rest = self.rest();
            if rest.starts_with("<!--") {
                let start = self.pos;
                match rest[4..].find("-->") {
                    Some(end) => self.pos += 4 + end + 3,
                    None => {
                        return Err(MarkupError::UnexpectedEof {
                            offset: start,
                            context: "comment",
                        });
                    }
                }
            } else if rest.starts_with("<!") || rest.starts_with("<?") {
                let start = self.pos;
                match rest.find('>') {
                    Some(end) => self.pos += end + 1,
                    None => {
                        return Err(MarkupError::UnexpectedEof {
                            offset: start,
                            context: "declaration",
                        });
                    }
                }
            } else if rest.starts_with("</") {
                let offset = self.pos;
                let tag = self.end_tag()?;
                let Some(open) = stack.pop() else {
                    return Err(MarkupError::StrayEndTag { offset, tag });
                };
                if open.tag != tag {
                    return Err(MarkupError::MismatchedEndTag {
                        offset,
                        expected: open.tag,
                        found: tag,
                    });
                }
                let element = Fragment::Element {
                    tag: open.tag,
                    attributes: open.attributes,
                    children: open.children,
                };
                sink(&mut stack, &mut top).push(element);
            } else if rest.len() > 1
                && rest.as_bytes()[0] == b'<'
                && rest.as_bytes()[1].is_ascii_alphabetic()
            {
                let offset = self.pos;
                let (tag, attributes, self_closing) = self.start_tag()?;
                if is_void_element(&tag) || self_closing {
                    sink(&mut stack, &mut top).push(Fragment::Element {
                        tag,
                        attributes,
                        children: Vec::new(),
                    });
                } else if RAW_TEXT_ELEMENTS.contains(&tag.as_str()) {
                    let text = self.raw_text(&tag, offset)?;
                    let children = if text.is_empty() {
                        Vec::new()
                    } else {
                        alloc::vec![Fragment::Text(text)]
                    };
                    sink(&mut stack, &mut top).push(Fragment::Element {
                        tag,
                        attributes,
                        children,
                    });
                } else {
                    stack.push(Open {
                        tag,
                        attributes,
                        children: Vec::new(),
                        offset,
                    });
                }
            } else {
                // Text runs to the next '<', but a lone '<' that opens nothing is text too.
                let first = if rest.starts_with('<') { 1 } else { 0 };
                let len = rest[first..].find('<').map_or(rest.len(), |i| i + first);
                let text = decode_entities(&rest[..len]);
                self.pos += len;
                push_text(sink(&mut stack, &mut top), text);
            }
        }

        if let Some(open) = stack.pop() {
            return Err(MarkupError::Unclosed {
                offset: open.offset,
                tag: open.tag,
            });
        }
        Ok(top)
    }

    fn name(&mut self) -> String {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'.') {
                self.pos += 1;
            } else {
                break;
            }
        }
        self.src[start..self.pos].to_ascii_lowercase()
    }

    fn end_tag(&mut self) -> Result<String, MarkupError> {
        let start = self.pos;
        self.pos += 2;
        let tag = self.name();
        if tag.is_empty() {
            return Err(MarkupError::Malformed {
                offset: start,
                context: "end tag",
            });
        }
        self.skip_whitespace();
        match self.peek() {
            Some(b'>') => {
                self.pos += 1;
                Ok(tag)
            }
            Some(_) => Err(MarkupError::Malformed {
                offset: self.pos,
                context: "end tag",
            }),
            None => Err(MarkupError::UnexpectedEof {
                offset: start,
                context: "end tag",
            }),
        }
    }

    fn start_tag(&mut self) -> Result<(String, Vec<Attribute>, bool), MarkupError> {
        let start = self.pos;
        self.pos += 1;
        let tag = self.name();
        let mut attributes: Vec<Attribute> = Vec::new();
        loop {
            self.skip_whitespace();
            let Some(b) = self.peek() else {
                return Err(MarkupError::UnexpectedEof {
                    offset: start,
                    context: "start tag",
                });
            };
            match b {
                b'>' => {
                    self.pos += 1;
                    return Ok((tag, attributes, false));
                }
                b'/' if self.rest().starts_with("/>") => {
                    self.pos += 2;
                    return Ok((tag, attributes, true));
                }
                b'"' | b'\'' | b'<' | b'=' | b'/' => {
                    return Err(MarkupError::Malformed {
                        offset: self.pos,
                        context: "attribute",
                    });
                }
                _ => {
                    let (name, value) = self.attribute(start)?;
                    if !attributes.iter().any(|a| a.name == name) {
                        attributes.push(Attribute { name, value });
                    }
                }
            }
        }
    }

    fn attribute(&mut self, tag_start: usize) -> Result<(String, String), MarkupError> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() || matches!(b, b'=' | b'>' | b'/' | b'"' | b'\'' | b'<') {
                break;
            }
            self.pos += 1;
        }
        let name = self.src[start..self.pos].to_ascii_lowercase();
        self.skip_whitespace();
        if self.peek() != Some(b'=') {
            return Ok((name, String::new()));
        }
        self.pos += 1;
        self.skip_whitespace();
        match self.peek() {
            Some(quote @ (b'"' | b'\'')) => {
                let value_start = self.pos + 1;
                let Some(len) = self.src[value_start..].find(quote as char) else {
                    return Err(MarkupError::UnexpectedEof {
                        offset: self.pos,
                        context: "attribute value",
                    });
                };
                self.pos = value_start + len + 1;
                Ok((name, decode_entities(&self.src[value_start..value_start + len])))
            }
            Some(_) => {
                let value_start = self.pos;
                while let Some(b) = self.peek() {
                    if b.is_ascii_whitespace() || b == b'>' {
                        break;
                    }
                    self.pos += 1;
                }
                Ok((name, decode_entities(&self.src[value_start..self.pos])))
            }
            None => Err(MarkupError::UnexpectedEof {
                offset: tag_start,
                context: "start tag",
            }),
        }
    }

    fn raw_text(&mut self, tag: &str, offset: usize) -> Result<String, MarkupError> {
        let body_start = self.pos;
        let mut search = body_start;
        loop {
            let Some(rel) = self.src[search..].find("</") else {
                return Err(MarkupError::Unclosed {
                    offset,
                    tag: tag.to_string(),
                });
            };
            let at = search + rel;
            let after = &self.src[at + 2..];
            let matches_tag = after.len() >= tag.len()
                && after.as_bytes()[..tag.len()].eq_ignore_ascii_case(tag.as_bytes())
                && after
                    .as_bytes()
                    .get(tag.len())
                    .is_none_or(|b| b.is_ascii_whitespace() || *b == b'>');
            if matches_tag {
                let body = &self.src[body_start..at];
                self.pos = at;
                self.end_tag()?;
                return Ok(if ESCAPABLE_RAW_TEXT_ELEMENTS.contains(&tag) {
                    decode_entities(body)
                } else {
                    body.to_string()
                });
            }
            search = at + 2;
        }
    }
}

fn sink<'s>(stack: &'s mut [Open], top: &'s mut Vec<Fragment>) -> &'s mut Vec<Fragment> {
    match stack.last_mut() {
        Some(open) => &mut open.children,
        None => top,
    }
}

// Adjacent text (split around a lone '<') merges into one node.
fn push_text(out: &mut Vec<Fragment>, text: String) {
    if text.is_empty() {
        return;
    }
    if let Some(Fragment::Text(prev)) = out.last_mut() {
        prev.push_str(&text);
    } else {
        out.push(Fragment::Text(text));
    }
}
