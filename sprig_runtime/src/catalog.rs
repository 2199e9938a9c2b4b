// Copyright 2025 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed event names.
//!
//! Components talk to each other with bubbling custom events. The wire name is
//! still a string, but [`EventName`] gives the recurring names a closed set of
//! variants so a typo is a compile error rather than a silent miss. The
//! entity-scoped families (`student-saved`, `class-deleted`, ...) carry the
//! entity prefix.
//!
//! ```
//! use sprig_runtime::EventName;
//!
//! assert_eq!(EventName::parse("student-saved"), EventName::Saved("student".into()));
//! assert_eq!(EventName::TableEdit.as_str(), "table-edit");
//! assert_eq!(EventName::from("mouseover"), EventName::Custom("mouseover".into()));
//! ```

use std::borrow::Cow;
use std::fmt;

/// A known event name, or any other string.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventName {
    /// `click`
    Click,
    /// `input`
    Input,
    /// `change`
    Change,
    /// `submit`
    Submit,
    /// `table-view`: a row asked to be shown.
    TableView,
    /// `table-edit`: a row asked to be edited.
    TableEdit,
    /// `table-delete`: a row asked to be deleted.
    TableDelete,
    /// `table-add`: the table asked for a new row.
    TableAdd,
    /// `tab-change`
    TabChange,
    /// `filter-change`
    FilterChange,
    /// `<entity>-saved`
    Saved(String),
    /// `<entity>-updated`
    Updated(String),
    /// `<entity>-deleted`
    Deleted(String),
    /// `<entity>-promoted`
    Promoted(String),
    /// Anything else.
    Custom(String),
}

const FIXED: &[(&str, EventName)] = &[
    ("click", EventName::Click),
    ("input", EventName::Input),
    ("change", EventName::Change),
    ("submit", EventName::Submit),
    ("table-view", EventName::TableView),
    ("table-edit", EventName::TableEdit),
    ("table-delete", EventName::TableDelete),
    ("table-add", EventName::TableAdd),
    ("tab-change", EventName::TabChange),
    ("filter-change", EventName::FilterChange),
];

impl EventName {
    /// Classify a wire name. Never fails; unknown names become [`EventName::Custom`].
    pub fn parse(name: &str) -> Self {
        if let Some((_, known)) = FIXED.iter().find(|(n, _)| *n == name) {
            return known.clone();
        }
        let entity = |suffix: &str| {
            name.strip_suffix(suffix)
                .filter(|prefix| !prefix.is_empty())
                .map(str::to_string)
        };
        if let Some(e) = entity("-saved") {
            Self::Saved(e)
        } else if let Some(e) = entity("-updated") {
            Self::Updated(e)
        } else if let Some(e) = entity("-deleted") {
            Self::Deleted(e)
        } else if let Some(e) = entity("-promoted") {
            Self::Promoted(e)
        } else {
            Self::Custom(name.to_string())
        }
    }

    /// The wire name.
    pub fn as_str(&self) -> Cow<'_, str> {
        match self {
            Self::Saved(e) => Cow::Owned(format!("{e}-saved")),
            Self::Updated(e) => Cow::Owned(format!("{e}-updated")),
            Self::Deleted(e) => Cow::Owned(format!("{e}-deleted")),
            Self::Promoted(e) => Cow::Owned(format!("{e}-promoted")),
            Self::Custom(name) => Cow::Borrowed(name),
            fixed => Cow::Borrowed(
                FIXED
                    .iter()
                    .find(|(_, v)| v == fixed)
                    .map_or("", |(n, _)| n),
            ),
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

impl From<&str> for EventName {
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}

impl From<String> for EventName {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl From<&String> for EventName {
    fn from(name: &String) -> Self {
        Self::parse(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_names_round_trip() {
        for (name, variant) in FIXED {
            assert_eq!(&EventName::parse(name), variant);
            assert_eq!(variant.as_str(), *name);
        }
    }

    #[test]
    fn entity_families() {
        assert_eq!(
            EventName::parse("announcement-updated"),
            EventName::Updated("announcement".into())
        );
        assert_eq!(
            EventName::parse("grade-level-deleted"),
            EventName::Deleted("grade-level".into())
        );
        assert_eq!(
            EventName::parse("student-promoted").to_string(),
            "student-promoted"
        );
    }

    #[test]
    fn bare_suffix_is_custom() {
        assert_eq!(EventName::parse("-saved"), EventName::Custom("-saved".into()));
        assert_eq!(EventName::parse("saved"), EventName::Custom("saved".into()));
    }
}
