// Copyright 2025 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON-in-attribute codec.
//!
//! Parents pass structured data to child components by serializing it into an
//! attribute inside their rendered markup. The value must survive being placed
//! inside a quoted attribute, so it is entity-escaped on the way in and
//! unescaped on the way out.
//!
//! ```
//! use sprig_runtime::attr::{escape_json_for_attribute, parse_json_attribute};
//!
//! let colors = vec!["red", "green"];
//! let encoded = escape_json_for_attribute(&colors).unwrap();
//! let markup = format!(r#"<app-chart colors="{encoded}"></app-chart>"#);
//! # let _ = markup;
//! let back: Vec<String> = parse_json_attribute("colors", &encoded).unwrap();
//! assert_eq!(back, ["red", "green"]);
//! ```

use serde::Serialize;
use serde::de::DeserializeOwned;
use sprig_dom::escape::{decode_entities, escape_attribute};

use crate::error::AttributeError;

/// Serialize `value` as JSON and escape it for a quoted attribute.
pub fn escape_json_for_attribute<T: Serialize + ?Sized>(
    value: &T,
) -> Result<String, serde_json::Error> {
    Ok(escape_attribute(&serde_json::to_string(value)?))
}

/// Undo attribute escaping.
///
/// Values read back from a parsed document are already unescaped; this is for
/// raw strings that were escaped twice or read from markup source.
pub fn unescape_json_from_attribute(raw: &str) -> String {
    decode_entities(raw)
}

/// Decode an attribute value as JSON.
///
/// Accepts both already-decoded and still-escaped text.
pub fn parse_json_attribute<T: DeserializeOwned>(name: &str, raw: &str) -> Result<T, AttributeError> {
    serde_json::from_str(raw)
        .or_else(|_| serde_json::from_str(&unescape_json_from_attribute(raw)))
        .map_err(|source| AttributeError {
            name: name.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, PartialEq, Deserialize, Serialize)]
    struct Settings {
        title: String,
        page_size: u32,
    }

    #[test]
    fn escaped_value_has_no_quotes() {
        let s = Settings {
            title: r#"Fees "2025" & co"#.into(),
            page_size: 20,
        };
        let encoded = escape_json_for_attribute(&s).unwrap();
        assert!(!encoded.contains('"'));
        assert_eq!(parse_json_attribute::<Settings>("settings", &encoded).unwrap(), s);
    }

    #[test]
    fn decoded_value_parses_directly() {
        let v: Settings =
            parse_json_attribute("settings", r#"{"title":"x","page_size":5}"#).unwrap();
        assert_eq!(v.page_size, 5);
    }

    #[test]
    fn bad_json_names_the_attribute() {
        let err = parse_json_attribute::<Settings>("settings", "{oops").unwrap_err();
        assert_eq!(err.name, "settings");
        assert!(err.to_string().contains("settings"));
    }
}
