// Copyright 2025 the Sprig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Runtime configuration.

use serde::Deserialize;

/// Tunables for a [`Runtime`](crate::Runtime).
///
/// Every field has a default, so a partial JSON object is enough:
///
/// ```
/// use sprig_runtime::RuntimeConfig;
///
/// let config = RuntimeConfig::from_json(r#"{ "auto_flush": false }"#).unwrap();
/// assert!(!config.auto_flush);
/// assert!(config.catch_panics);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Run the microtask checkpoint at the end of every runtime entry point.
    ///
    /// When false, pending renders wait for [`Runtime::flush`](crate::Runtime::flush).
    pub auto_flush: bool,
    /// Treat a panic inside `render` as a render failure instead of unwinding
    /// through the runtime.
    pub catch_panics: bool,
    /// Upper bound on render tasks executed by one checkpoint. The remainder stays
    /// queued for the next checkpoint.
    pub max_flush_passes: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            auto_flush: true,
            catch_panics: true,
            max_flush_passes: 1024,
        }
    }
}

impl RuntimeConfig {
    /// Parse a configuration from JSON.
    pub fn from_json(src: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(src)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_default() {
        assert_eq!(RuntimeConfig::from_json("{}").unwrap(), RuntimeConfig::default());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(RuntimeConfig::from_json(r#"{ "autoflush": true }"#).is_err());
    }

    #[test]
    fn all_fields() {
        let config = RuntimeConfig::from_json(
            r#"{ "auto_flush": false, "catch_panics": false, "max_flush_passes": 8 }"#,
        )
        .unwrap();
        assert_eq!(
            config,
            RuntimeConfig {
                auto_flush: false,
                catch_panics: false,
                max_flush_passes: 8,
            }
        );
    }
}
