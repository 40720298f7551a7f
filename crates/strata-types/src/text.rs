//! Language-keyed text as used by the API.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Localized text, e.g. `{"en": "German company register", "de": ...}`.
///
/// Stream and service names and descriptions are maps from a language code
/// to the translated text. English is the platform's required language for
/// stream creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalizedText(BTreeMap<String, String>);

impl LocalizedText {
    /// Creates an empty localized text.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Creates a localized text with only an English entry.
    pub fn english(text: impl Into<String>) -> Self {
        let mut map = BTreeMap::new();
        map.insert("en".to_string(), text.into());
        Self(map)
    }

    /// Returns the English text, if present.
    #[must_use]
    pub fn en(&self) -> Option<&str> {
        self.get("en")
    }

    /// Returns the text for the given language code.
    #[must_use]
    pub fn get(&self, lang: &str) -> Option<&str> {
        self.0.get(lang).map(String::as_str)
    }

    /// Adds or replaces a translation.
    pub fn insert(&mut self, lang: impl Into<String>, text: impl Into<String>) {
        self.0.insert(lang.into(), text.into());
    }

    /// Returns true if no translations are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for LocalizedText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Prefer English, fall back to any translation.
        match self.en().or_else(|| self.0.values().next().map(String::as_str)) {
            Some(text) => f.write_str(text),
            None => Ok(()),
        }
    }
}
