use crate::types::LanguageCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Code -> display name for the languages the backend supports.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageCatalog {
    entries: BTreeMap<String, String>,
}

impl LanguageCatalog {
    pub fn new(entries: BTreeMap<String, String>) -> Self {
        Self { entries }
    }

    /// Used whenever the backend list can't be loaded.
    pub fn fallback() -> Self {
        let entries = [
            ("en", "English"),
            ("fr", "French"),
            ("es", "Spanish"),
            ("de", "German"),
        ]
        .into_iter()
        .map(|(code, name)| (code.to_string(), name.to_string()))
        .collect();
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, code: &LanguageCode) -> bool {
        self.entries.contains_key(code.as_str())
    }

    pub fn display_name(&self, code: &LanguageCode) -> Option<&str> {
        if code.is_auto() {
            return Some("Auto-Detect");
        }
        self.entries.get(code.as_str()).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(code, name)| (code.as_str(), name.as_str()))
    }

    /// `auto` is accepted on the input side only.
    pub fn accepts_source(&self, code: &LanguageCode) -> bool {
        code.is_auto() || self.contains(code)
    }

    pub fn accepts_target(&self, code: &LanguageCode) -> bool {
        !code.is_auto() && self.contains(code)
    }
}
