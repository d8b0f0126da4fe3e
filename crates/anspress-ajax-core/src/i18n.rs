//! Localization of user-facing messages.

use std::collections::HashMap;

/// Translates a message into the caller's language.
pub trait Translator: Send + Sync {
    fn translate(&self, message: &str) -> String;
}

/// Returns every message unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct Passthrough;

impl Translator for Passthrough {
    fn translate(&self, message: &str) -> String {
        message.to_string()
    }
}

/// Lookup table of translations. Unknown messages fall back to the source text.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    entries: HashMap<String, String>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source: impl Into<String>, translated: impl Into<String>) {
        self.entries.insert(source.into(), translated.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<HashMap<String, String>> for Catalog {
    fn from(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }
}

impl FromIterator<(String, String)> for Catalog {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Translator for Catalog {
    fn translate(&self, message: &str) -> String {
        self.entries
            .get(message)
            .cloned()
            .unwrap_or_else(|| message.to_string())
    }
}
