use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const FALLBACK_LOCALE: &str = "en";

/// Text with one entry per language code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct I18nText(pub BTreeMap<String, String>);

impl I18nText {
    pub fn new(locale: &str, text: impl Into<String>) -> Self {
        let mut map = BTreeMap::new();
        map.insert(locale.to_owned(), text.into());
        Self(map)
    }

    pub fn with(mut self, locale: &str, text: impl Into<String>) -> Self {
        self.0.insert(locale.to_owned(), text.into());
        self
    }

    /// Requested language, then English, then whatever comes first.
    pub fn localize(&self, locale: &str) -> &str {
        self.0
            .get(locale)
            .or_else(|| self.0.get(FALLBACK_LOCALE))
            .or_else(|| self.0.values().next())
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|v| v.is_empty())
    }
}

impl From<&str> for I18nText {
    fn from(text: &str) -> Self {
        Self::new(FALLBACK_LOCALE, text)
    }
}

impl fmt::Display for I18nText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.localize(FALLBACK_LOCALE))
    }
}

pub fn yes_no(value: bool, locale: &str) -> &'static str {
    match (locale, value) {
        ("de", true) => "Ja",
        ("de", false) => "Nein",
        (_, true) => "Yes",
        (_, false) => "No",
    }
}
