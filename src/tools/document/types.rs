use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parsed page structure.
pub type Document = scraper::Html;

/// Owned copy of a matched element, detached from the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    /// Local tag name, lowercase.
    pub name: String,
    /// Descendant text with whitespace collapsed.
    pub text: String,
    /// Outer HTML.
    pub html: String,
    pub inner_html: String,
    pub attrs: BTreeMap<String, String>,
}

impl ElementSnapshot {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }
}
