use super::types::{Document, ElementSnapshot};
use crate::error::{FetchError, Result};
use crate::tools::fetch::media_type;
use scraper::{ElementRef, Selector};

const BINARY_PREFIXES: [&str; 4] = ["image/", "audio/", "video/", "font/"];

const BINARY_TYPES: [&str; 5] = [
    "application/octet-stream",
    "application/pdf",
    "application/zip",
    "application/gzip",
    "application/wasm",
];

/// Elements whose boundaries separate words in rendered text.
const BLOCK_TAGS: [&str; 36] = [
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr",
    "li", "main", "nav", "ol", "p", "pre", "section", "table", "tbody", "td", "tfoot", "th",
    "tr", "ul",
];

/// Reason a body with this content type cannot be parsed, if any.
pub(super) fn unparseable_reason(content_type: Option<&str>) -> Option<String> {
    let media = media_type(content_type?);
    let binary = BINARY_PREFIXES.iter().any(|p| media.starts_with(p))
        || BINARY_TYPES.contains(&media.as_str());
    binary.then(|| format!("content type {media} is not a document"))
}

pub(super) fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| FetchError::InvalidSelector {
        selector: selector.to_string(),
        reason: format!("{e:?}"),
    })
}

pub(super) fn count_matches(document: &Document, selector: &Selector) -> usize {
    document.select(selector).count()
}

pub(super) fn snapshot_matches(document: &Document, selector: &Selector) -> Vec<ElementSnapshot> {
    document.select(selector).map(snapshot).collect()
}

fn snapshot(element: ElementRef<'_>) -> ElementSnapshot {
    let attrs = element
        .value()
        .attrs()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    ElementSnapshot {
        name: element.value().name().to_string(),
        text: normalized_text(element),
        html: element.html(),
        inner_html: element.inner_html(),
        attrs,
    }
}

/// Descendant text as rendered: inline boundaries join, block boundaries
/// separate, whitespace collapsed.
fn normalized_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    push_text(element, &mut raw);
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn push_text(element: ElementRef<'_>, raw: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            raw.push_str(text);
        } else if let Some(child) = ElementRef::wrap(child) {
            let block = BLOCK_TAGS.contains(&child.value().name());
            if block {
                raw.push(' ');
            }
            push_text(child, raw);
            if block {
                raw.push(' ');
            }
        }
    }
}
