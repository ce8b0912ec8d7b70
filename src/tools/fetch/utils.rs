use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use std::collections::BTreeMap;

const MARKUP_APPLICATION_TYPES: [&str; 3] = [
    "application/xml",
    "application/xhtml+xml",
    "application/rss+xml",
];

/// Media type without parameters, lowercased (`text/html; charset=utf-8` -> `text/html`).
pub(crate) fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

/// Content types accepted when content-type leniency is off.
pub(crate) fn is_markup_content_type(content_type: &str) -> bool {
    let media = media_type(content_type);
    media.starts_with("text/")
        || media.ends_with("+xml")
        || MARKUP_APPLICATION_TYPES.contains(&media.as_str())
}

/// Flatten a header map into lowercase names, repeated values joined with `", "`.
pub(crate) fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut out: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        out.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    out
}

/// Status message for a response.
///
/// The blocking client does not expose the reason phrase the server sent,
/// so this is the canonical phrase for the code, empty for unregistered codes.
pub(crate) fn status_message(status: StatusCode) -> String {
    status.canonical_reason().unwrap_or("").to_string()
}
