//! Document Tools
//!
//! Lazy, parse-once document materialization and CSS element queries.

mod utils;

pub mod types;

pub use types::*;

use crate::error::{FetchError, Result};
use std::sync::{Mutex, PoisonError};
use tracing::debug;
use utils::*;

/// A slot filled on first access and never again.
///
/// Access is serialized per instance, so concurrent first calls run the
/// initializer once. A failed initializer leaves the slot empty.
#[derive(Debug)]
pub struct Materializer<T> {
    slot: Mutex<Option<T>>,
}

impl<T> Materializer<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    pub fn is_materialized(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Run `f` against the stored value, creating it with `init` if absent.
    pub fn with<R, E>(
        &self,
        init: impl FnOnce() -> std::result::Result<T, E>,
        f: impl FnOnce(&T) -> R,
    ) -> std::result::Result<R, E> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(value) = slot.as_ref() {
            return Ok(f(value));
        }
        let value = slot.insert(init()?);
        Ok(f(value))
    }
}

impl<T> Default for Materializer<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a response body into a document.
///
/// Bodies declared as binary media (images, archives, ...) are rejected.
pub fn parse_document(url: &str, body: &str, content_type: Option<&str>) -> Result<Document> {
    if let Some(reason) = unparseable_reason(content_type) {
        return Err(FetchError::DocumentParse {
            url: url.to_string(),
            reason,
        });
    }
    debug!(url, bytes = body.len(), "parsing document");
    Ok(Document::parse_document(body))
}

/// Number of elements matching `selector`.
pub fn select_count(document: &Document, selector: &str) -> Result<usize> {
    let selector = parse_selector(selector)?;
    Ok(count_matches(document, &selector))
}

/// Snapshots of all elements matching `selector`, in document order.
pub fn select_elements(document: &Document, selector: &str) -> Result<Vec<ElementSnapshot>> {
    let selector = parse_selector(selector)?;
    Ok(snapshot_matches(document, &selector))
}
