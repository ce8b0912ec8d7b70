//! Fetched Page
//!
//! A received response plus the document parsed from it on first query.
//! The response never changes once received.

use crate::error::Result;
use crate::tools::document::{
    parse_document, select_count, select_elements, Document, ElementSnapshot, Materializer,
};
use crate::tools::fetch::RawResponse;
use crate::types::DeviceProfile;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

#[derive(Debug)]
pub struct FetchedPage {
    url: String,
    url_prefix: String,
    device: DeviceProfile,
    test_identity: String,
    fetched_at: DateTime<Utc>,
    response: RawResponse,
    document: Materializer<Document>,
}

impl FetchedPage {
    pub fn new(
        url: impl Into<String>,
        url_prefix: impl Into<String>,
        device: DeviceProfile,
        test_identity: impl Into<String>,
        response: RawResponse,
    ) -> Self {
        Self {
            url: url.into(),
            url_prefix: url_prefix.into(),
            device,
            test_identity: test_identity.into(),
            fetched_at: Utc::now(),
            response,
            document: Materializer::new(),
        }
    }

    /// Canonical URL the page was requested from.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// URL after redirects, as reported by the transport.
    pub fn final_url(&self) -> &str {
        &self.response.url
    }

    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    pub fn device(&self) -> DeviceProfile {
        self.device
    }

    pub fn is_mobile(&self) -> bool {
        self.device == DeviceProfile::Mobile
    }

    /// Identity of the test whose fetch produced this page.
    pub fn test_identity(&self) -> &str {
        &self.test_identity
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn response(&self) -> &RawResponse {
        &self.response
    }

    pub fn status_code(&self) -> u16 {
        self.response.status_code
    }

    pub fn status_message(&self) -> &str {
        &self.response.status_message
    }

    pub fn content_type(&self) -> Option<&str> {
        self.response.content_type.as_deref()
    }

    pub fn body(&self) -> &str {
        &self.response.body
    }

    /// Body decoded as JSON.
    pub fn json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::from_str(&self.response.body)?)
    }

    /// Header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.response.header(name)
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.response.headers
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }

    pub fn location(&self) -> Option<&str> {
        self.header("location")
    }

    pub fn cookies(&self) -> &BTreeMap<String, String> {
        &self.response.cookies
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.response.cookies.get(name).map(String::as_str)
    }

    pub fn has_cookie(&self, name: &str) -> bool {
        self.response.cookies.contains_key(name)
    }

    /// Whether the document has been parsed yet.
    pub fn is_parsed(&self) -> bool {
        self.document.is_materialized()
    }

    /// Run `f` against the parsed document, parsing it on first use.
    ///
    /// Concurrent callers share one parse. A parse failure is returned and
    /// retried on the next call.
    pub fn with_document<R>(&self, f: impl FnOnce(&Document) -> R) -> Result<R> {
        self.document.with(
            || parse_document(&self.url, &self.response.body, self.content_type()),
            f,
        )
    }

    pub fn element_count(&self, selector: &str) -> Result<usize> {
        self.with_document(|doc| select_count(doc, selector))?
    }

    pub fn is_element_present(&self, selector: &str) -> Result<bool> {
        Ok(self.element_count(selector)? > 0)
    }

    pub fn is_element_present_n_times(&self, selector: &str, occurrences: usize) -> Result<bool> {
        Ok(self.element_count(selector)? == occurrences)
    }

    pub fn elements(&self, selector: &str) -> Result<Vec<ElementSnapshot>> {
        self.with_document(|doc| select_elements(doc, selector))?
    }

    pub fn element(&self, selector: &str) -> Result<Option<ElementSnapshot>> {
        Ok(self.elements(selector)?.into_iter().next())
    }

    pub fn element_last_of(&self, selector: &str) -> Result<Option<ElementSnapshot>> {
        Ok(self.elements(selector)?.pop())
    }

    pub fn element_at(&self, selector: &str, index: usize) -> Result<Option<ElementSnapshot>> {
        Ok(self.elements(selector)?.into_iter().nth(index))
    }

    /// Page title text, if the document has one.
    pub fn title(&self) -> Result<Option<String>> {
        Ok(self.element("title")?.map(|el| el.text))
    }

    pub(crate) fn matches_url(&self, snippet: &str) -> bool {
        self.url.contains(snippet)
    }
}
