use crate::types::{CookieSet, DeviceProfile, HttpMethod};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// One HTTP exchange, fully resolved: URL is canonical, defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    pub url: String,
    pub method: HttpMethod,
    pub form: Vec<(String, String)>,
    pub device: DeviceProfile,
    pub user_agent: String,
    pub referrer: Option<String>,
    pub cookies: CookieSet,
    pub timeout: Duration,
}

/// What came back from the server. HTTP error statuses are ordinary responses.
///
/// Header names are lowercase; repeated headers are joined with `", "`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RawResponse {
    /// Final URL after any redirects.
    pub url: String,
    pub status_code: u16,
    pub status_message: String,
    pub headers: BTreeMap<String, String>,
    pub cookies: BTreeMap<String, String>,
    pub content_type: Option<String>,
    pub body: String,
}

impl RawResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}
