use crate::types::DeviceProfile;
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FetchError>;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("malformed url {url:?}: {reason}")]
    MalformedUrl { url: String, reason: String },

    #[error("timed out fetching {url} after {attempts} attempt(s)")]
    TimeoutExceeded { url: String, attempts: u32 },

    #[error("could not fetch {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: TransportError,
    },

    #[error("could not parse document from {url}: {reason}")]
    DocumentParse { url: String, reason: String },

    #[error("could not find fetched page with {0}")]
    PageNotFound(PageLookup),

    #[error("invalid css selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("invalid json body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config: {0}")]
    Config(String),
}

impl FetchError {
    pub fn malformed_url(url: &str, reason: impl fmt::Display) -> Self {
        Self::MalformedUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimeoutExceeded { .. })
    }
}

/// Failure reported by a transport for a single HTTP exchange.
///
/// Only [`TransportError::Timeout`] is retried by the fetch client.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("read timed out: {0}")]
    Timeout(String),

    #[error("unsupported content type {content_type:?}")]
    UnsupportedContentType { content_type: String },

    #[error("could not build http client: {0}")]
    Client(String),

    #[error("request failed: {0}")]
    Request(String),
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout(e.to_string())
        } else if e.is_builder() {
            TransportError::Client(e.to_string())
        } else {
            TransportError::Request(e.to_string())
        }
    }
}

/// The key a caller used to look up a previously fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageLookup {
    Index(usize),
    UrlSnippet(String),
    UrlSnippetAndDevice(String, DeviceProfile),
    Device(DeviceProfile),
    Latest,
}

impl fmt::Display for PageLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageLookup::Index(i) => write!(f, "index \"{i}\""),
            PageLookup::UrlSnippet(s) => write!(f, "url-snippet \"{s}\""),
            PageLookup::UrlSnippetAndDevice(s, d) => {
                write!(f, "url-snippet \"{s}\" and device {d}")
            }
            PageLookup::Device(d) => write!(f, "device {d}"),
            PageLookup::Latest => write!(f, "latest fetch"),
        }
    }
}
