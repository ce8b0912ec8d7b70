//! In-memory transports for unit tests.

use crate::error::TransportError;
use crate::tools::fetch::{RawResponse, Transport, TransportRequest};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub(crate) const SAMPLE_HTML: &str = r#"<!DOCTYPE html><html><head><title>Sample page</title></head><body><h1>Hello</h1><p class="intro">first</p><p>second</p><a href="/next">next</a></body></html>"#;

/// Serves an HTML page for every URL and records each request.
pub(crate) struct StaticTransport {
    calls: AtomicUsize,
    seen: Mutex<Vec<TransportRequest>>,
    delay: Duration,
    body: String,
    content_type: String,
}

impl StaticTransport {
    pub(crate) fn new() -> Self {
        Self::with_body(SAMPLE_HTML, "text/html; charset=utf-8")
    }

    pub(crate) fn with_body(body: &str, content_type: &str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
            delay: Duration::ZERO,
            body: body.to_string(),
            content_type: content_type.to_string(),
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn requests(&self) -> Vec<TransportRequest> {
        self.seen.lock().unwrap().clone()
    }
}

impl Transport for StaticTransport {
    fn name(&self) -> &'static str {
        "static"
    }

    fn execute(&self, request: &TransportRequest) -> Result<RawResponse, TransportError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.seen.lock().unwrap().push(request.clone());
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        let mut headers = BTreeMap::new();
        headers.insert("server".to_string(), "static".to_string());
        headers.insert("content-type".to_string(), self.content_type.clone());
        headers.insert("x-call".to_string(), n.to_string());
        let mut cookies = BTreeMap::new();
        cookies.insert("session".to_string(), format!("s{n}"));

        Ok(RawResponse {
            url: request.url.clone(),
            status_code: 200,
            status_message: "OK".into(),
            headers,
            cookies,
            content_type: Some(self.content_type.clone()),
            body: self.body.clone(),
        })
    }
}

/// Times out the first `timeouts` calls, then answers like [`StaticTransport`].
pub(crate) struct FlakyTransport {
    timeouts: usize,
    inner: StaticTransport,
    calls: AtomicUsize,
}

impl FlakyTransport {
    pub(crate) fn new(timeouts: usize) -> Self {
        Self {
            timeouts,
            inner: StaticTransport::new(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Never succeeds.
    pub(crate) fn always() -> Self {
        Self::new(usize::MAX)
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transport for FlakyTransport {
    fn name(&self) -> &'static str {
        "flaky"
    }

    fn execute(&self, request: &TransportRequest) -> Result<RawResponse, TransportError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.timeouts {
            return Err(TransportError::Timeout(format!("attempt {}", n + 1)));
        }
        self.inner.execute(request)
    }
}

/// Fails every call with a non-timeout error.
pub(crate) struct BrokenTransport {
    calls: AtomicUsize,
}

impl BrokenTransport {
    pub(crate) fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transport for BrokenTransport {
    fn name(&self) -> &'static str {
        "broken"
    }

    fn execute(&self, _request: &TransportRequest) -> Result<RawResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(TransportError::Request("connection refused".into()))
    }
}
