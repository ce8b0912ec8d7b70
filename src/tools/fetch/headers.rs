use super::types::TransportRequest;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE, REFERER, USER_AGENT};

/// Build the request headers: user agent, referrer and explicit cookies.
pub(crate) fn headers_for_request(request: &TransportRequest) -> HeaderMap {
    let mut headers = HeaderMap::new();

    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&request.user_agent)
            .unwrap_or(HeaderValue::from_static("Mozilla/5.0")),
    );

    if let Some(referrer) = request.referrer.as_deref().filter(|r| !r.is_empty()) {
        if let Ok(value) = HeaderValue::from_str(referrer) {
            headers.insert(REFERER, value);
        }
    }

    if let Some(cookie) = request.cookies.header_value() {
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            headers.insert(COOKIE, value);
        }
    }

    headers
}
