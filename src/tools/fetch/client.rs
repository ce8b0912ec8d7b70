use super::headers::headers_for_request;
use super::types::{RawResponse, TransportRequest};
use super::utils::{collect_headers, is_markup_content_type, status_message};
use super::Transport;
use crate::config::Config;
use crate::error::TransportError;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::{redirect, Proxy};

const REDIRECT_LIMIT: usize = 10;

/// Build a blocking client from the configured proxy and redirect policy.
///
/// Certificate validation is off; fetched pages are test targets.
pub(crate) fn build_client(config: &Config) -> Result<Client, TransportError> {
    let redirect_policy = if config.follow_redirects {
        redirect::Policy::limited(REDIRECT_LIMIT)
    } else {
        redirect::Policy::none()
    };

    let mut builder = Client::builder()
        .danger_accept_invalid_certs(true)
        .redirect(redirect_policy)
        .gzip(true)
        .brotli(true)
        .deflate(true)
        .timeout(config.timeout());

    if let Some((host, port)) = config.proxy() {
        let proxy = Proxy::all(format!("http://{host}:{port}"))
            .map_err(|e| TransportError::Client(format!("invalid proxy {host}:{port}: {e}")))?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| TransportError::Client(e.to_string()))
}

/// Transport backed by a shared blocking `reqwest` client.
pub struct ReqwestTransport {
    client: Client,
    ignore_content_type: bool,
}

impl ReqwestTransport {
    pub fn new(config: &Config) -> Result<Self, TransportError> {
        Ok(Self {
            client: build_client(config)?,
            ignore_content_type: config.ignore_content_type,
        })
    }
}

impl Transport for ReqwestTransport {
    fn name(&self) -> &'static str {
        "reqwest-blocking"
    }

    fn execute(&self, request: &TransportRequest) -> Result<RawResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method.as_reqwest(), &request.url)
            .headers(headers_for_request(request))
            .timeout(request.timeout);

        if !request.form.is_empty() {
            builder = if request.method.sends_form_as_query() {
                builder.query(&request.form)
            } else {
                builder.form(&request.form)
            };
        }

        let response = builder.send()?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        if !self.ignore_content_type {
            if let Some(ct) = content_type.as_deref().filter(|ct| !is_markup_content_type(ct)) {
                return Err(TransportError::UnsupportedContentType {
                    content_type: ct.to_string(),
                });
            }
        }

        let status = response.status();
        let headers = collect_headers(response.headers());
        let cookies = response
            .cookies()
            .map(|c| (c.name().to_string(), c.value().to_string()))
            .collect();
        let url = response.url().to_string();
        let body = response.text()?;

        Ok(RawResponse {
            url,
            status_code: status.as_u16(),
            status_message: status_message(status),
            headers,
            cookies,
            content_type,
            body,
        })
    }
}
