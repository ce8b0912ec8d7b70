//! URL Tools
//!
//! Composes the canonical URL a page is fetched from and cached under:
//! `scheme://[prefix.]host[:port][path][?query]`.

mod utils;

use crate::config::Config;
use crate::error::{FetchError, Result};
use crate::types::Protocol;
use url::Url;
use utils::*;

/// Builds canonical URLs against a default protocol and port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlBuilder {
    default_protocol: String,
    default_port: String,
}

impl UrlBuilder {
    pub fn new(default_protocol: &str, default_port: &str) -> Self {
        Self {
            default_protocol: normalize_scheme(default_protocol),
            default_port: default_port.trim().to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.protocol, &config.port)
    }

    /// Compose the canonical URL for `raw`.
    ///
    /// A non-empty `prefix` becomes a subdomain. The port is `port_override`
    /// if non-empty, else the default port, else omitted. A port written in
    /// `raw` itself is dropped.
    pub fn build(
        &self,
        raw: &str,
        protocol: Protocol,
        prefix: &str,
        port_override: &str,
    ) -> Result<String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(FetchError::malformed_url(raw, "empty url"));
        }

        let (raw_scheme, rest) = split_scheme(raw);
        let scheme = match (protocol.scheme(), raw_scheme) {
            (Some(explicit), _) => explicit.to_string(),
            (None, Some(from_raw)) => normalize_scheme(from_raw),
            (None, None) => self.default_protocol.clone(),
        };

        let prefix = prefix.trim().trim_end_matches('.');
        let prefixed = if prefix.is_empty() {
            rest.to_string()
        } else {
            format!("{prefix}.{rest}")
        };

        let composed = format!("{scheme}://{prefixed}");
        let parsed = Url::parse(&composed).map_err(|e| FetchError::malformed_url(&composed, e))?;
        let host = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| FetchError::malformed_url(&composed, "missing host"))?;

        let port = resolve_port(port_override, &self.default_port)
            .map_err(|reason| FetchError::malformed_url(&composed, reason))?;

        let path = if parsed.path() == "/" && !has_explicit_path(rest) {
            ""
        } else {
            parsed.path()
        };
        let query = parsed.query().map(|q| format!("?{q}")).unwrap_or_default();

        Ok(format!("{scheme}://{host}{port}{path}{query}"))
    }
}

impl Default for UrlBuilder {
    fn default() -> Self {
        Self::new("http", "")
    }
}

/// One-shot composition with an explicit default port and `http` default protocol.
pub fn build_url(
    raw: &str,
    protocol: Protocol,
    prefix: &str,
    port_override: &str,
    default_port: &str,
) -> Result<String> {
    UrlBuilder::new("http", default_port).build(raw, protocol, prefix, port_override)
}
