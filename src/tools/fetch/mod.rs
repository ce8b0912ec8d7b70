//! Fetch Tools
//!
//! One HTTP exchange per call, retried only on read timeouts. The HTTP
//! stack sits behind [`Transport`] so the engine can run against any client.

mod client;
mod headers;
mod retry;
mod utils;

pub mod types;

pub use client::ReqwestTransport;
pub use types::*;

pub(crate) use utils::media_type;

use crate::error::{Result, TransportError};
use tracing::info;

/// HTTP transport capability.
///
/// Implementations surface HTTP error statuses as ordinary responses and
/// report read timeouts as [`TransportError::Timeout`].
pub trait Transport: Send + Sync {
    fn name(&self) -> &'static str;
    fn execute(&self, request: &TransportRequest) -> std::result::Result<RawResponse, TransportError>;
}

/// Fetch `request`, retrying up to `retries_on_timeout` extra times on read timeouts.
///
/// Any other transport failure is returned at once. Once retries are spent
/// the call fails with [`FetchError::TimeoutExceeded`](crate::error::FetchError::TimeoutExceeded).
pub fn fetch(
    transport: &dyn Transport,
    request: &TransportRequest,
    retries_on_timeout: u32,
) -> Result<RawResponse> {
    info!(
        "fetching {} ({}, via {})",
        request.url,
        request.device,
        transport.name()
    );
    let result = retry::execute_with_retry(transport, request, retries_on_timeout)?;
    if result.attempts > 1 {
        info!(url = %request.url, attempts = result.attempts, "fetched after retry");
    }
    Ok(result.response)
}
