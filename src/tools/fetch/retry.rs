use super::types::{RawResponse, TransportRequest};
use super::Transport;
use crate::error::{FetchError, TransportError};
use tracing::warn;

/// Classified result of one attempt.
#[derive(Debug)]
pub(crate) enum AttemptOutcome {
    Success(RawResponse),
    RetryableTimeout(TransportError),
    Fatal(TransportError),
}

impl From<Result<RawResponse, TransportError>> for AttemptOutcome {
    fn from(result: Result<RawResponse, TransportError>) -> Self {
        match result {
            Ok(response) => Self::Success(response),
            Err(e) if e.is_timeout() => Self::RetryableTimeout(e),
            Err(e) => Self::Fatal(e),
        }
    }
}

/// Response plus how many attempts it took.
#[derive(Debug)]
pub(crate) struct RetryResult {
    pub response: RawResponse,
    pub attempts: u32,
}

/// Run `request` until it succeeds, fails fatally, or times out
/// `retries_on_timeout + 1` times.
pub(crate) fn execute_with_retry(
    transport: &dyn Transport,
    request: &TransportRequest,
    retries_on_timeout: u32,
) -> Result<RetryResult, FetchError> {
    let max_attempts = retries_on_timeout.saturating_add(1);
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        match AttemptOutcome::from(transport.execute(request)) {
            AttemptOutcome::Success(response) => {
                return Ok(RetryResult { response, attempts });
            }
            AttemptOutcome::RetryableTimeout(e) => {
                if attempts >= max_attempts {
                    return Err(FetchError::TimeoutExceeded {
                        url: request.url.clone(),
                        attempts,
                    });
                }
                warn!(
                    url = %request.url,
                    attempt = attempts,
                    max_attempts,
                    "read timed out, retrying: {e}"
                );
            }
            AttemptOutcome::Fatal(source) => {
                return Err(FetchError::Transport {
                    url: request.url.clone(),
                    source,
                });
            }
        }
    }
}
