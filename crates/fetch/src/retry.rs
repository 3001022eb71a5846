use crate::backoff::compute_backoff;
use crate::error::{ErrorKind, Result};
use crate::http::{ByteStream, HttpClient};
use exn::OptionExt;
use std::time::Duration;

/// Retry policy for a download session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries after the first attempt; total attempts are `retries + 1`.
    pub retries: u32,
    /// Base wait between attempts, see [`compute_backoff`].
    pub sleep: Duration,
    /// Double the wait after every failed retry.
    pub exponential: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retries: 3,
            sleep: Duration::ZERO,
            exponential: false,
        }
    }
}

impl RetryConfig {
    pub fn total_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }
}

/// Fetch `url`, retrying failed attempts according to `config`.
///
/// An attempt fails when the client reports a transport error, when the
/// status is outside `200..300`, or when the response has no body. Between
/// failed attempts the task sleeps for
/// [`compute_backoff(attempt, sleep, exponential)`](compute_backoff). The
/// first successful body is returned immediately.
///
/// Once all `retries + 1` attempts have failed, the result is an
/// [`Exhausted`](ErrorKind::Exhausted) error carrying `label` (usually the
/// file name) and the last attempt's failure, raised on top of that failure.
pub async fn fetch_with_retry(
    client: &dyn HttpClient,
    url: &str,
    config: &RetryConfig,
    label: Option<&str>,
) -> Result<ByteStream> {
    let mut attempts = 0_u32;
    loop {
        let err = match attempt(client, url).await {
            Ok(body) => return Ok(body),
            Err(err) => err,
        };
        attempts += 1;
        tracing::warn!(url, attempt = attempts, of = config.total_attempts(), error = %*err, "Fetch attempt failed");
        if attempts > config.retries {
            let message = (*err).to_string();
            return Err(err.raise(ErrorKind::Exhausted {
                label: label.map(str::to_string),
                message,
                attempts,
            }));
        }
        let delay = compute_backoff(attempts, config.sleep, config.exponential);
        if !delay.is_zero() {
            tracing::debug!(url, delay_ms = delay.as_millis() as u64, "Backing off before retry");
            tokio::time::sleep(delay).await;
        }
    }
}

async fn attempt(client: &dyn HttpClient, url: &str) -> Result<ByteStream> {
    let response = client.get(url).await?;
    if !response.is_success() {
        exn::bail!(ErrorKind::Status {
            code: response.status,
            reason: response.reason,
        });
    }
    response.body.ok_or_raise(|| ErrorKind::EmptyBody)
}
