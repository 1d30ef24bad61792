//! Retrying transport call.

use std::time::Duration;

use dashmap::DashMap;
use netopt_core::{Request, RequestKey, Transport, TransportError, TransportResponse};
use tracing::{debug, warn};

use crate::metrics::Counters;
use crate::{FetchError, RetryPolicy};

/// Number of failed attempts per key for calls that are currently retrying.
///
/// An entry is created on the first failure and removed on success or final
/// failure, so the table only ever holds keys with a retry sequence running.
#[derive(Debug, Default)]
pub(crate) struct RetryStates {
    attempts: DashMap<RequestKey, u32>,
}

impl RetryStates {
    pub(crate) fn attempts_made(&self, key: &RequestKey) -> u32 {
        self.attempts.get(key).map_or(0, |attempts| *attempts)
    }

    fn record_failure(&self, key: &RequestKey) -> u32 {
        let mut attempts = self.attempts.entry(key.clone()).or_insert(0);
        *attempts += 1;
        *attempts
    }

    fn clear(&self, key: &RequestKey) {
        self.attempts.remove(key);
    }
}

pub(crate) struct RetryContext<'a, T> {
    pub(crate) transport: &'a T,
    pub(crate) policy: RetryPolicy,
    pub(crate) timeout: Duration,
    pub(crate) states: &'a RetryStates,
    pub(crate) counters: &'a Counters,
}

impl<T: Transport> RetryContext<'_, T> {
    /// Sends `request`, retrying transient failures with exponential backoff.
    ///
    /// A call that keeps failing transiently is attempted
    /// `max_retries + 1` times. Client and auth failures are attempted once.
    pub(crate) async fn call(
        &self,
        key: &RequestKey,
        request: &Request,
    ) -> Result<TransportResponse, FetchError> {
        loop {
            self.counters.network_call();
            let outcome = match tokio::time::timeout(self.timeout, self.transport.send(request)).await
            {
                Ok(result) => result.and_then(TransportResponse::error_for_status),
                Err(_) => Err(TransportError::Timeout(self.timeout)),
            };

            let error = match outcome {
                Ok(response) => {
                    self.states.clear(key);
                    return Ok(response);
                }
                Err(error) => error,
            };

            let attempts_made = self.states.attempts_made(key);
            if error.is_retryable() && attempts_made < self.policy.max_retries() {
                let delay = self.policy.delay_for_attempt(attempts_made);
                let attempt = self.states.record_failure(key);
                debug!(
                    %key,
                    attempt,
                    delay_ms = delay.as_millis(),
                    class = ?error.class(),
                    error = %error,
                    "transient failure, retrying"
                );
                self.counters.retry();
                tokio::time::sleep(delay).await;
                continue;
            }

            self.states.clear(key);
            self.counters.failure();
            warn!(%key, attempts = attempts_made + 1, error = %error, "request failed");
            return Err(FetchError::Transport {
                source: error,
                attempts: attempts_made + 1,
            });
        }
    }
}
