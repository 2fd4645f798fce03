//! Remote call dispatch with retry-on-transient-fault.
//!
//! The dispatcher performs the actual transport exchange and applies the
//! configured [`RetryPolicy`]: a fixed wait between attempts, no backoff.
//! Only transient faults (see [`Fault::is_transient`]) are ever retried;
//! non-retriable faults propagate immediately without consuming the
//! remaining attempts.
//!
//! The wait runs after every transient failure, before checking whether
//! attempts remain. With `max_attempts = 1` and retry enabled, a failing
//! call therefore sleeps once before the exhaustion is reported: identical
//! to retry disabled except for that wait. The wait never runs before the
//! first attempt.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::warn;

use oxidoo_protocol::{Endpoint, Error, Fault, Result};
use oxidoo_transport::Transport;

/// Retry configuration for remote calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Whether transient faults are retried at all.
    pub enabled: bool,
    /// Maximum attempts, including the first (≥ 1).
    pub max_attempts: u32,
    /// Fixed wait between attempts.
    pub wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::disabled()
    }
}

impl RetryPolicy {
    /// One attempt, faults propagate immediately.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            enabled: false,
            max_attempts: 1,
            wait: Duration::from_secs(1),
        }
    }

    /// Retry transient faults up to `max_attempts` with a fixed wait.
    #[must_use]
    pub const fn attempts(max_attempts: u32, wait: Duration) -> Self {
        Self {
            enabled: true,
            max_attempts,
            wait,
        }
    }
}

/// Performs remote calls, retrying as configured.
pub struct CallDispatcher {
    transport: Arc<dyn Transport>,
}

impl CallDispatcher {
    /// Create a dispatcher over the given transport.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Invoke `method` on `endpoint` with the given positional parameters.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::RemoteFault`] carrying the classified fault of
    /// the final attempt and the number of attempts performed.
    pub async fn invoke(
        &self,
        endpoint: Endpoint,
        method: &str,
        params: Vec<Value>,
        retry: &RetryPolicy,
    ) -> Result<Value> {
        let mut attempt: u32 = 1;
        loop {
            match self.transport.call(endpoint, method, params.clone()).await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    let fault = Fault::from(err);
                    if !retry.enabled || !fault.is_transient() {
                        return Err(Error::RemoteFault { fault, attempts: attempt });
                    }

                    warn!(
                        endpoint = %endpoint,
                        method,
                        attempt,
                        max_attempts = retry.max_attempts,
                        %fault,
                        "transient fault"
                    );
                    tokio::time::sleep(retry.wait).await;

                    if attempt >= retry.max_attempts {
                        return Err(Error::RemoteFault { fault, attempts: attempt });
                    }
                    attempt += 1;
                }
            }
        }
    }
}

impl std::fmt::Debug for CallDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallDispatcher").finish_non_exhaustive()
    }
}
