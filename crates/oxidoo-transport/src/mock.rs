//! Scripted transport double for tests.

use std::collections::VecDeque;

use async_trait::async_trait;
use oxidoo_protocol::Endpoint;
use parking_lot::Mutex;
use serde_json::Value;

use crate::error::{TransportError, TransportResult};
use crate::Transport;

/// One recorded call as seen by the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// Endpoint the call addressed.
    pub endpoint: Endpoint,
    /// Service-method name.
    pub method: String,
    /// Positional arguments.
    pub args: Vec<Value>,
}

/// A transport that replays queued results and records every call.
///
/// Results are consumed front-to-back; running out of script yields a
/// [`TransportError::Internal`] so a test failure points at the script,
/// not at a hang.
#[derive(Debug, Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<TransportResult<Value>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTransport {
    /// Create an empty mock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful result.
    pub fn push_ok(&self, value: Value) {
        self.script.lock().push_back(Ok(value));
    }

    /// Queue a failure.
    pub fn push_err(&self, err: TransportError) {
        self.script.lock().push_back(Err(err));
    }

    /// All calls made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Number of calls made so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Number of calls naming the given service method.
    #[must_use]
    pub fn calls_to(&self, method: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.method == method).count()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn call(&self, endpoint: Endpoint, method: &str, args: Vec<Value>) -> TransportResult<Value> {
        self.calls.lock().push(RecordedCall {
            endpoint,
            method: method.to_string(),
            args,
        });
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Internal(format!("no scripted response for {endpoint}.{method}"))))
    }
}
