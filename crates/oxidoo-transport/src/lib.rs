//! Transport layer for the Oxidoo client.
//!
//! The [`Transport`] trait is the seam between the call-orchestration core
//! and the wire: one method, one positional RPC exchange. The crate ships
//! two implementations:
//!
//! - [`HttpTransport`]: JSON-RPC over HTTP via `reqwest`, with
//!   lazily-created per-endpoint handles
//! - [`mock::MockTransport`]: a scripted double for tests
//!
//! Serialization details and fault mapping stay on this side of the seam;
//! callers above it only ever see [`TransportError`] (already classified
//! into transient and non-transient failures via
//! [`oxidoo_protocol::Fault`]).

pub mod error;
pub mod http;
pub mod mock;

use async_trait::async_trait;
use oxidoo_protocol::Endpoint;
use serde_json::Value;

pub use error::{TransportError, TransportResult};
pub use http::{HttpTransport, HttpTransportConfig};

/// A positional RPC transport.
///
/// Implementations perform exactly one request/response exchange per
/// `call`; retry and caching decisions belong to the layers above.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Invoke `method` on the given logical endpoint with positional args.
    async fn call(&self, endpoint: Endpoint, method: &str, args: Vec<Value>) -> TransportResult<Value>;
}
