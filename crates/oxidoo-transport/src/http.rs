//! JSON-RPC over HTTP transport.
//!
//! All three logical endpoints share the server's single `/jsonrpc` path;
//! the endpoint name travels in the `service` field of the call envelope.
//! A handle per endpoint is still created lazily and cached for the
//! lifetime of the transport: each handle owns its resolved URL and its
//! clone of the underlying HTTP client, so repeated calls never re-parse
//! the URL. The handle map is guarded by a `RwLock` because transports are
//! routinely shared across tasks.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::Client as HttpClient;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use oxidoo_protocol::jsonrpc::{RpcRequest, RpcResponse, RpcResponsePayload};
use oxidoo_protocol::Endpoint;

use crate::error::{TransportError, TransportResult};
use crate::Transport;

/// Path all JSON-RPC traffic goes through.
const RPC_PATH: &str = "/jsonrpc";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP transport configuration.
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Base URL of the server (e.g. `https://erp.example.com`).
    pub base_url: String,

    /// Request timeout.
    pub timeout: Duration,

    /// User agent string (set to `None` to disable the header).
    pub user_agent: Option<String>,

    /// Extra headers sent with every request.
    pub headers: HashMap<String, String>,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8069".to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: Some(format!("oxidoo/{}", env!("CARGO_PKG_VERSION"))),
            headers: HashMap::new(),
        }
    }
}

/// Cached per-endpoint state: the resolved URL and an HTTP client clone.
struct EndpointHandle {
    endpoint: Endpoint,
    url: Url,
    http: HttpClient,
}

/// JSON-RPC HTTP transport.
pub struct HttpTransport {
    config: HttpTransportConfig,
    http: HttpClient,
    endpoints: RwLock<HashMap<Endpoint, Arc<EndpointHandle>>>,
    next_id: AtomicU64,
}

impl HttpTransport {
    /// Create a transport for the configured server.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ConfigurationError`] when the base URL does
    /// not parse or the HTTP client cannot be constructed.
    pub fn new(config: HttpTransportConfig) -> TransportResult<Self> {
        // URL misconfiguration surfaces at construction, not on the first
        // call.
        Url::parse(&config.base_url)
            .map_err(|e| TransportError::ConfigurationError(format!("invalid base url `{}`: {e}", config.base_url)))?;

        let mut builder = HttpClient::builder().timeout(config.timeout);
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        if !config.headers.is_empty() {
            let mut headers = reqwest::header::HeaderMap::new();
            for (name, value) in &config.headers {
                let name = reqwest::header::HeaderName::from_bytes(name.as_bytes())
                    .map_err(|e| TransportError::ConfigurationError(format!("invalid header name `{name}`: {e}")))?;
                let value = reqwest::header::HeaderValue::from_str(value)
                    .map_err(|e| TransportError::ConfigurationError(format!("invalid header value: {e}")))?;
                headers.insert(name, value);
            }
            builder = builder.default_headers(headers);
        }
        let http = builder
            .build()
            .map_err(|e| TransportError::ConfigurationError(e.to_string()))?;

        Ok(Self {
            config,
            http,
            endpoints: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        })
    }

    /// Fetch or lazily create the handle for an endpoint.
    fn handle(&self, endpoint: Endpoint) -> TransportResult<Arc<EndpointHandle>> {
        if let Some(handle) = self.endpoints.read().get(&endpoint) {
            return Ok(Arc::clone(handle));
        }

        let mut endpoints = self.endpoints.write();
        // Another task may have raced us here.
        if let Some(handle) = endpoints.get(&endpoint) {
            return Ok(Arc::clone(handle));
        }

        let base = Url::parse(&self.config.base_url)
            .map_err(|e| TransportError::ConfigurationError(e.to_string()))?;
        let url = base
            .join(RPC_PATH)
            .map_err(|e| TransportError::ConfigurationError(e.to_string()))?;
        debug!(endpoint = %endpoint, url = %url, "created endpoint handle");

        let handle = Arc::new(EndpointHandle {
            endpoint,
            url,
            http: self.http.clone(),
        });
        endpoints.insert(endpoint, Arc::clone(&handle));
        Ok(handle)
    }

    fn classify(err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::ConnectionFailed(err.to_string())
        } else if err.is_request() {
            TransportError::SendFailed(err.to_string())
        } else if err.is_decode() {
            TransportError::SerializationFailed(err.to_string())
        } else {
            TransportError::ReceiveFailed(err.to_string())
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(&self, endpoint: Endpoint, method: &str, args: Vec<Value>) -> TransportResult<Value> {
        let handle = self.handle(endpoint)?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::new(id, handle.endpoint, method, args);
        debug!(endpoint = %endpoint, method, id, "sending rpc request");

        let response = handle
            .http
            .post(handle.url.clone())
            .json(&request)
            .send()
            .await
            .map_err(Self::classify)?;

        let status = response.status();
        if status.is_server_error() {
            return Err(TransportError::Unavailable(format!("server returned {status}")));
        }
        if !status.is_success() {
            return Err(TransportError::ProtocolError(format!("unexpected HTTP status {status}")));
        }

        let response: RpcResponse = response.json().await.map_err(Self::classify)?;
        if response.id != Some(id) {
            warn!(expected = id, got = ?response.id, "rpc response id mismatch");
        }

        match response.payload {
            RpcResponsePayload::Success { result } => Ok(result),
            RpcResponsePayload::Error { error } => {
                let fault = error.into_fault();
                debug!(endpoint = %endpoint, method, %fault, "remote fault");
                Err(TransportError::Remote(fault))
            }
        }
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.config.base_url)
            .field("timeout", &self.config.timeout)
            .field("endpoints", &self.endpoints.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_base_url_rejected() {
        let config = HttpTransportConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        let result = HttpTransport::new(config);
        assert!(matches!(result, Err(TransportError::ConfigurationError(_))));
    }

    #[test]
    fn test_handles_are_cached_per_endpoint() {
        let transport = HttpTransport::new(HttpTransportConfig::default()).unwrap();
        let first = transport.handle(Endpoint::Common).unwrap();
        let second = transport.handle(Endpoint::Common).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        transport.handle(Endpoint::Object).unwrap();
        assert_eq!(transport.endpoints.read().len(), 2);
    }
}
