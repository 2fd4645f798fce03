//! Positional JSON-RPC 2.0 envelope.
//!
//! The remote speaks JSON-RPC 2.0 with a single envelope method, `call`,
//! whose parameters name the logical service, the service method, and the
//! positional argument array:
//!
//! ```json
//! {
//!   "jsonrpc": "2.0",
//!   "method": "call",
//!   "params": {"service": "object", "method": "execute", "args": [...]},
//!   "id": 7
//! }
//! ```
//!
//! Responses carry either `result` or `error`, never both; the untagged
//! [`RpcResponsePayload`] enforces the mutual exclusion at the type level.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::endpoint::Endpoint;
use crate::error::Fault;

/// JSON-RPC version constant.
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC version marker type.
///
/// Serializes as the literal `"2.0"` and refuses anything else on the way
/// back in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonRpcVersion;

impl Serialize for JsonRpcVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(JSONRPC_VERSION)
    }
}

impl<'de> Deserialize<'de> for JsonRpcVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let version = String::deserialize(deserializer)?;
        if version == JSONRPC_VERSION {
            Ok(JsonRpcVersion)
        } else {
            Err(serde::de::Error::custom(format!(
                "invalid JSON-RPC version: expected '{JSONRPC_VERSION}', got '{version}'"
            )))
        }
    }
}

/// Call parameters: service, service method, positional arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallParams {
    /// Logical endpoint the call addresses.
    pub service: Endpoint,
    /// Service-method name (see [`crate::methods`]).
    pub method: String,
    /// Positional argument array, exactly as the remote expects it.
    pub args: Vec<Value>,
}

/// An outgoing RPC request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    /// JSON-RPC version marker.
    pub jsonrpc: JsonRpcVersion,
    /// Envelope method; always `call` for this protocol.
    pub method: String,
    /// Call parameters.
    pub params: CallParams,
    /// Request identifier, echoed back by the remote.
    pub id: u64,
}

impl RpcRequest {
    /// Build a request addressing `service.method(args)`.
    #[must_use]
    pub fn new(id: u64, service: Endpoint, method: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            method: crate::methods::CALL.to_string(),
            params: CallParams {
                service,
                method: method.into(),
                args,
            },
            id,
        }
    }
}

/// Response payload: mutually exclusive result or fault.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcResponsePayload {
    /// Successful response.
    Success {
        /// The call result.
        result: Value,
    },
    /// Fault response.
    Error {
        /// The remote-reported fault.
        error: FaultPayload,
    },
}

/// An incoming RPC response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    /// JSON-RPC version marker.
    pub jsonrpc: JsonRpcVersion,
    /// Identifier of the request this answers; `None` on parse errors.
    #[serde(default)]
    pub id: Option<u64>,
    /// Result or fault.
    #[serde(flatten)]
    pub payload: RpcResponsePayload,
}

/// Wire shape of a remote fault.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaultPayload {
    /// Remote fault code.
    pub code: i64,
    /// Remote fault message.
    pub message: String,
    /// Optional structured detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// JSON-RPC codes that mark the request itself as malformed.
const PROTOCOL_CODES: [i64; 4] = [-32700, -32600, -32601, -32602];

impl FaultPayload {
    /// Classify this payload into a [`Fault`].
    ///
    /// Protocol-range codes become non-retriable [`Fault::protocol`] faults.
    /// A payload whose `data.transient` is `true` is a retriable
    /// [`Fault::server`] fault; everything else is an application fault.
    #[must_use]
    pub fn into_fault(self) -> Fault {
        if PROTOCOL_CODES.contains(&self.code) {
            return Fault::protocol(self.message);
        }
        let transient = self
            .data
            .as_ref()
            .and_then(|data| data.get("transient"))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if transient {
            Fault::server(Some(self.code), self.message)
        } else {
            Fault::application(Some(self.code), self.message)
        }
    }
}
