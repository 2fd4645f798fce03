//! Wire-level types for the Oxidoo client.
//!
//! This crate defines everything the other Oxidoo crates agree on at the
//! protocol boundary:
//!
//! - [`Endpoint`]: the three logical service paths exposed by the remote
//!   server (`common`, `object`, `report`)
//! - [`jsonrpc`]: the positional JSON-RPC 2.0 envelope carrying
//!   `{service, method, args}` call parameters
//! - [`Error`] / [`Fault`]: the unified error taxonomy, including the
//!   transient/non-transient fault classification the retry layer relies on
//! - [`methods`]: the fixed service-method names of the remote contract
//!
//! The wire protocol is a fixed external contract: method names and argument
//! order are reproduced exactly, never redesigned here.

pub mod endpoint;
pub mod error;
pub mod jsonrpc;
pub mod methods;

pub use endpoint::Endpoint;
pub use error::{Error, Fault, FaultKind, Result};
pub use jsonrpc::{CallParams, FaultPayload, JsonRpcVersion, RpcRequest, RpcResponse, RpcResponsePayload};
