//! Unified error taxonomy for Oxidoo operations.
//!
//! Four failure classes cover every public operation:
//!
//! - [`Error::Validation`]: local, raised before any network interaction
//! - [`Error::Authentication`]: the remote rejected the credential exchange
//! - [`Error::RemoteFault`]: the remote call failed, carrying the
//!   [`Fault`] and the number of attempts made
//! - [`Error::CacheNotConfigured`]: caching was requested with no store
//!
//! [`Error::Config`] supplements these for construction-time
//! misconfiguration (builder missing a database, unparseable base URL).
//!
//! [`Fault`] is the classified description of a remote failure;
//! [`Fault::is_transient`] is the single source of truth the retry layer
//! consults.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Result type alias for Oxidoo operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by Oxidoo operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A per-call option failed validation; nothing was sent to the remote.
    #[error("invalid option `{option}`: {reason}")]
    Validation {
        /// Name of the offending option.
        option: String,
        /// The constraint that was violated.
        reason: String,
    },

    /// The remote rejected the credential exchange.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// A remote call failed after the given number of attempts.
    #[error("remote fault after {attempts} attempt(s): {fault}")]
    RemoteFault {
        /// The classified fault of the final attempt.
        fault: Fault,
        /// Attempts performed before giving up.
        attempts: u32,
    },

    /// Result caching was activated with no backing store attached.
    #[error("result caching requested but no cache store is attached")]
    CacheNotConfigured,

    /// The client was constructed with invalid or incomplete configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Shorthand for a [`Error::Validation`] naming the offending option.
    pub fn validation(option: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            option: option.into(),
            reason: reason.into(),
        }
    }
}

/// Classification of a remote failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// The transport could not complete the exchange (connection, IO).
    Transport,
    /// The exchange did not complete in time.
    Timeout,
    /// The request was malformed at the protocol level.
    Protocol,
    /// The remote reported an application-level error.
    Application,
    /// The remote reported a transient server-side condition.
    Server,
}

/// A classified remote failure.
///
/// Carried inside [`Error::RemoteFault`]; the `kind` decides whether the
/// dispatcher may retry the call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fault {
    /// Failure classification.
    pub kind: FaultKind,
    /// Remote fault code, when the remote supplied one.
    pub code: Option<i64>,
    /// Human-readable description.
    pub message: String,
}

impl Fault {
    fn new(kind: FaultKind, code: Option<i64>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code,
            message: message.into(),
        }
    }

    /// A transport-level failure (connection refused, broken pipe, DNS).
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Transport, None, message)
    }

    /// A timeout while waiting for the remote.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Timeout, None, message)
    }

    /// A malformed-request fault; retrying an identical call cannot help.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Protocol, None, message)
    }

    /// An application-level fault reported by the remote.
    pub fn application(code: Option<i64>, message: impl Into<String>) -> Self {
        Self::new(FaultKind::Application, code, message)
    }

    /// A transient server-side fault the remote marked as retriable.
    pub fn server(code: Option<i64>, message: impl Into<String>) -> Self {
        Self::new(FaultKind::Server, code, message)
    }

    /// Whether a retry policy may re-attempt a call that failed this way.
    ///
    /// Transport failures, timeouts, and server-marked-transient faults are
    /// safe to retry; malformed requests and application errors are not.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self.kind, FaultKind::Transport | FaultKind::Timeout | FaultKind::Server)
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{:?} fault (code {code}): {}", self.kind, self.message),
            None => write!(f, "{:?} fault: {}", self.kind, self.message),
        }
    }
}
