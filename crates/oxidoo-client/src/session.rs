//! Lazy session management.
//!
//! The session (uid + remote user context) is established on the first
//! authenticated call and then treated as immutable for the life of the
//! client. When a cache store is attached, the session is also persisted
//! under [`AUTH_CACHE_KEY`] for 30 minutes, so a freshly started process
//! can adopt a still-valid session instead of logging in again.
//!
//! The whole establish path runs under a `tokio::sync::Mutex`, which gives
//! single-flight semantics: concurrent first users of one client instance
//! trigger exactly one remote login.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use oxidoo_protocol::{methods, Endpoint, Error, Result};
use oxidoo_transport::Transport;

use crate::cache::CacheStore;
use crate::client::Credentials;

/// Store key of the persisted session entry.
pub(crate) const AUTH_CACHE_KEY: &str = "__authentication";

/// Lifetime of the persisted session entry.
const AUTH_CACHE_TTL: Duration = Duration::from_secs(30 * 60);

/// Model and method answering the user-context fetch.
const CONTEXT_MODEL: &str = "res.users";
const CONTEXT_METHOD: &str = "context_get";

/// An authenticated session: numeric user id plus remote user context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Numeric user id returned by the login exchange.
    pub uid: i64,
    /// Remote user context (language, timezone, ...).
    #[serde(default)]
    pub context: Map<String, Value>,
}

/// Wire shape of the persisted `__authentication` entry.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedSession {
    uid: i64,
    #[serde(default)]
    context: Map<String, Value>,
    authenticated_at: DateTime<Utc>,
}

/// Lazily authenticates and caches the session.
pub struct SessionManager {
    transport: Arc<dyn Transport>,
    store: Option<Arc<dyn CacheStore>>,
    credentials: Arc<Credentials>,
    state: tokio::sync::Mutex<Option<Session>>,
}

impl SessionManager {
    /// Create a manager over the given transport and optional store.
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Option<Arc<dyn CacheStore>>,
        credentials: Arc<Credentials>,
    ) -> Self {
        Self {
            transport,
            store,
            credentials,
            state: tokio::sync::Mutex::new(None),
        }
    }

    /// The current session, establishing it on first use.
    ///
    /// Resolution order: in-process session, persisted store entry, remote
    /// login. The lock is held across the whole path, so concurrent callers
    /// reuse one in-flight authentication.
    ///
    /// # Errors
    ///
    /// Any failure of the credential exchange - a rejected login, a failed
    /// context fetch, or a transport failure on the way - surfaces as
    /// [`Error::Authentication`]. This layer never retries.
    pub async fn current(&self) -> Result<Session> {
        let mut state = self.state.lock().await;
        if let Some(session) = &*state {
            return Ok(session.clone());
        }

        if let Some(session) = self.restore() {
            *state = Some(session.clone());
            return Ok(session);
        }

        let session = self.login().await?;
        self.persist(&session);
        *state = Some(session.clone());
        Ok(session)
    }

    /// Drop the in-process session; the next call re-establishes it.
    ///
    /// The persisted store entry is left to expire on its own TTL.
    pub async fn invalidate(&self) {
        *self.state.lock().await = None;
    }

    fn restore(&self) -> Option<Session> {
        let store = self.store.as_ref()?;
        let value = store.get(AUTH_CACHE_KEY)?;
        match serde_json::from_value::<PersistedSession>(value) {
            Ok(persisted) => {
                debug!(
                    uid = persisted.uid,
                    authenticated_at = %persisted.authenticated_at,
                    "restored session from cache store"
                );
                Some(Session {
                    uid: persisted.uid,
                    context: persisted.context,
                })
            }
            Err(e) => {
                debug!(error = %e, "ignoring malformed persisted session");
                None
            }
        }
    }

    fn persist(&self, session: &Session) {
        let Some(store) = &self.store else { return };
        let persisted = PersistedSession {
            uid: session.uid,
            context: session.context.clone(),
            authenticated_at: Utc::now(),
        };
        match serde_json::to_value(&persisted) {
            Ok(value) => store.set(AUTH_CACHE_KEY, value, Some(AUTH_CACHE_TTL)),
            Err(e) => debug!(error = %e, "failed to serialize session for persistence"),
        }
    }

    async fn login(&self) -> Result<Session> {
        let credentials = &self.credentials;
        let uid_value = self
            .transport
            .call(
                Endpoint::Common,
                methods::LOGIN,
                vec![
                    json!(credentials.database),
                    json!(credentials.username),
                    json!(credentials.password),
                ],
            )
            .await
            .map_err(|e| Error::Authentication(e.to_string()))?;

        // A rejected login answers `false` (or 0) instead of a fault.
        let uid = uid_value.as_i64().filter(|uid| *uid > 0).ok_or_else(|| {
            Error::Authentication(format!(
                "login rejected for user `{}` on database `{}`",
                credentials.username, credentials.database
            ))
        })?;

        let context_value = self
            .transport
            .call(
                Endpoint::Object,
                methods::EXECUTE,
                vec![
                    json!(credentials.database),
                    json!(uid),
                    json!(credentials.password),
                    json!(CONTEXT_MODEL),
                    json!(CONTEXT_METHOD),
                ],
            )
            .await
            .map_err(|e| Error::Authentication(format!("user context fetch failed: {e}")))?;
        let context = context_value.as_object().cloned().unwrap_or_default();

        info!(uid, database = %credentials.database, "authenticated");
        Ok(Session { uid, context })
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("credentials", &self.credentials)
            .field("store", &self.store.is_some())
            .finish()
    }
}
