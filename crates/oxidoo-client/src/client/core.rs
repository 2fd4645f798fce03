//! The client core: public operations and their orchestration.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use oxidoo_protocol::{methods, Endpoint, Error, Fault, Result};
use oxidoo_transport::Transport;

use crate::cache::key::derive_key;
use crate::cache::{CacheStore, ResultCache};
use crate::dispatcher::{CallDispatcher, RetryPolicy};
use crate::options::{resolve, DefaultOptions, OperationKind, Options, ResolvedOptions};
use crate::params::{merge_context, operation_args, ParameterBuilder};
use crate::report::{parse_render, RenderState, RenderedReport};
use crate::session::{Session, SessionManager};

use super::config::Credentials;
use super::ClientBuilder;

/// Fixed wait between report polls.
const REPORT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Polls before a queued report is given up on.
const MAX_REPORT_POLLS: u32 = 20;

/// An authenticated client for one database on one server.
///
/// All operations are async and complete their network interaction within
/// the awaited call; the client spawns no background tasks. The instance is
/// cheap to share behind an `Arc` - session and cache state are internally
/// synchronized.
pub struct Client {
    session: SessionManager,
    cache: ResultCache,
    dispatcher: CallDispatcher,
    params: ParameterBuilder,
    retry: RetryPolicy,
    defaults: DefaultOptions,
}

impl Client {
    /// Start building a client.
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub(super) fn from_parts(
        transport: Arc<dyn Transport>,
        credentials: Arc<Credentials>,
        store: Option<Arc<dyn CacheStore>>,
        retry: RetryPolicy,
        defaults: DefaultOptions,
    ) -> Self {
        Self {
            session: SessionManager::new(Arc::clone(&transport), store.clone(), Arc::clone(&credentials)),
            cache: ResultCache::new(store),
            dispatcher: CallDispatcher::new(transport),
            params: ParameterBuilder::new(credentials),
            retry,
            defaults,
        }
    }

    /// Arm the result cache for the next read-like call.
    ///
    /// The activation is strictly single-use: it covers exactly one
    /// following `search`/`search_read`/`search_count`/`read`/`read_group`
    /// call, hit or miss, and must be re-armed for every call that should
    /// touch the cache.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::CacheNotConfigured`] when the client was built
    /// without a cache store.
    pub fn activate_cache(&self, ttl: Option<Duration>) -> Result<()> {
        self.cache.activate(ttl)
    }

    /// The current session, authenticating on first use.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Authentication`] when the credential exchange
    /// fails.
    pub async fn current_session(&self) -> Result<Session> {
        self.session.current().await
    }

    /// Drop the in-process session; the next call authenticates again.
    pub async fn invalidate_session(&self) {
        self.session.invalidate().await;
    }

    /// Probe the server version. Requires no authentication.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::RemoteFault`] when the call fails.
    pub async fn version(&self) -> Result<Value> {
        self.dispatcher
            .invoke(Endpoint::Common, methods::VERSION, vec![], &self.retry)
            .await
    }

    /// Search for matching record ids.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Validation`] before any network interaction on a
    /// bad options bag, [`Error::Authentication`] on a failed credential
    /// exchange, or [`Error::RemoteFault`] when the call fails.
    pub async fn search(&self, options: Options) -> Result<Value> {
        let resolved = resolve(OperationKind::Search, &options, &self.defaults)?;
        self.execute_model_operation(&resolved).await
    }

    /// Search and read matching records in one round trip.
    ///
    /// # Errors
    ///
    /// See [`Client::search`].
    pub async fn search_read(&self, options: Options) -> Result<Value> {
        let resolved = resolve(OperationKind::SearchRead, &options, &self.defaults)?;
        self.execute_model_operation(&resolved).await
    }

    /// Count matching records.
    ///
    /// # Errors
    ///
    /// See [`Client::search`].
    pub async fn search_count(&self, options: Options) -> Result<Value> {
        let resolved = resolve(OperationKind::SearchCount, &options, &self.defaults)?;
        self.execute_model_operation(&resolved).await
    }

    /// Read records by id.
    ///
    /// # Errors
    ///
    /// See [`Client::search`].
    pub async fn read(&self, options: Options) -> Result<Value> {
        let resolved = resolve(OperationKind::Read, &options, &self.defaults)?;
        self.execute_model_operation(&resolved).await
    }

    /// Create one record; returns its id.
    ///
    /// # Errors
    ///
    /// See [`Client::search`].
    pub async fn create(&self, options: Options) -> Result<Value> {
        let resolved = resolve(OperationKind::Create, &options, &self.defaults)?;
        self.execute_model_operation(&resolved).await
    }

    /// Update records by id.
    ///
    /// # Errors
    ///
    /// See [`Client::search`].
    pub async fn write(&self, options: Options) -> Result<Value> {
        let resolved = resolve(OperationKind::Write, &options, &self.defaults)?;
        self.execute_model_operation(&resolved).await
    }

    /// Delete records by id.
    ///
    /// # Errors
    ///
    /// See [`Client::search`].
    pub async fn unlink(&self, options: Options) -> Result<Value> {
        let resolved = resolve(OperationKind::Unlink, &options, &self.defaults)?;
        self.execute_model_operation(&resolved).await
    }

    /// Read records grouped by fields.
    ///
    /// # Errors
    ///
    /// See [`Client::search`].
    pub async fn read_group(&self, options: Options) -> Result<Value> {
        let resolved = resolve(OperationKind::ReadGroup, &options, &self.defaults)?;
        self.execute_model_operation(&resolved).await
    }

    /// Render a report, polling until generation finishes.
    ///
    /// # Errors
    ///
    /// See [`Client::search`]; additionally fails with a non-transient
    /// [`Error::RemoteFault`] when the report is still not ready after the
    /// polling attempts run out.
    pub async fn report(&self, options: Options) -> Result<RenderedReport> {
        let resolved = resolve(OperationKind::Report, &options, &self.defaults)?;
        let session = self.session.current().await?;
        let context = merge_context(&session.context, &resolved.context);

        let params = self
            .params
            .build_service(&session, operation_args(&resolved, context));
        let response = self
            .dispatcher
            .invoke(Endpoint::Report, methods::RENDER_REPORT, params, &self.retry)
            .await?;

        match parse_render(&response)? {
            RenderState::Complete(report) => Ok(report),
            RenderState::Pending(id) => self.poll_report(&session, id).await,
        }
    }

    async fn poll_report(&self, session: &Session, id: Value) -> Result<RenderedReport> {
        for poll in 1..=MAX_REPORT_POLLS {
            tokio::time::sleep(REPORT_POLL_INTERVAL).await;

            let params = self.params.build_service(session, vec![id.clone()]);
            let response = self
                .dispatcher
                .invoke(Endpoint::Report, methods::REPORT_GET, params, &self.retry)
                .await?;

            match parse_render(&response)? {
                RenderState::Complete(report) => return Ok(report),
                RenderState::Pending(_) => debug!(poll, "report not ready"),
            }
        }

        Err(Error::RemoteFault {
            fault: Fault::application(None, format!("report not ready after {MAX_REPORT_POLLS} polls")),
            attempts: 1,
        })
    }

    /// Resolve session and cache, then dispatch an `object.execute` call.
    async fn execute_model_operation(&self, resolved: &ResolvedOptions) -> Result<Value> {
        let session = self.session.current().await?;
        let context = merge_context(&session.context, &resolved.context);
        let model = resolved.model.clone().unwrap_or_default();
        let operation = resolved.kind().operation_name();

        let params = self
            .params
            .build(&session, &model, operation, operation_args(resolved, context));

        if resolved.kind().is_read_like() {
            let key = derive_key(&params);
            self.cache
                .fetch_or_compute(&key, || {
                    self.dispatcher.invoke(Endpoint::Object, methods::EXECUTE, params, &self.retry)
                })
                .await
        } else {
            self.dispatcher
                .invoke(Endpoint::Object, methods::EXECUTE, params, &self.retry)
                .await
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("session", &self.session)
            .field("cache", &self.cache)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}
