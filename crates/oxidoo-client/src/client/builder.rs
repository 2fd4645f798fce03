//! Client builder.

use std::sync::Arc;
use std::time::Duration;

use oxidoo_protocol::{Error, Result};
use oxidoo_transport::{HttpTransport, HttpTransportConfig, Transport};

use crate::cache::CacheStore;
use crate::dispatcher::RetryPolicy;
use crate::options::DefaultOptions;

use super::config::Credentials;
use super::core::Client;

/// Builder for configuring and creating a [`Client`].
///
/// # Examples
///
/// ```rust,no_run
/// use std::time::Duration;
/// use oxidoo_client::{Client, RetryPolicy};
///
/// # fn example() -> oxidoo_protocol::Result<()> {
/// let client = Client::builder()
///     .with_url("https://erp.example.com")
///     .with_database("prod")
///     .with_credentials("admin", "secret")
///     .with_memory_cache()
///     .with_retry_policy(RetryPolicy::attempts(3, Duration::from_secs(2)))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct ClientBuilder {
    url: Option<String>,
    timeout: Option<Duration>,
    transport: Option<Arc<dyn Transport>>,
    database: Option<String>,
    username: Option<String>,
    password: Option<String>,
    store: Option<Arc<dyn CacheStore>>,
    retry: RetryPolicy,
    defaults: DefaultOptions,
}

impl ClientBuilder {
    /// Create a new builder with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Server base URL; an HTTP transport is built for it.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Request timeout for the built-in HTTP transport.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Use a custom transport instead of the built-in HTTP one.
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Database to authenticate against.
    #[must_use]
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Login credentials.
    #[must_use]
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Attach a cache store for results and session persistence.
    #[must_use]
    pub fn with_cache_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Attach the bundled in-process cache store.
    #[must_use]
    pub fn with_memory_cache(self) -> Self {
        self.with_cache_store(Arc::new(crate::cache::MemoryStore::new()))
    }

    /// Retry policy applied to every remote call.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Override library defaults for all subsequent calls.
    #[must_use]
    pub fn with_default_options(mut self, defaults: DefaultOptions) -> Self {
        self.defaults = defaults;
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Config`] when database or credentials are
    /// missing, when neither a URL nor a transport was given, or when the
    /// HTTP transport cannot be constructed from the URL.
    pub fn build(self) -> Result<Client> {
        let database = self
            .database
            .ok_or_else(|| Error::Config("a database name is required".into()))?;
        let username = self
            .username
            .ok_or_else(|| Error::Config("login credentials are required".into()))?;
        let password = self
            .password
            .ok_or_else(|| Error::Config("login credentials are required".into()))?;

        let transport: Arc<dyn Transport> = match (self.transport, self.url) {
            (Some(transport), _) => transport,
            (None, Some(url)) => {
                let mut config = HttpTransportConfig {
                    base_url: url,
                    ..Default::default()
                };
                if let Some(timeout) = self.timeout {
                    config.timeout = timeout;
                }
                Arc::new(HttpTransport::new(config).map_err(|e| Error::Config(e.to_string()))?)
            }
            (None, None) => {
                return Err(Error::Config("either a server url or a transport is required".into()));
            }
        };

        let credentials = Arc::new(Credentials {
            database,
            username,
            password,
        });
        Ok(Client::from_parts(transport, credentials, self.store, self.retry, self.defaults))
    }
}

impl std::fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("url", &self.url)
            .field("database", &self.database)
            .field("store", &self.store.is_some())
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}
