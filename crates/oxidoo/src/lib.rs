//! Oxidoo - an async Rust client for positional-argument ERP RPC.
//!
//! The facade crate re-exports the public surface of the workspace:
//!
//! - [`oxidoo_client`]: the [`Client`], option resolution, result caching,
//!   session management, and retry dispatch
//! - [`oxidoo_transport`]: the [`Transport`] seam and the HTTP
//!   implementation
//! - [`oxidoo_protocol`]: endpoints, the JSON-RPC envelope, and the error
//!   taxonomy
//!
//! # Example
//!
//! ```rust,no_run
//! use oxidoo::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> oxidoo::Result<()> {
//!     let client = Client::builder()
//!         .with_url("https://erp.example.com")
//!         .with_database("prod")
//!         .with_credentials("admin", "secret")
//!         .with_memory_cache()
//!         .build()?;
//!
//!     // Cache exactly the next read-like call for five minutes.
//!     client.activate_cache(Some(std::time::Duration::from_secs(300)))?;
//!     let partners = client
//!         .search(
//!             Options::new()
//!                 .model("res.partner")
//!                 .domain(Domain::new().filter("active", "=", true))
//!                 .limit(10),
//!         )
//!         .await?;
//!     println!("{partners}");
//!     Ok(())
//! }
//! ```

pub use oxidoo_client::{
    derive_key, resolve, CacheStore, CallDispatcher, Client, ClientBuilder, Credentials, DefaultOptions, Domain,
    Limit, MemoryStore, OperationKind, Options, ParameterBuilder, RenderedReport, ResolvedOptions, ResultCache,
    RetryPolicy, Session, SessionManager,
};
pub use oxidoo_protocol::{Endpoint, Error, Fault, FaultKind, Result};
pub use oxidoo_transport::{HttpTransport, HttpTransportConfig, Transport, TransportError};

/// Commonly used items in one import.
pub mod prelude {
    pub use oxidoo_client::{
        Client, ClientBuilder, DefaultOptions, Domain, Limit, MemoryStore, Options, RetryPolicy,
    };
    pub use oxidoo_protocol::{Endpoint, Error, Fault, Result};
    pub use oxidoo_transport::Transport;
}
