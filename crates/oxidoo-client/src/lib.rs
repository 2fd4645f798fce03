//! Call orchestration for the Oxidoo client.
//!
//! This crate is the core of the library: it turns a per-call options bag
//! into a validated record, assembles the positional parameter array the
//! remote expects, consults the one-shot result cache, resolves the
//! authenticated session lazily, and dispatches the call with an optional
//! fixed-wait retry policy.
//!
//! # Example
//!
//! ```rust,no_run
//! use oxidoo_client::{Client, Domain, Options};
//!
//! # async fn example() -> oxidoo_protocol::Result<()> {
//! let client = Client::builder()
//!     .with_url("https://erp.example.com")
//!     .with_database("prod")
//!     .with_credentials("admin", "secret")
//!     .build()?;
//!
//! let ids = client
//!     .search(
//!         Options::new()
//!             .model("res.partner")
//!             .domain(Domain::new().filter("active", "=", true))
//!             .limit(10),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod dispatcher;
pub mod options;
pub mod params;
pub mod report;
pub mod session;

pub use cache::key::derive_key;
pub use cache::{CacheStore, MemoryStore, ResultCache};
pub use client::{Client, ClientBuilder, Credentials};
pub use dispatcher::{CallDispatcher, RetryPolicy};
pub use options::{resolve, DefaultOptions, Domain, Limit, OperationKind, Options, ResolvedOptions};
pub use params::ParameterBuilder;
pub use report::RenderedReport;
pub use session::{Session, SessionManager};
