//! Fixed service-method names of the remote contract.

/// JSON-RPC envelope method; every request uses it.
pub const CALL: &str = "call";

/// `common` service: server version probe.
pub const VERSION: &str = "version";

/// `common` service: credential exchange, returns the numeric user id.
pub const LOGIN: &str = "login";

/// `object` service: positional model operation.
pub const EXECUTE: &str = "execute";

/// `report` service: start rendering a report.
pub const RENDER_REPORT: &str = "render_report";

/// `report` service: poll a queued report by id.
pub const REPORT_GET: &str = "report_get";
