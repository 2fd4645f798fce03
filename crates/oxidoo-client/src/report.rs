//! Report rendering results.
//!
//! The report service answers `render_report` either with the finished
//! payload (`state: true`, base64 `result`) or with a queued report id to
//! be polled via `report_get`. This module parses both shapes; the polling
//! loop itself lives on the client.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::Value;

use oxidoo_protocol::{Error, Fault, Result};

/// A finished report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReport {
    /// Decoded report content.
    pub content: Vec<u8>,
    /// Content format as reported by the remote (`pdf`, `html`, ...).
    pub format: String,
}

/// What one render/poll response amounts to.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RenderState {
    /// The report is finished.
    Complete(RenderedReport),
    /// The report is still being generated; poll with this id.
    Pending(Value),
}

/// Parse a `render_report` / `report_get` response.
pub(crate) fn parse_render(value: &Value) -> Result<RenderState> {
    let Some(object) = value.as_object() else {
        // A bare value is the id of a queued report.
        return Ok(RenderState::Pending(value.clone()));
    };

    let finished = object.get("state").and_then(Value::as_bool).unwrap_or(true);
    if !finished {
        let id = object
            .get("id")
            .cloned()
            .ok_or_else(|| malformed("queued report response carries no id"))?;
        return Ok(RenderState::Pending(id));
    }

    let encoded = object
        .get("result")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("report payload carries no result"))?;
    let content = BASE64
        .decode(encoded)
        .map_err(|e| malformed(format!("report payload is not valid base64: {e}")))?;
    let format = object
        .get("format")
        .and_then(Value::as_str)
        .unwrap_or("pdf")
        .to_string();
    Ok(RenderState::Complete(RenderedReport { content, format }))
}

fn malformed(message: impl Into<String>) -> Error {
    Error::RemoteFault {
        fault: Fault::protocol(message),
        attempts: 1,
    }
}
