//! Positional parameter assembly.
//!
//! The remote expects every `object` call as
//! `[database, uid, password, model, operation, ...operation args]` and
//! every `report` call as `[database, uid, password, ...service args]`.
//! Argument order per operation is part of the fixed remote contract and is
//! encoded in [`operation_args`]; nothing else in the crate knows it.
//!
//! Arrays are rebuilt fresh per call and, for a fixed session, are
//! deterministic - the cache-key derivation depends on that.

use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::client::Credentials;
use crate::options::{OperationKind, ResolvedOptions};
use crate::session::Session;

/// Assembles positional parameter arrays.
#[derive(Debug, Clone)]
pub struct ParameterBuilder {
    credentials: Arc<Credentials>,
}

impl ParameterBuilder {
    /// Create a builder for the given credentials.
    #[must_use]
    pub fn new(credentials: Arc<Credentials>) -> Self {
        Self { credentials }
    }

    /// Build `[database, uid, password, model, operation, ...args]`.
    #[must_use]
    pub fn build(&self, session: &Session, model: &str, operation: &str, args: Vec<Value>) -> Vec<Value> {
        let mut params = vec![
            json!(self.credentials.database),
            json!(session.uid),
            json!(self.credentials.password),
            json!(model),
            json!(operation),
        ];
        params.extend(args);
        params
    }

    /// Build `[database, uid, password, ...args]` for service-level calls
    /// that take no model/operation slots (the report service).
    #[must_use]
    pub fn build_service(&self, session: &Session, args: Vec<Value>) -> Vec<Value> {
        let mut params = vec![
            json!(self.credentials.database),
            json!(session.uid),
            json!(self.credentials.password),
        ];
        params.extend(args);
        params
    }
}

/// Merge the per-call context over the session context; per-call keys win.
pub(crate) fn merge_context(session: &Map<String, Value>, call: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = session.clone();
    for (key, value) in call {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// The operation-specific tail of the positional array.
pub(crate) fn operation_args(options: &ResolvedOptions, context: Map<String, Value>) -> Vec<Value> {
    let ctx = Value::Object(context);
    match options.kind() {
        OperationKind::Search => vec![
            options.domain.to_value(),
            json!(options.offset),
            options.limit.to_value(),
            json!(options.order),
            ctx,
        ],
        OperationKind::SearchRead => vec![
            options.domain.to_value(),
            json!(options.fields),
            json!(options.offset),
            options.limit.to_value(),
            json!(options.order),
            ctx,
        ],
        OperationKind::SearchCount => vec![options.domain.to_value(), ctx],
        OperationKind::Read => vec![json!(options.ids), json!(options.fields), ctx],
        OperationKind::Create => vec![Value::Object(options.data.clone()), ctx],
        OperationKind::Write => vec![json!(options.ids), Value::Object(options.data.clone()), ctx],
        OperationKind::Unlink => vec![json!(options.ids), ctx],
        OperationKind::ReadGroup => vec![
            options.domain.to_value(),
            json!(options.fields),
            json!(options.group_by),
            json!(options.offset),
            options.limit.to_value(),
            json!(options.order),
            json!(options.lazy),
            ctx,
        ],
        OperationKind::Report => vec![
            json!(options.report_name),
            json!(options.ids),
            ctx,
        ],
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::options::{resolve, DefaultOptions, Domain, Options, OperationKind};

    use super::*;

    fn credentials() -> Arc<Credentials> {
        Arc::new(Credentials {
            database: "prod".to_string(),
            username: "admin".to_string(),
            password: "secret".to_string(),
        })
    }

    fn session() -> Session {
        Session {
            uid: 2,
            context: Map::new(),
        }
    }

    #[test]
    fn test_build_prepends_credential_triple() {
        let builder = ParameterBuilder::new(credentials());
        let params = builder.build(&session(), "res.partner", "search", vec![json!([]), json!(0)]);
        assert_eq!(
            params,
            vec![
                json!("prod"),
                json!(2),
                json!("secret"),
                json!("res.partner"),
                json!("search"),
                json!([]),
                json!(0),
            ]
        );
    }

    #[test]
    fn test_build_is_deterministic_for_fixed_session() {
        let builder = ParameterBuilder::new(credentials());
        let first = builder.build(&session(), "res.partner", "read", vec![json!([1, 2])]);
        let second = builder.build(&session(), "res.partner", "read", vec![json!([1, 2])]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_search_argument_order() {
        let supplied = Options::new()
            .model("res.partner")
            .domain(Domain::new().filter("active", "=", true))
            .limit(10);
        let resolved = resolve(OperationKind::Search, &supplied, &DefaultOptions::default()).unwrap();
        let args = operation_args(&resolved, Map::new());
        assert_eq!(
            args,
            vec![
                json!([["active", "=", true]]),
                json!(0),
                json!(10),
                json!("name ASC"),
                json!({}),
            ]
        );
    }

    #[test]
    fn test_unbounded_limit_serializes_as_false() {
        let supplied = Options::new().model("res.partner").unlimited();
        let resolved = resolve(OperationKind::Search, &supplied, &DefaultOptions::default()).unwrap();
        let args = operation_args(&resolved, Map::new());
        assert_eq!(args[2], json!(false));
    }

    #[test]
    fn test_merge_context_per_call_wins() {
        let mut session_ctx = Map::new();
        session_ctx.insert("lang".to_string(), json!("en_US"));
        session_ctx.insert("tz".to_string(), json!("UTC"));

        let mut call_ctx = Map::new();
        call_ctx.insert("lang".to_string(), json!("de_DE"));

        let merged = merge_context(&session_ctx, &call_ctx);
        assert_eq!(merged.get("lang"), Some(&json!("de_DE")));
        assert_eq!(merged.get("tz"), Some(&json!("UTC")));
    }
}
