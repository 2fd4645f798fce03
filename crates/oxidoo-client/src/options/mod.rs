//! Per-call option resolution.
//!
//! Every public operation accepts an [`Options`] bag. [`resolve`] checks the
//! bag against the declarative rule table for the operation kind and
//! produces a fully-populated [`ResolvedOptions`] record, or fails with
//! [`Error::Validation`] naming the offending option - always before any
//! network interaction.
//!
//! Defaults are layered: library defaults (offset 0, limit 100, order
//! `name ASC`, empty fields/domain/context, lazy grouping) can be overridden
//! once per client via [`DefaultOptions`], and again per call by the
//! supplied bag. Resolution order per field: supplied value, then configured
//! default, then library default.

mod rules;

use std::collections::HashMap;
use std::fmt;

use serde_json::{Map, Value};
use tracing::debug;

use oxidoo_protocol::{Error, Result};

use rules::{OptionRule, OptionType};

/// Recognized option names.
pub mod keys {
    /// Model the operation targets.
    pub const MODEL: &str = "model";
    /// Search criteria triples.
    pub const DOMAIN: &str = "domain";
    /// Field names to fetch; empty means all.
    pub const FIELDS: &str = "fields";
    /// Pagination offset.
    pub const OFFSET: &str = "offset";
    /// Pagination limit, or `false` for unbounded.
    pub const LIMIT: &str = "limit";
    /// Sort specification.
    pub const ORDER: &str = "order";
    /// Per-call context, merged over the session context.
    pub const CONTEXT: &str = "context";
    /// Record ids.
    pub const IDS: &str = "ids";
    /// Field values for create/write.
    pub const DATA: &str = "data";
    /// Grouping field names.
    pub const GROUP_BY: &str = "group_by";
    /// Lazy grouping flag.
    pub const LAZY: &str = "lazy";
    /// Report service name.
    pub const REPORT_NAME: &str = "report_name";
}

/// Library-wide default values.
const DEFAULT_LIMIT: u64 = 100;
const DEFAULT_ORDER: &str = "name ASC";

/// The operation kinds the resolver knows rules for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Search for matching record ids.
    Search,
    /// Search and read matching records in one round trip.
    SearchRead,
    /// Count matching records.
    SearchCount,
    /// Read records by id.
    Read,
    /// Update records by id.
    Write,
    /// Create one record.
    Create,
    /// Delete records by id.
    Unlink,
    /// Read records grouped by fields.
    ReadGroup,
    /// Render a report.
    Report,
}

impl OperationKind {
    pub(crate) const ALL: [Self; 9] = [
        Self::Search,
        Self::SearchRead,
        Self::SearchCount,
        Self::Read,
        Self::Write,
        Self::Create,
        Self::Unlink,
        Self::ReadGroup,
        Self::Report,
    ];

    /// The remote operation name.
    #[must_use]
    pub const fn operation_name(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::SearchRead => "search_read",
            Self::SearchCount => "search_count",
            Self::Read => "read",
            Self::Write => "write",
            Self::Create => "create",
            Self::Unlink => "unlink",
            Self::ReadGroup => "read_group",
            Self::Report => "render_report",
        }
    }

    /// Whether results of this kind may be served from the result cache.
    #[must_use]
    pub const fn is_read_like(&self) -> bool {
        matches!(
            self,
            Self::Search | Self::SearchRead | Self::SearchCount | Self::Read | Self::ReadGroup
        )
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.operation_name())
    }
}

/// A pagination limit: a count, or explicitly unbounded.
///
/// The protocol encodes "no limit" as the boolean `false`;
/// [`Limit::Unbounded`] is its typed form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// At most this many records.
    Count(u64),
    /// No limit.
    Unbounded,
}

impl Limit {
    /// Protocol encoding of this limit.
    #[must_use]
    pub fn to_value(self) -> Value {
        match self {
            Self::Count(n) => Value::from(n),
            Self::Unbounded => Value::Bool(false),
        }
    }
}

/// One search criterion: field, operator, value.
#[derive(Debug, Clone, PartialEq)]
pub struct Criterion {
    /// Field name.
    pub field: String,
    /// Comparison operator (`=`, `!=`, `in`, `ilike`, ...).
    pub operator: String,
    /// Comparison value.
    pub value: Value,
}

/// An ordered sequence of search criteria triples.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Domain {
    criteria: Vec<Criterion>,
}

impl Domain {
    /// An empty domain matching every record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one criterion.
    #[must_use]
    pub fn filter(mut self, field: impl Into<String>, operator: impl Into<String>, value: impl Into<Value>) -> Self {
        self.criteria.push(Criterion {
            field: field.into(),
            operator: operator.into(),
            value: value.into(),
        });
        self
    }

    /// Whether the domain has no criteria.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    /// Number of criteria.
    #[must_use]
    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    /// Protocol encoding: an array of `[field, operator, value]` triples.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Array(
            self.criteria
                .iter()
                .map(|c| Value::Array(vec![Value::from(c.field.clone()), Value::from(c.operator.clone()), c.value.clone()]))
                .collect(),
        )
    }

    fn from_value(value: &Value) -> std::result::Result<Self, String> {
        let entries = value
            .as_array()
            .ok_or_else(|| format!("expected an array of criteria triples, got {}", type_name(value)))?;
        let mut criteria = Vec::with_capacity(entries.len());
        for entry in entries {
            let triple = entry
                .as_array()
                .filter(|t| t.len() == 3)
                .ok_or_else(|| "criteria must be [field, operator, value] triples".to_string())?;
            let field = triple[0]
                .as_str()
                .ok_or_else(|| format!("criterion field must be a string, got {}", type_name(&triple[0])))?;
            let operator = triple[1]
                .as_str()
                .ok_or_else(|| format!("criterion operator must be a string, got {}", type_name(&triple[1])))?;
            criteria.push(Criterion {
                field: field.to_string(),
                operator: operator.to_string(),
                value: triple[2].clone(),
            });
        }
        Ok(Self { criteria })
    }
}

/// A per-call options bag.
///
/// Keys are resolved and validated against the rule table of the operation
/// they are passed to; unknown keys fail validation. The typed setters cover
/// every recognized option; [`Options::set`] takes anything and is what the
/// validation tests use to supply malformed values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options {
    entries: HashMap<String, Value>,
}

impl Options {
    /// An empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a raw option value.
    #[must_use]
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Target model.
    #[must_use]
    pub fn model(self, model: impl Into<String>) -> Self {
        self.set(keys::MODEL, model.into())
    }

    /// Search criteria.
    #[must_use]
    pub fn domain(self, domain: Domain) -> Self {
        self.set(keys::DOMAIN, domain.to_value())
    }

    /// Fields to fetch.
    #[must_use]
    pub fn fields<I, S>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<Value> = fields.into_iter().map(|f| Value::from(f.into())).collect();
        self.set(keys::FIELDS, fields)
    }

    /// Pagination offset.
    #[must_use]
    pub fn offset(self, offset: u64) -> Self {
        self.set(keys::OFFSET, offset)
    }

    /// Pagination limit.
    #[must_use]
    pub fn limit(self, limit: u64) -> Self {
        self.set(keys::LIMIT, limit)
    }

    /// Disable the pagination limit.
    #[must_use]
    pub fn unlimited(self) -> Self {
        self.set(keys::LIMIT, false)
    }

    /// Sort order.
    #[must_use]
    pub fn order(self, order: impl Into<String>) -> Self {
        self.set(keys::ORDER, order.into())
    }

    /// Per-call context entries.
    #[must_use]
    pub fn context(self, context: Map<String, Value>) -> Self {
        self.set(keys::CONTEXT, Value::Object(context))
    }

    /// Record ids.
    #[must_use]
    pub fn ids<I>(self, ids: I) -> Self
    where
        I: IntoIterator<Item = i64>,
    {
        let ids: Vec<Value> = ids.into_iter().map(Value::from).collect();
        self.set(keys::IDS, ids)
    }

    /// Field values for create/write.
    #[must_use]
    pub fn data(self, data: Map<String, Value>) -> Self {
        self.set(keys::DATA, Value::Object(data))
    }

    /// Grouping fields.
    #[must_use]
    pub fn group_by<I, S>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<Value> = fields.into_iter().map(|f| Value::from(f.into())).collect();
        self.set(keys::GROUP_BY, fields)
    }

    /// Lazy grouping flag.
    #[must_use]
    pub fn lazy(self, lazy: bool) -> Self {
        self.set(keys::LAZY, lazy)
    }

    /// Report service name.
    #[must_use]
    pub fn report_name(self, name: impl Into<String>) -> Self {
        self.set(keys::REPORT_NAME, name.into())
    }

    fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    fn key_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// Client-configured default overrides, applied between library defaults and
/// per-call options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefaultOptions {
    /// Default pagination offset.
    pub offset: Option<u64>,
    /// Default pagination limit.
    pub limit: Option<Limit>,
    /// Default sort order.
    pub order: Option<String>,
    /// Default field selection.
    pub fields: Option<Vec<String>>,
    /// Default per-call context.
    pub context: Option<Map<String, Value>>,
    /// Default lazy-grouping flag.
    pub lazy: Option<bool>,
}

impl DefaultOptions {
    fn configured(&self, name: &str) -> Option<Value> {
        match name {
            keys::OFFSET => self.offset.map(Value::from),
            keys::LIMIT => self.limit.map(Limit::to_value),
            keys::ORDER => self.order.clone().map(Value::from),
            keys::FIELDS => self
                .fields
                .clone()
                .map(|fields| Value::Array(fields.into_iter().map(Value::from).collect())),
            keys::CONTEXT => self.context.clone().map(Value::Object),
            keys::LAZY => self.lazy.map(Value::from),
            _ => None,
        }
    }
}

/// A fully-populated, validated options record.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOptions {
    kind: OperationKind,
    /// Target model, for model operations.
    pub model: Option<String>,
    /// Report service name, for report operations.
    pub report_name: Option<String>,
    /// Search criteria.
    pub domain: Domain,
    /// Fields to fetch; empty means all.
    pub fields: Vec<String>,
    /// Pagination offset.
    pub offset: u64,
    /// Pagination limit.
    pub limit: Limit,
    /// Sort order.
    pub order: String,
    /// Per-call context.
    pub context: Map<String, Value>,
    /// Record ids.
    pub ids: Vec<i64>,
    /// Field values for create/write.
    pub data: Map<String, Value>,
    /// Grouping fields.
    pub group_by: Vec<String>,
    /// Lazy grouping flag.
    pub lazy: bool,
}

impl ResolvedOptions {
    fn with_library_defaults(kind: OperationKind) -> Self {
        Self {
            kind,
            model: None,
            report_name: None,
            domain: Domain::default(),
            fields: Vec::new(),
            offset: 0,
            limit: Limit::Count(DEFAULT_LIMIT),
            order: DEFAULT_ORDER.to_string(),
            context: Map::new(),
            ids: Vec::new(),
            data: Map::new(),
            group_by: Vec::new(),
            lazy: true,
        }
    }

    /// The operation kind this record was resolved for.
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Convert back into a supplied bag containing every registered option.
    ///
    /// Resolving the returned bag again yields an equal record.
    #[must_use]
    pub fn to_options(&self) -> Options {
        let mut options = Options::new();
        for rule in rules::for_kind(self.kind).iter() {
            if let Some(value) = self.value_for(rule.name) {
                options = options.set(rule.name, value);
            }
        }
        options
    }

    fn value_for(&self, name: &str) -> Option<Value> {
        match name {
            keys::MODEL => self.model.clone().map(Value::from),
            keys::REPORT_NAME => self.report_name.clone().map(Value::from),
            keys::DOMAIN => Some(self.domain.to_value()),
            keys::FIELDS => Some(Value::Array(self.fields.iter().cloned().map(Value::from).collect())),
            keys::OFFSET => Some(Value::from(self.offset)),
            keys::LIMIT => Some(self.limit.to_value()),
            keys::ORDER => Some(Value::from(self.order.clone())),
            keys::CONTEXT => Some(Value::Object(self.context.clone())),
            keys::IDS => Some(Value::Array(self.ids.iter().copied().map(Value::from).collect())),
            keys::DATA => Some(Value::Object(self.data.clone())),
            keys::GROUP_BY => Some(Value::Array(self.group_by.iter().cloned().map(Value::from).collect())),
            keys::LAZY => Some(Value::from(self.lazy)),
            _ => None,
        }
    }

    fn assign(&mut self, rule: &OptionRule, value: &Value) -> Result<()> {
        match rule.name {
            keys::MODEL => self.model = Some(expect_str(rule, value)?),
            keys::REPORT_NAME => self.report_name = Some(expect_str(rule, value)?),
            keys::DOMAIN => {
                self.domain = Domain::from_value(value).map_err(|reason| Error::validation(rule.name, reason))?;
            }
            keys::FIELDS => self.fields = expect_str_list(rule, value)?,
            keys::GROUP_BY => self.group_by = expect_str_list(rule, value)?,
            keys::OFFSET => self.offset = expect_uint(rule, value)?,
            keys::LIMIT => self.limit = expect_limit(rule, value)?,
            keys::ORDER => self.order = expect_str(rule, value)?,
            keys::CONTEXT => self.context = expect_map(rule, value)?,
            keys::IDS => self.ids = expect_int_list(rule, value)?,
            keys::DATA => self.data = expect_map(rule, value)?,
            keys::LAZY => self.lazy = expect_bool(rule, value)?,
            other => return Err(Error::validation(other, "option has no resolution slot")),
        }
        Ok(())
    }
}

/// Resolve a supplied options bag for an operation kind.
///
/// # Errors
///
/// Returns [`Error::Validation`] naming the offending option on unknown
/// keys, wrong types, missing required options, or failed value predicates.
pub fn resolve(kind: OperationKind, supplied: &Options, defaults: &DefaultOptions) -> Result<ResolvedOptions> {
    let rules = rules::for_kind(kind);

    for key in supplied.key_names() {
        if rules.rule(key).is_none() {
            return Err(Error::validation(key, format!("unknown option for {kind} operations")));
        }
    }

    let mut resolved = ResolvedOptions::with_library_defaults(kind);
    for rule in rules.iter() {
        if let Some(value) = supplied.get(rule.name) {
            resolved.assign(rule, value)?;
        } else if let Some(value) = defaults.configured(rule.name) {
            resolved.assign(rule, &value)?;
        } else if rule.required {
            return Err(Error::validation(rule.name, "option is required but was not supplied"));
        }
    }

    debug!(kind = %kind, options = ?resolved, "resolved call options");
    Ok(resolved)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn expect_str(rule: &OptionRule, value: &Value) -> Result<String> {
    debug_assert!(matches!(rule.ty, OptionType::Str));
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| Error::validation(rule.name, format!("expected a string, got {}", type_name(value))))
}

fn expect_bool(rule: &OptionRule, value: &Value) -> Result<bool> {
    debug_assert!(matches!(rule.ty, OptionType::Bool));
    value
        .as_bool()
        .ok_or_else(|| Error::validation(rule.name, format!("expected a boolean, got {}", type_name(value))))
}

fn expect_uint(rule: &OptionRule, value: &Value) -> Result<u64> {
    debug_assert!(matches!(rule.ty, OptionType::UInt));
    value
        .as_u64()
        .ok_or_else(|| Error::validation(rule.name, format!("expected a non-negative integer, got {}", type_name(value))))
}

fn expect_limit(rule: &OptionRule, value: &Value) -> Result<Limit> {
    debug_assert!(matches!(rule.ty, OptionType::Limit));
    match value {
        Value::Bool(false) => Ok(Limit::Unbounded),
        Value::Bool(true) => Err(Error::validation(rule.name, "the disabled sentinel must be `false`")),
        other => other
            .as_u64()
            .map(Limit::Count)
            .ok_or_else(|| Error::validation(rule.name, format!("expected a non-negative integer or `false`, got {}", type_name(other)))),
    }
}

fn expect_str_list(rule: &OptionRule, value: &Value) -> Result<Vec<String>> {
    debug_assert!(matches!(rule.ty, OptionType::StrList));
    let entries = value
        .as_array()
        .ok_or_else(|| Error::validation(rule.name, format!("expected an array of field names, got {}", type_name(value))))?;
    entries
        .iter()
        .map(|entry| {
            entry
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| Error::validation(rule.name, format!("expected string entries, got {}", type_name(entry))))
        })
        .collect()
}

fn expect_int_list(rule: &OptionRule, value: &Value) -> Result<Vec<i64>> {
    debug_assert!(matches!(rule.ty, OptionType::IntList));
    let entries = value
        .as_array()
        .ok_or_else(|| Error::validation(rule.name, format!("expected an array of ids, got {}", type_name(value))))?;
    entries
        .iter()
        .map(|entry| {
            entry
                .as_i64()
                .ok_or_else(|| Error::validation(rule.name, format!("expected integer entries, got {}", type_name(entry))))
        })
        .collect()
}

fn expect_map(rule: &OptionRule, value: &Value) -> Result<Map<String, Value>> {
    debug_assert!(matches!(rule.ty, OptionType::Map));
    value
        .as_object()
        .cloned()
        .ok_or_else(|| Error::validation(rule.name, format!("expected an object, got {}", type_name(value))))
}
