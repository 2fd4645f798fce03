//! Declarative per-operation option rules.
//!
//! Each operation kind declares which options it recognizes (with a type)
//! and which of those the caller must supply. The table is built once; the
//! resolver walks it for every call.

use std::collections::HashMap;
use std::sync::LazyLock;

use super::{keys, OperationKind};

/// Type constraint an option value must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OptionType {
    Str,
    UInt,
    Bool,
    Limit,
    Domain,
    StrList,
    IntList,
    Map,
}

/// One registered option of an operation kind.
#[derive(Debug, Clone, Copy)]
pub(crate) struct OptionRule {
    pub name: &'static str,
    pub ty: OptionType,
    pub required: bool,
}

/// The recognized options of one operation kind.
#[derive(Debug)]
pub(crate) struct RuleSet {
    kind: OperationKind,
    rules: Vec<OptionRule>,
}

impl RuleSet {
    fn new(kind: OperationKind) -> Self {
        Self { kind, rules: Vec::new() }
    }

    /// Register an option as recognized, with a default-capable type.
    fn register(mut self, name: &'static str, ty: OptionType) -> Self {
        debug_assert!(
            self.rules.iter().all(|rule| rule.name != name),
            "option `{name}` registered twice for {:?}",
            self.kind
        );
        self.rules.push(OptionRule { name, ty, required: false });
        self
    }

    /// Mark a previously registered option as required.
    ///
    /// Registration must precede requirement; requiring an unregistered
    /// option is a defect in the rule table and panics at construction.
    fn require(mut self, name: &'static str) -> Self {
        let rule = self
            .rules
            .iter_mut()
            .find(|rule| rule.name == name)
            .unwrap_or_else(|| panic!("option `{name}` must be registered before it can be required"));
        rule.required = true;
        self
    }

    pub fn rule(&self, name: &str) -> Option<&OptionRule> {
        self.rules.iter().find(|rule| rule.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OptionRule> {
        self.rules.iter()
    }
}

static REGISTRY: LazyLock<HashMap<OperationKind, RuleSet>> = LazyLock::new(|| {
    use OptionType as T;

    OperationKind::ALL
        .into_iter()
        .map(|kind| {
            let set = match kind {
                OperationKind::Search => RuleSet::new(kind)
                    .register(keys::MODEL, T::Str)
                    .register(keys::DOMAIN, T::Domain)
                    .register(keys::FIELDS, T::StrList)
                    .register(keys::OFFSET, T::UInt)
                    .register(keys::LIMIT, T::Limit)
                    .register(keys::ORDER, T::Str)
                    .register(keys::CONTEXT, T::Map)
                    .require(keys::MODEL),
                OperationKind::SearchRead => RuleSet::new(kind)
                    .register(keys::MODEL, T::Str)
                    .register(keys::DOMAIN, T::Domain)
                    .register(keys::FIELDS, T::StrList)
                    .register(keys::OFFSET, T::UInt)
                    .register(keys::LIMIT, T::Limit)
                    .register(keys::ORDER, T::Str)
                    .register(keys::CONTEXT, T::Map)
                    .require(keys::MODEL),
                OperationKind::SearchCount => RuleSet::new(kind)
                    .register(keys::MODEL, T::Str)
                    .register(keys::DOMAIN, T::Domain)
                    .register(keys::CONTEXT, T::Map)
                    .require(keys::MODEL),
                OperationKind::Read => RuleSet::new(kind)
                    .register(keys::MODEL, T::Str)
                    .register(keys::IDS, T::IntList)
                    .register(keys::FIELDS, T::StrList)
                    .register(keys::CONTEXT, T::Map)
                    .require(keys::MODEL)
                    .require(keys::IDS),
                OperationKind::Write => RuleSet::new(kind)
                    .register(keys::MODEL, T::Str)
                    .register(keys::IDS, T::IntList)
                    .register(keys::DATA, T::Map)
                    .register(keys::CONTEXT, T::Map)
                    .require(keys::MODEL)
                    .require(keys::IDS)
                    .require(keys::DATA),
                OperationKind::Create => RuleSet::new(kind)
                    .register(keys::MODEL, T::Str)
                    .register(keys::DATA, T::Map)
                    .register(keys::CONTEXT, T::Map)
                    .require(keys::MODEL)
                    .require(keys::DATA),
                OperationKind::Unlink => RuleSet::new(kind)
                    .register(keys::MODEL, T::Str)
                    .register(keys::IDS, T::IntList)
                    .register(keys::CONTEXT, T::Map)
                    .require(keys::MODEL)
                    .require(keys::IDS),
                OperationKind::ReadGroup => RuleSet::new(kind)
                    .register(keys::MODEL, T::Str)
                    .register(keys::DOMAIN, T::Domain)
                    .register(keys::FIELDS, T::StrList)
                    .register(keys::GROUP_BY, T::StrList)
                    .register(keys::OFFSET, T::UInt)
                    .register(keys::LIMIT, T::Limit)
                    .register(keys::ORDER, T::Str)
                    .register(keys::LAZY, T::Bool)
                    .register(keys::CONTEXT, T::Map)
                    .require(keys::MODEL)
                    .require(keys::GROUP_BY),
                OperationKind::Report => RuleSet::new(kind)
                    .register(keys::REPORT_NAME, T::Str)
                    .register(keys::IDS, T::IntList)
                    .register(keys::CONTEXT, T::Map)
                    .require(keys::REPORT_NAME)
                    .require(keys::IDS),
            };
            (kind, set)
        })
        .collect()
});

/// The rule set for an operation kind.
pub(crate) fn for_kind(kind: OperationKind) -> &'static RuleSet {
    REGISTRY.get(&kind).expect("every operation kind has a rule set")
}
