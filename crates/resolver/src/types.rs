//! Identifiers and the raw object type shared by rule sets, the predicate
//! registry, and the resolver.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;

/// An already-parsed JSON object as produced by `serde_json`.
///
/// The resolver only reads it; it is never mutated during resolution.
pub type RawObject = serde_json::Map<String, Value>;

/// Discriminator field read when no other field name is configured.
pub const DEFAULT_FIELD_NAME: &str = "type";

/// Discriminator value substituted when the discriminator field is absent.
pub const DEFAULT_DISCRIMINATOR: &str = "default";

/// Name of a JSON value's kind, as used in error messages.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ── SupertypeId ─────────────────────────────────────────────────────

/// Identity of an abstract supertype that owns a rule set and scopes
/// predicate lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SupertypeId(Cow<'static, str>);

impl SupertypeId {
    /// Identity derived from a Rust type's unqualified name (`Shape` for `my_app::Shape`).
    pub fn of<T: ?Sized>() -> Self {
        SupertypeId(Cow::Borrowed(short_type_name::<T>()))
    }

    pub const fn from_static(name: &'static str) -> Self {
        SupertypeId(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        SupertypeId(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SupertypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── ConcreteType ────────────────────────────────────────────────────

/// Identifier of a concrete, decodable subtype: the result of a successful
/// resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConcreteType(Cow<'static, str>);

impl ConcreteType {
    /// Identifier derived from a Rust type's unqualified name.
    pub fn of<T: ?Sized>() -> Self {
        ConcreteType(Cow::Borrowed(short_type_name::<T>()))
    }

    pub const fn from_static(name: &'static str) -> Self {
        ConcreteType(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        ConcreteType(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConcreteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strips the module path from `std::any::type_name`. Generic types keep
/// their full name, since their parameters carry paths of their own.
fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    if full.contains('<') {
        return full;
    }
    full.rsplit("::").next().unwrap_or(full)
}
