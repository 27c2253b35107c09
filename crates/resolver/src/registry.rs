//! Named predicates scoped to a supertype.
//!
//! Predicates are registered once at startup and looked up by
//! `(supertype, name)` during resolution. Typed registration
//! ([`PredicateRegistry::register`] and friends) fixes the signature at
//! compile time. [`PredicateRegistry::register_erased`] accepts predicates
//! whose signature is only known at runtime (plugin hosts, scripting
//! bridges) and validates the declared signature before storing it.

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::error::ResolutionError;
use crate::types::{json_kind, RawObject, SupertypeId};

// ── Signatures ──────────────────────────────────────────────────────

/// Whether a predicate can be called with the raw object alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receiver {
    /// Free function over the object.
    Static,
    /// Method that needs an instance of the supertype to be called.
    Instance,
}

/// Declared result type of a predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnKind {
    Bool,
    /// A boolean that may be absent (`null`).
    OptionalBool,
    /// Anything else, described by name (e.g. `"string"`).
    Other(String),
}

/// Declared shape of a runtime-provided predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredicateSignature {
    pub receiver: Receiver,
    pub returns: ReturnKind,
}

impl PredicateSignature {
    /// `fn(&RawObject) -> bool`
    pub fn static_bool() -> Self {
        PredicateSignature {
            receiver: Receiver::Static,
            returns: ReturnKind::Bool,
        }
    }

    /// `fn(&RawObject) -> Option<bool>`
    pub fn static_optional_bool() -> Self {
        PredicateSignature {
            receiver: Receiver::Static,
            returns: ReturnKind::OptionalBool,
        }
    }

    fn validate(&self, name: &str) -> Result<(), ResolutionError> {
        if self.receiver == Receiver::Instance {
            return Err(ResolutionError::PredicateNotStatic {
                name: name.to_string(),
            });
        }
        match &self.returns {
            ReturnKind::Bool | ReturnKind::OptionalBool => Ok(()),
            ReturnKind::Other(found) => Err(ResolutionError::PredicateWrongReturnType {
                name: name.to_string(),
                found: found.clone(),
            }),
        }
    }
}

// ── Callables ───────────────────────────────────────────────────────

type BoolFn = dyn Fn(&RawObject) -> bool + Send + Sync;
type OptionalFn = dyn Fn(&RawObject) -> Option<bool> + Send + Sync;
type FallibleFn = dyn Fn(&RawObject) -> Result<bool, String> + Send + Sync;
type ErasedFn = dyn Fn(&RawObject) -> Result<Value, String> + Send + Sync;

#[derive(Clone)]
enum Callable {
    Bool(Arc<BoolFn>),
    Optional(Arc<OptionalFn>),
    Fallible(Arc<FallibleFn>),
    Erased(Arc<ErasedFn>),
}

impl Callable {
    fn call(&self, name: &str, object: &RawObject) -> Result<bool, ResolutionError> {
        match self {
            Callable::Bool(f) => Ok(f(object)),
            Callable::Optional(f) => {
                f(object).ok_or_else(|| ResolutionError::PredicateReturnedNull {
                    name: name.to_string(),
                })
            }
            Callable::Fallible(f) => {
                f(object).map_err(|cause| ResolutionError::PredicateInvocationFailed {
                    name: name.to_string(),
                    cause,
                })
            }
            Callable::Erased(f) => match f(object) {
                Ok(Value::Bool(b)) => Ok(b),
                Ok(Value::Null) => Err(ResolutionError::PredicateReturnedNull {
                    name: name.to_string(),
                }),
                Ok(other) => Err(ResolutionError::PredicateWrongReturnType {
                    name: name.to_string(),
                    found: json_kind(&other).to_string(),
                }),
                Err(cause) => Err(ResolutionError::PredicateInvocationFailed {
                    name: name.to_string(),
                    cause,
                }),
            },
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}

// ── PredicateRegistry ───────────────────────────────────────────────

/// Registry mapping `(supertype, name)` to a boolean predicate over a raw
/// object.
///
/// Built once, then shared read-only; lookups take `&self` and the registry
/// is `Send + Sync`. Results are never cached.
#[derive(Clone, Default)]
pub struct PredicateRegistry {
    predicates: HashMap<SupertypeId, HashMap<String, Callable>>,
}

impl PredicateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an infallible predicate.
    pub fn register<F>(
        &mut self,
        supertype: &SupertypeId,
        name: impl Into<String>,
        f: F,
    ) -> &mut Self
    where
        F: Fn(&RawObject) -> bool + Send + Sync + 'static,
    {
        self.insert(supertype, name.into(), Callable::Bool(Arc::new(f)))
    }

    /// Register a predicate that may produce no answer. `None` at call time
    /// fails resolution with `PredicateReturnedNull`.
    pub fn register_optional<F>(
        &mut self,
        supertype: &SupertypeId,
        name: impl Into<String>,
        f: F,
    ) -> &mut Self
    where
        F: Fn(&RawObject) -> Option<bool> + Send + Sync + 'static,
    {
        self.insert(supertype, name.into(), Callable::Optional(Arc::new(f)))
    }

    /// Register a predicate that can fail. An `Err` at call time fails
    /// resolution with `PredicateInvocationFailed` carrying the error text.
    pub fn register_fallible<F, E>(
        &mut self,
        supertype: &SupertypeId,
        name: impl Into<String>,
        f: F,
    ) -> &mut Self
    where
        F: Fn(&RawObject) -> Result<bool, E> + Send + Sync + 'static,
        E: fmt::Display + 'static,
    {
        let f = move |object: &RawObject| f(object).map_err(|e| e.to_string());
        self.insert(supertype, name.into(), Callable::Fallible(Arc::new(f)))
    }

    /// Register a predicate whose signature is only known at runtime.
    ///
    /// The declared signature is checked here, once: instance receivers are
    /// rejected with `PredicateNotStatic` and non-boolean results with
    /// `PredicateWrongReturnType`. At call time a `null` result fails with
    /// `PredicateReturnedNull` and any other non-boolean value with
    /// `PredicateWrongReturnType`.
    pub fn register_erased<F, E>(
        &mut self,
        supertype: &SupertypeId,
        name: impl Into<String>,
        signature: &PredicateSignature,
        f: F,
    ) -> Result<&mut Self, ResolutionError>
    where
        F: Fn(&RawObject) -> Result<Value, E> + Send + Sync + 'static,
        E: fmt::Display + 'static,
    {
        let name = name.into();
        signature.validate(&name)?;
        let f = move |object: &RawObject| f(object).map_err(|e| e.to_string());
        Ok(self.insert(supertype, name, Callable::Erased(Arc::new(f))))
    }

    fn insert(&mut self, supertype: &SupertypeId, name: String, callable: Callable) -> &mut Self {
        let scoped = self.predicates.entry(supertype.clone()).or_default();
        if scoped.insert(name.clone(), callable).is_some() {
            tracing::warn!(
                supertype = %supertype,
                predicate = %name,
                "predicate re-registered, replacing previous definition"
            );
        }
        self
    }

    pub fn contains(&self, supertype: &SupertypeId, name: &str) -> bool {
        self.lookup(supertype, name).is_some()
    }

    /// Predicate names registered for `supertype`, sorted.
    pub fn names(&self, supertype: &SupertypeId) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .predicates
            .get(supertype)
            .map(|scoped| scoped.keys().map(String::as_str).collect())
            .unwrap_or_default();
        names.sort_unstable();
        names
    }

    /// Invoke the predicate `name` registered for `supertype` against `object`.
    ///
    /// Panics raised inside the predicate are caught and reported as
    /// `PredicateInvocationFailed`.
    pub fn invoke(
        &self,
        supertype: &SupertypeId,
        name: &str,
        object: &RawObject,
    ) -> Result<bool, ResolutionError> {
        let callable = self
            .lookup(supertype, name)
            .ok_or_else(|| ResolutionError::PredicateNotFound {
                supertype: supertype.to_string(),
                name: name.to_string(),
            })?;

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| callable.call(name, object)))
            .unwrap_or_else(|payload| {
                Err(ResolutionError::PredicateInvocationFailed {
                    name: name.to_string(),
                    cause: panic_message(payload.as_ref()),
                })
            });

        tracing::debug!(
            supertype = %supertype,
            predicate = name,
            outcome = ?outcome,
            "predicate invoked"
        );
        outcome
    }

    fn lookup(&self, supertype: &SupertypeId, name: &str) -> Option<&Callable> {
        self.predicates.get(supertype)?.get(name)
    }
}

impl fmt::Debug for PredicateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        let mut supertypes: Vec<&SupertypeId> = self.predicates.keys().collect();
        supertypes.sort();
        for supertype in supertypes {
            map.entry(supertype, &self.names(supertype));
        }
        map.finish()
    }
}
