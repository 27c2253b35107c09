//! polyjson-resolver: concrete type resolution for polymorphic JSON.
//!
//! Given a raw JSON object and the ordered rules declared for its abstract
//! supertype, decides which concrete type the object represents. Each rule
//! matches either a literal discriminator value (read from the `"type"`
//! field by default) or a named predicate evaluated against the whole
//! object. The first matching rule wins; no match is an error carrying the
//! discriminator that was read.
//!
//! Decoding the object into the resolved type is left to the codec layer
//! (`polyjson-codec`).
//!
//! # Public API
//!
//! - [`resolve()`] -- resolve one object against a rule set
//! - [`Resolver`] -- rule set plus predicate registry for one supertype
//! - [`RuleSet`], [`RuleSetBuilder`], [`RuleSetDecl`] -- rule declaration
//! - [`PredicateRegistry`] -- named predicates scoped by supertype
//! - [`ResolutionError`] -- every way resolution can fail

pub mod config;
pub mod error;
pub mod registry;
pub mod resolve;
pub mod rules;
pub mod types;

pub use config::ResolverConfig;
pub use error::ResolutionError;
pub use registry::{PredicateRegistry, PredicateSignature, Receiver, ReturnKind};
pub use resolve::{discriminator, resolve, resolve_rule, Resolver};
pub use rules::{Matcher, Rule, RuleDecl, RuleSet, RuleSetBuilder, RuleSetDecl};
pub use types::{
    json_kind, ConcreteType, RawObject, SupertypeId, DEFAULT_DISCRIMINATOR, DEFAULT_FIELD_NAME,
};
