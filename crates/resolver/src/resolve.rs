//! First-match-wins type resolution.
//!
//! The main entry point is [`resolve`], which reads the discriminator from a
//! raw object and walks a [`RuleSet`] in declaration order. [`Resolver`]
//! bundles a rule set with its predicate registry for callers that resolve
//! many objects of the same supertype.

use serde_json::Value;

use crate::error::ResolutionError;
use crate::registry::PredicateRegistry;
use crate::rules::{Matcher, RuleSet};
use crate::types::{ConcreteType, RawObject, SupertypeId, DEFAULT_DISCRIMINATOR};

/// Read the discriminator from `object`.
///
/// Returns the string stored under `field_name`, or the `"default"`
/// sentinel when the field is absent or does not hold a string.
pub fn discriminator<'a>(object: &'a RawObject, field_name: &str) -> &'a str {
    object
        .get(field_name)
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_DISCRIMINATOR)
}

/// Pick the concrete type `object` represents.
///
/// Rules are tried in declaration order; literal rules compare against the
/// discriminator, predicate rules invoke the predicate registered for
/// `supertype`. The first match wins. When nothing matches the error carries
/// the discriminator that was read, including the `"default"` sentinel.
/// A failing predicate aborts resolution with its own error.
pub fn resolve(
    object: &RawObject,
    supertype: &SupertypeId,
    rules: &RuleSet,
    predicates: &PredicateRegistry,
) -> Result<ConcreteType, ResolutionError> {
    let index = resolve_rule(object, supertype, rules, predicates)?;
    Ok(rules.rules()[index].target.clone())
}

/// Like [`resolve`], but returns the index of the winning rule.
pub fn resolve_rule(
    object: &RawObject,
    supertype: &SupertypeId,
    rules: &RuleSet,
    predicates: &PredicateRegistry,
) -> Result<usize, ResolutionError> {
    let value = discriminator(object, rules.field_name());

    for (index, rule) in rules.iter().enumerate() {
        let matched = match &rule.matcher {
            Matcher::Literal(tag) => tag == value,
            Matcher::Predicate(name) => predicates.invoke(supertype, name, object)?,
        };
        if matched {
            tracing::debug!(
                supertype = %supertype,
                discriminator = value,
                rule = index,
                target = %rule.target,
                "resolved concrete type"
            );
            return Ok(index);
        }
    }

    tracing::debug!(
        supertype = %supertype,
        discriminator = value,
        rules = rules.len(),
        "no rule matched"
    );
    Err(ResolutionError::UnknownDiscriminator {
        supertype: supertype.to_string(),
        value: value.to_string(),
    })
}

/// A rule set paired with the predicates its rules refer to.
#[derive(Debug, Clone)]
pub struct Resolver {
    rules: RuleSet,
    predicates: PredicateRegistry,
}

impl Resolver {
    /// Pair `rules` with `predicates`. Predicate names the registry does not
    /// know are logged; invoking one still fails with `PredicateNotFound`.
    pub fn new(rules: RuleSet, predicates: PredicateRegistry) -> Self {
        for name in rules.predicate_names() {
            if !predicates.contains(rules.supertype(), name) {
                tracing::warn!(
                    supertype = %rules.supertype(),
                    predicate = name,
                    "rule refers to a predicate that is not registered"
                );
            }
        }
        Resolver { rules, predicates }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn predicates(&self) -> &PredicateRegistry {
        &self.predicates
    }

    pub fn supertype(&self) -> &SupertypeId {
        self.rules.supertype()
    }

    /// Resolve against this resolver's own supertype.
    pub fn resolve(&self, object: &RawObject) -> Result<ConcreteType, ResolutionError> {
        resolve(object, self.rules.supertype(), &self.rules, &self.predicates)
    }

    /// Index of the rule that resolves `object`.
    pub fn resolve_rule(&self, object: &RawObject) -> Result<usize, ResolutionError> {
        resolve_rule(object, self.rules.supertype(), &self.rules, &self.predicates)
    }
}
