//! Ordered rule sets that map discriminator tags or named predicates to
//! concrete types.
//!
//! A [`RuleSet`] is assembled once, either through [`RuleSet::builder`] or
//! from a deserialized [`RuleSetDecl`], and is immutable afterwards. Rule
//! order is significant: the first matching rule wins.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::config::ResolverConfig;
use crate::types::{ConcreteType, SupertypeId, DEFAULT_FIELD_NAME};

// ── Matcher ─────────────────────────────────────────────────────────

/// How a rule decides whether it applies to an object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Matcher {
    /// Exact, case-sensitive equality against the discriminator value.
    Literal(String),
    /// A registered predicate, invoked with the whole object.
    Predicate(String),
}

impl Matcher {
    pub fn literal(value: impl Into<String>) -> Self {
        Matcher::Literal(value.into())
    }

    pub fn predicate(name: impl Into<String>) -> Self {
        Matcher::Predicate(name.into())
    }

    /// Parse the compact alias notation: `"{isCircle}"` names a predicate,
    /// anything else is a literal tag.
    pub fn parse_alias(alias: &str) -> Self {
        match alias
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
        {
            Some(name) => Matcher::Predicate(name.to_string()),
            None => Matcher::Literal(alias.to_string()),
        }
    }

    /// Inverse of [`Matcher::parse_alias`].
    pub fn to_alias(&self) -> String {
        match self {
            Matcher::Literal(value) => value.clone(),
            Matcher::Predicate(name) => format!("{{{}}}", name),
        }
    }

    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Matcher::Literal(value) => Some(value),
            Matcher::Predicate(_) => None,
        }
    }

    pub fn as_predicate(&self) -> Option<&str> {
        match self {
            Matcher::Literal(_) => None,
            Matcher::Predicate(name) => Some(name),
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Literal(value) => write!(f, "'{}'", value),
            Matcher::Predicate(name) => write!(f, "{{{}}}", name),
        }
    }
}

// ── Rule ────────────────────────────────────────────────────────────

/// A single (matcher, target type) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub matcher: Matcher,
    pub target: ConcreteType,
}

impl Rule {
    pub fn new(matcher: Matcher, target: ConcreteType) -> Self {
        Rule { matcher, target }
    }
}

// ── RuleSet ─────────────────────────────────────────────────────────

/// The ordered, immutable rules attached to one supertype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    supertype: SupertypeId,
    config: ResolverConfig,
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn builder(supertype: SupertypeId) -> RuleSetBuilder {
        RuleSetBuilder {
            supertype,
            config: ResolverConfig::default(),
            rules: Vec::new(),
        }
    }

    pub fn supertype(&self) -> &SupertypeId {
        &self.supertype
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// The JSON key read as the discriminator for this supertype.
    pub fn field_name(&self) -> &str {
        &self.config.field_name
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Distinct predicate names referenced by the rules, in declaration order.
    pub fn predicate_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.rules
            .iter()
            .filter_map(|r| r.matcher.as_predicate())
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// Distinct target types, in declaration order.
    pub fn targets(&self) -> Vec<&ConcreteType> {
        let mut seen = HashSet::new();
        self.rules
            .iter()
            .map(|r| &r.target)
            .filter(|target| seen.insert(*target))
            .collect()
    }

    /// First literal tag that resolves to `target`, if any. A literal already
    /// claimed by an earlier rule for another type is skipped.
    pub fn literal_for(&self, target: &ConcreteType) -> Option<&str> {
        let mut seen = HashSet::new();
        for rule in &self.rules {
            let Some(tag) = rule.matcher.as_literal() else {
                continue;
            };
            if seen.insert(tag) && &rule.target == target {
                return Some(tag);
            }
        }
        None
    }

    /// Indices of rules that can never win because an earlier rule has the
    /// same matcher. Predicates are pure, so a repeated predicate name is
    /// as dead as a repeated literal.
    pub fn unreachable_rules(&self) -> Vec<usize> {
        let mut seen = HashSet::new();
        let mut dead = Vec::new();
        for (index, rule) in self.rules.iter().enumerate() {
            if !seen.insert(&rule.matcher) {
                dead.push(index);
            }
        }
        dead
    }

    /// Serializable declaration equivalent to this rule set. Rules are
    /// written in alias notation, except literals that would read back as
    /// predicates (`"{legacy}"`).
    pub fn to_decl(&self) -> RuleSetDecl {
        RuleSetDecl {
            supertype: self.supertype.clone(),
            field_name: self.config.field_name.clone(),
            rules: self.rules.iter().map(RuleDecl::from).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

// ── RuleSetBuilder ──────────────────────────────────────────────────

/// Assembles a [`RuleSet`] in declaration order.
#[derive(Debug, Clone)]
pub struct RuleSetBuilder {
    supertype: SupertypeId,
    config: ResolverConfig,
    rules: Vec<Rule>,
}

impl RuleSetBuilder {
    pub fn config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn field_name(mut self, field_name: impl Into<String>) -> Self {
        self.config.field_name = field_name.into();
        self
    }

    pub fn literal(self, value: impl Into<String>, target: ConcreteType) -> Self {
        self.rule(Rule::new(Matcher::literal(value), target))
    }

    pub fn predicate(self, name: impl Into<String>, target: ConcreteType) -> Self {
        self.rule(Rule::new(Matcher::predicate(name), target))
    }

    /// Add a rule in alias notation (see [`Matcher::parse_alias`]).
    pub fn alias(self, alias: &str, target: ConcreteType) -> Self {
        self.rule(Rule::new(Matcher::parse_alias(alias), target))
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Freeze the rules. Unreachable rules are kept but logged as warnings.
    pub fn build(self) -> RuleSet {
        let set = RuleSet {
            supertype: self.supertype,
            config: self.config,
            rules: self.rules,
        };
        for index in set.unreachable_rules() {
            let rule = &set.rules[index];
            tracing::warn!(
                supertype = %set.supertype,
                index,
                matcher = %rule.matcher,
                target = %rule.target,
                "rule is unreachable: an earlier rule has the same matcher"
            );
        }
        set
    }
}

// ── Declarations ────────────────────────────────────────────────────

/// A rule set declared as data, e.g. loaded from a configuration file.
///
/// ```json
/// { "supertype": "Shape", "field_name": "@type",
///   "rules": [ {"alias": "circle", "target": "Circle"},
///              {"predicate": "isSquare", "target": "Square"} ] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSetDecl {
    pub supertype: SupertypeId,
    #[serde(default = "default_field_name")]
    pub field_name: String,
    #[serde(default)]
    pub rules: Vec<RuleDecl>,
}

fn default_field_name() -> String {
    DEFAULT_FIELD_NAME.to_string()
}

/// One declared rule. Exactly one of `literal`, `predicate`, or `alias`
/// names the matcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleDecl {
    Literal {
        literal: String,
        target: ConcreteType,
    },
    Predicate {
        predicate: String,
        target: ConcreteType,
    },
    Alias {
        alias: String,
        target: ConcreteType,
    },
}

impl From<RuleDecl> for Rule {
    fn from(decl: RuleDecl) -> Self {
        match decl {
            RuleDecl::Literal { literal, target } => Rule::new(Matcher::Literal(literal), target),
            RuleDecl::Predicate { predicate, target } => {
                Rule::new(Matcher::Predicate(predicate), target)
            }
            RuleDecl::Alias { alias, target } => Rule::new(Matcher::parse_alias(&alias), target),
        }
    }
}

impl From<&Rule> for RuleDecl {
    fn from(rule: &Rule) -> Self {
        let alias = rule.matcher.to_alias();
        let target = rule.target.clone();
        match &rule.matcher {
            Matcher::Literal(literal) if Matcher::parse_alias(&alias) != rule.matcher => {
                RuleDecl::Literal {
                    literal: literal.clone(),
                    target,
                }
            }
            _ => RuleDecl::Alias { alias, target },
        }
    }
}

impl From<RuleSetDecl> for RuleSet {
    fn from(decl: RuleSetDecl) -> Self {
        decl.rules
            .into_iter()
            .fold(
                RuleSet::builder(decl.supertype).field_name(decl.field_name),
                |builder, rule| builder.rule(rule.into()),
            )
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn circle() -> ConcreteType {
        ConcreteType::from_static("Circle")
    }

    fn square() -> ConcreteType {
        ConcreteType::from_static("Square")
    }

    fn shapes() -> RuleSetBuilder {
        RuleSet::builder(SupertypeId::from_static("Shape"))
    }

    #[test]
    fn alias_in_braces_is_predicate() {
        assert_eq!(
            Matcher::parse_alias("{isCircle}"),
            Matcher::Predicate("isCircle".to_string())
        );
        assert_eq!(
            Matcher::parse_alias("circle"),
            Matcher::Literal("circle".to_string())
        );
    }

    #[test]
    fn half_braced_alias_is_literal() {
        assert_eq!(Matcher::parse_alias("{open"), Matcher::literal("{open"));
        assert_eq!(Matcher::parse_alias("close}"), Matcher::literal("close}"));
        assert_eq!(Matcher::parse_alias("{}"), Matcher::predicate(""));
    }

    #[test]
    fn alias_notation_round_trips() {
        for alias in ["circle", "{isCircle}", "default"] {
            assert_eq!(Matcher::parse_alias(alias).to_alias(), alias);
        }
    }

    #[test]
    fn builder_preserves_declaration_order() {
        let rules = shapes()
            .literal("circle", circle())
            .predicate("hasSide", square())
            .alias("{hasRadius}", circle())
            .build();

        let matchers: Vec<String> = rules.iter().map(|r| r.matcher.to_string()).collect();
        assert_eq!(matchers, vec!["'circle'", "{hasSide}", "{hasRadius}"]);
        assert_eq!(rules.field_name(), "type");
        assert_eq!(rules.predicate_names(), vec!["hasSide", "hasRadius"]);
        assert_eq!(rules.targets(), vec![&circle(), &square()]);
    }

    #[test]
    fn literal_for_returns_first_literal_of_target() {
        let rules = shapes()
            .predicate("hasRadius", circle())
            .literal("circle", circle())
            .literal("round", circle())
            .build();
        assert_eq!(rules.literal_for(&circle()), Some("circle"));
        assert_eq!(rules.literal_for(&square()), None);
    }

    #[test]
    fn literal_for_skips_tags_claimed_by_earlier_rules() {
        let rules = shapes()
            .literal("round", circle())
            .literal("round", square())
            .literal("square", square())
            .build();
        assert_eq!(rules.literal_for(&circle()), Some("round"));
        assert_eq!(rules.literal_for(&square()), Some("square"));

        let shadowed = shapes()
            .literal("box", circle())
            .literal("box", square())
            .build();
        assert_eq!(shadowed.literal_for(&square()), None);
    }

    #[test]
    fn duplicate_matchers_are_unreachable() {
        let rules = shapes()
            .literal("circle", circle())
            .literal("square", square())
            .literal("circle", square())
            .predicate("hasSide", square())
            .predicate("hasSide", circle())
            .build();
        assert_eq!(rules.unreachable_rules(), vec![2, 4]);
    }

    #[test]
    fn literal_and_predicate_with_same_text_do_not_collide() {
        let rules = shapes()
            .literal("x", circle())
            .predicate("x", square())
            .build();
        assert!(rules.unreachable_rules().is_empty());
    }

    #[test]
    fn empty_rule_set_is_allowed() {
        let rules = shapes().build();
        assert!(rules.is_empty());
        assert_eq!(rules.len(), 0);
        assert!(rules.unreachable_rules().is_empty());
    }

    #[test]
    fn declaration_builds_rule_set() {
        let decl: RuleSetDecl = serde_json::from_value(json!({
            "supertype": "Shape",
            "field_name": "@type",
            "rules": [
                {"literal": "circle", "target": "Circle"},
                {"predicate": "hasSide", "target": "Square"},
                {"alias": "{hasRadius}", "target": "Circle"},
                {"alias": "square", "target": "Square"}
            ]
        }))
        .unwrap();

        let rules = RuleSet::from(decl);
        assert_eq!(rules.supertype().as_str(), "Shape");
        assert_eq!(rules.field_name(), "@type");
        assert_eq!(
            rules.rules(),
            &[
                Rule::new(Matcher::literal("circle"), circle()),
                Rule::new(Matcher::predicate("hasSide"), square()),
                Rule::new(Matcher::predicate("hasRadius"), circle()),
                Rule::new(Matcher::literal("square"), square()),
            ]
        );
    }

    #[test]
    fn declaration_defaults_field_name() {
        let decl: RuleSetDecl = serde_json::from_value(json!({
            "supertype": "Shape",
            "rules": [{"alias": "circle", "target": "Circle"}]
        }))
        .unwrap();
        assert_eq!(decl.field_name, "type");
    }

    #[test]
    fn rule_set_round_trips_through_declaration() {
        let rules = shapes()
            .field_name("kind")
            .literal("circle", circle())
            .predicate("hasSide", square())
            .build();

        let json = serde_json::to_value(rules.to_decl()).unwrap();
        assert_eq!(json["rules"][1], json!({"alias": "{hasSide}", "target": "Square"}));

        let back: RuleSetDecl = serde_json::from_value(json).unwrap();
        assert_eq!(RuleSet::from(back), rules);
    }

    #[test]
    fn braced_literal_stays_literal_through_declaration() {
        let rules = shapes()
            .literal("{legacy}", circle())
            .alias("{hasSide}", square())
            .build();

        let json = serde_json::to_value(rules.to_decl()).unwrap();
        assert_eq!(json["rules"][0], json!({"literal": "{legacy}", "target": "Circle"}));

        let back: RuleSetDecl = serde_json::from_value(json).unwrap();
        let back = RuleSet::from(back);
        assert_eq!(back.rules()[0].matcher, Matcher::literal("{legacy}"));
        assert_eq!(back, rules);
    }
}
