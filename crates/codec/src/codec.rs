//! The per-supertype codec: resolver plus one decoder/encoder per subtype.

use polyjson_resolver::{
    ConcreteType, PredicateRegistry, PredicateSignature, RawObject, ResolutionError, Resolver,
    ResolverConfig, Rule, RuleSet, RuleSetBuilder, RuleSetDecl, SupertypeId,
};
use serde_json::Value;
use std::any::TypeId;
use std::fmt;

use crate::error::BuildError;
use crate::subtype::Subtype;

type DecodeFn<S> = Box<dyn Fn(Value) -> Result<S, serde_json::Error> + Send + Sync>;
type EncodeFn<S> = Box<dyn Fn(&S) -> Option<Result<Value, serde_json::Error>> + Send + Sync>;

/// Decoder and encoder for one concrete subtype.
pub(crate) struct Variant<S> {
    pub(crate) concrete: ConcreteType,
    type_id: TypeId,
    /// Literal tag written back on encode, if the subtype has one.
    pub(crate) tag: Option<String>,
    pub(crate) decode: DecodeFn<S>,
    pub(crate) encode: EncodeFn<S>,
}

impl<S: 'static> Variant<S> {
    fn of<C: Subtype<S>>(concrete: ConcreteType) -> Self {
        Variant {
            concrete,
            type_id: TypeId::of::<C>(),
            tag: None,
            decode: Box::new(|value: Value| serde_json::from_value::<C>(value).map(C::upcast)),
            encode: Box::new(|value: &S| C::downcast(value).map(serde_json::to_value)),
        }
    }
}

// ──────────────────────────────────────────────
// PolymorphicCodec
// ──────────────────────────────────────────────

/// Decodes JSON objects into the supertype `S` by resolving their concrete
/// subtype first, and encodes `S` back with the subtype's tag.
///
/// Built once (typically behind a `static OnceLock`) and shared read-only.
pub struct PolymorphicCodec<S> {
    resolver: Resolver,
    variants: Vec<Variant<S>>,
    /// Index into `variants` for each rule, in rule order.
    by_rule: Vec<usize>,
}

impl<S: 'static> PolymorphicCodec<S> {
    /// Start a codec for `S`, identified by its unqualified type name.
    pub fn builder() -> CodecBuilder<S> {
        Self::builder_for(SupertypeId::of::<S>())
    }

    pub fn builder_for(supertype: SupertypeId) -> CodecBuilder<S> {
        CodecBuilder {
            rules: RuleSet::builder(supertype.clone()),
            supertype,
            predicates: PredicateRegistry::new(),
            variants: Vec::new(),
            conflict: None,
        }
    }

    /// Start a codec from declared rules. Each declared target still needs a
    /// subtype registered with [`CodecBuilder::variant`] or
    /// [`CodecBuilder::variant_named`].
    pub fn from_decl(decl: RuleSetDecl) -> CodecBuilder<S> {
        let mut builder = Self::builder_for(decl.supertype).field_name(decl.field_name);
        for rule in decl.rules {
            builder = builder.rule(Rule::from(rule));
        }
        builder
    }
}

impl<S> PolymorphicCodec<S> {
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn supertype(&self) -> &SupertypeId {
        self.resolver.supertype()
    }

    pub fn rules(&self) -> &RuleSet {
        self.resolver.rules()
    }

    /// Concrete types this codec can decode, in registration order.
    pub fn concrete_types(&self) -> impl Iterator<Item = &ConcreteType> {
        self.variants.iter().map(|v| &v.concrete)
    }

    /// Resolve the concrete type of `object` without decoding it.
    pub fn resolve(&self, object: &RawObject) -> Result<ConcreteType, ResolutionError> {
        self.resolver.resolve(object)
    }

    /// Resolve `object` and return the subtype its winning rule targets.
    pub(crate) fn resolve_variant(
        &self,
        object: &RawObject,
    ) -> Result<&Variant<S>, ResolutionError> {
        let rule = self.resolver.resolve_rule(object)?;
        Ok(&self.variants[self.by_rule[rule]])
    }

    pub(crate) fn variants(&self) -> &[Variant<S>] {
        &self.variants
    }
}

impl<S> fmt::Debug for PolymorphicCodec<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolymorphicCodec")
            .field("resolver", &self.resolver)
            .field("variants", &self.concrete_types().collect::<Vec<_>>())
            .finish()
    }
}

// ──────────────────────────────────────────────
// CodecBuilder
// ──────────────────────────────────────────────

/// Declares the rules, subtypes, and predicates of a [`PolymorphicCodec`].
///
/// Rules keep the order in which they are added.
pub struct CodecBuilder<S> {
    supertype: SupertypeId,
    rules: RuleSetBuilder,
    predicates: PredicateRegistry,
    variants: Vec<Variant<S>>,
    conflict: Option<BuildError>,
}

impl<S: 'static> CodecBuilder<S> {
    pub fn field_name(mut self, field_name: impl Into<String>) -> Self {
        self.rules = self.rules.field_name(field_name);
        self
    }

    pub fn config(mut self, config: ResolverConfig) -> Self {
        self.rules = self.rules.config(config);
        self
    }

    /// Register subtype `C` under its unqualified type name, without adding a rule.
    pub fn variant<C: Subtype<S>>(self) -> Self {
        self.variant_named::<C>(ConcreteType::of::<C>())
    }

    /// Register subtype `C` under an explicit concrete type name. Naming a
    /// second, different subtype the same way fails [`CodecBuilder::build`].
    pub fn variant_named<C: Subtype<S>>(mut self, concrete: ConcreteType) -> Self {
        let existing = self
            .variants
            .iter()
            .find(|v| v.concrete == concrete)
            .map(|v| v.type_id);
        match existing {
            None => self.variants.push(Variant::of::<C>(concrete)),
            Some(type_id) if type_id != TypeId::of::<C>() => {
                self.conflict.get_or_insert(BuildError::DuplicateVariant {
                    supertype: self.supertype.to_string(),
                    concrete,
                });
            }
            Some(_) => {}
        }
        self
    }

    /// Objects whose discriminator equals `tag` decode as `C`.
    pub fn literal<C: Subtype<S>>(mut self, tag: impl Into<String>) -> Self {
        self.rules = self.rules.literal(tag, ConcreteType::of::<C>());
        self.variant::<C>()
    }

    /// Objects for which the predicate `name` holds decode as `C`.
    pub fn when<C: Subtype<S>>(mut self, name: impl Into<String>) -> Self {
        self.rules = self.rules.predicate(name, ConcreteType::of::<C>());
        self.variant::<C>()
    }

    /// Add a rule for `C` in alias notation: `"circle"` or `"{isCircle}"`.
    pub fn alias<C: Subtype<S>>(mut self, alias: &str) -> Self {
        self.rules = self.rules.alias(alias, ConcreteType::of::<C>());
        self.variant::<C>()
    }

    /// Add a prebuilt rule, e.g. one targeting a [`CodecBuilder::variant_named`] subtype.
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules = self.rules.rule(rule);
        self
    }

    pub fn predicate<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&RawObject) -> bool + Send + Sync + 'static,
    {
        self.predicates.register(&self.supertype, name, f);
        self
    }

    pub fn predicate_optional<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&RawObject) -> Option<bool> + Send + Sync + 'static,
    {
        self.predicates.register_optional(&self.supertype, name, f);
        self
    }

    pub fn predicate_fallible<F, E>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&RawObject) -> Result<bool, E> + Send + Sync + 'static,
        E: fmt::Display + 'static,
    {
        self.predicates.register_fallible(&self.supertype, name, f);
        self
    }

    /// Register a runtime-typed predicate; a rejected signature fails here.
    pub fn predicate_erased<F, E>(
        mut self,
        name: impl Into<String>,
        signature: &PredicateSignature,
        f: F,
    ) -> Result<Self, BuildError>
    where
        F: Fn(&RawObject) -> Result<Value, E> + Send + Sync + 'static,
        E: fmt::Display + 'static,
    {
        self.predicates
            .register_erased(&self.supertype, name, signature, f)?;
        Ok(self)
    }

    /// Freeze the rules and check that every rule targets exactly one
    /// registered subtype.
    pub fn build(self) -> Result<PolymorphicCodec<S>, BuildError> {
        if let Some(conflict) = self.conflict {
            return Err(conflict);
        }
        let rules = self.rules.build();
        let mut variants = self.variants;

        let mut by_rule = Vec::with_capacity(rules.len());
        for (index, rule) in rules.iter().enumerate() {
            let position = variants
                .iter()
                .position(|v| v.concrete == rule.target)
                .ok_or_else(|| BuildError::MissingVariant {
                    supertype: self.supertype.to_string(),
                    index,
                    target: rule.target.clone(),
                })?;
            by_rule.push(position);
        }

        for variant in &mut variants {
            variant.tag = rules.literal_for(&variant.concrete).map(str::to_string);
            if !rules.targets().contains(&&variant.concrete) {
                tracing::warn!(
                    supertype = %self.supertype,
                    concrete = %variant.concrete,
                    "subtype is registered but no rule resolves to it"
                );
            }
        }

        Ok(PolymorphicCodec {
            resolver: Resolver::new(rules, self.predicates),
            variants,
            by_rule,
        })
    }
}
