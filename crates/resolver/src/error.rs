/// All errors that can be returned while resolving a concrete type.
///
/// Every variant is terminal for the resolution call that produced it and
/// names the discriminator value or predicate involved, so the message alone
/// is enough to diagnose a misconfigured rule set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    /// No rule matched. `value` is the discriminator that was read, or the
    /// `"default"` sentinel when the field was absent.
    #[error("unknown {supertype} type '{value}'")]
    UnknownDiscriminator { supertype: String, value: String },

    /// No predicate with this name is registered for the supertype.
    #[error("can't find predicate '{name}' for {supertype}")]
    PredicateNotFound { supertype: String, name: String },

    /// The predicate needs a receiver instance and cannot be called on a raw object alone.
    #[error("predicate '{name}' is not static")]
    PredicateNotStatic { name: String },

    /// The predicate's result is not a boolean.
    #[error("predicate '{name}' doesn't return a boolean (found {found})")]
    PredicateWrongReturnType { name: String, found: String },

    /// The predicate failed or panicked while running.
    #[error("can't invoke predicate '{name}': {cause}")]
    PredicateInvocationFailed { name: String, cause: String },

    /// The predicate produced no boolean at all.
    #[error("predicate '{name}' returned null")]
    PredicateReturnedNull { name: String },
}

impl ResolutionError {
    /// The predicate name carried by predicate-related errors.
    pub fn predicate_name(&self) -> Option<&str> {
        match self {
            ResolutionError::UnknownDiscriminator { .. } => None,
            ResolutionError::PredicateNotFound { name, .. }
            | ResolutionError::PredicateNotStatic { name }
            | ResolutionError::PredicateWrongReturnType { name, .. }
            | ResolutionError::PredicateInvocationFailed { name, .. }
            | ResolutionError::PredicateReturnedNull { name } => Some(name),
        }
    }
}
