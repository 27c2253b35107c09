use polyjson_resolver::{ConcreteType, ResolutionError};

/// Errors while decoding or encoding a polymorphic value.
///
/// Resolution failures are wrapped unchanged, so the discriminator or
/// predicate name that caused them stays in the message.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// No concrete type could be chosen for the object.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// The input was valid JSON but not an object.
    #[error("expected a JSON object for {supertype}, got {found}")]
    NotAnObject {
        supertype: String,
        found: &'static str,
    },

    /// A sequence decode was handed something other than an array.
    #[error("expected a JSON array of {supertype}, got {found}")]
    NotAnArray {
        supertype: String,
        found: &'static str,
    },

    /// The object resolved, but does not decode as the resolved type.
    #[error("can't decode {concrete}: {source}")]
    Concrete {
        concrete: ConcreteType,
        #[source]
        source: serde_json::Error,
    },

    /// One element of a sequence failed.
    #[error("element {index}: {source}")]
    Element {
        index: usize,
        #[source]
        source: Box<CodecError>,
    },

    /// The value to encode is none of the registered subtypes.
    #[error("value is not a registered subtype of {supertype}")]
    UnknownSubtype { supertype: String },

    /// Malformed JSON text, or a concrete value that failed to serialize.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl CodecError {
    /// The resolution failure behind this error, looking through sequence
    /// element wrappers.
    pub fn resolution(&self) -> Option<&ResolutionError> {
        match self {
            CodecError::Resolution(err) => Some(err),
            CodecError::Element { source, .. } => source.resolution(),
            _ => None,
        }
    }
}

/// Errors while building a codec.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// A rule targets a concrete type with no registered subtype.
    #[error("{supertype} rule {index} targets {target}, which has no registered subtype")]
    MissingVariant {
        supertype: String,
        index: usize,
        target: ConcreteType,
    },

    /// Two different subtypes were registered under the same concrete name.
    #[error("{supertype} already has a different subtype registered as {concrete}")]
    DuplicateVariant {
        supertype: String,
        concrete: ConcreteType,
    },

    /// A runtime-typed predicate was rejected at registration.
    #[error(transparent)]
    Predicate(#[from] ResolutionError),
}
