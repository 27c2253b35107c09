use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::PolymorphicCodec;

/// A concrete type that is one of the shapes of supertype `S`.
///
/// `S` is usually an enum with one variant per concrete type:
///
/// ```ignore
/// impl Subtype<Shape> for Circle {
///     fn upcast(self) -> Shape { Shape::Circle(self) }
///     fn downcast(shape: &Shape) -> Option<&Self> {
///         match shape { Shape::Circle(c) => Some(c), _ => None }
///     }
/// }
/// ```
pub trait Subtype<S>: Serialize + DeserializeOwned + 'static {
    fn upcast(self) -> S;

    fn downcast(value: &S) -> Option<&Self>;
}

/// A supertype with a single, process-wide codec.
///
/// Implementing this lets [`crate::deserialize`] and [`crate::serialize`]
/// back the supertype's own `Deserialize`/`Serialize` impls, so it decodes
/// polymorphically wherever serde meets it (nested fields, `Vec<S>`, maps).
pub trait Polymorphic: Sized + 'static {
    fn codec() -> &'static PolymorphicCodec<Self>;
}
