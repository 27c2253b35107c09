//! polyjson-codec: polymorphic JSON decoding on top of serde_json.
//!
//! A [`PolymorphicCodec`] pairs the rule set of one supertype with a
//! decoder and encoder per concrete subtype. Decoding resolves the concrete
//! type of each object with `polyjson-resolver`, then lets `serde_json`
//! decode the same object as that type. Encoding serializes the concrete
//! value and writes its literal tag back into the discriminator field.
//!
//! A supertype that implements [`Polymorphic`] can use [`deserialize`] and
//! [`serialize`] as the bodies of its own serde impls, after which it
//! decodes polymorphically anywhere serde meets it, including inside
//! `Vec<S>` and nested struct fields.

pub mod codec;
pub mod deserialize;
pub mod error;
pub mod serialize;
pub mod subtype;

pub use codec::{CodecBuilder, PolymorphicCodec};
pub use deserialize::deserialize;
pub use error::{BuildError, CodecError};
pub use serialize::serialize;
pub use subtype::{Polymorphic, Subtype};

pub use polyjson_resolver as resolver;
pub use polyjson_resolver::{
    ConcreteType, PredicateSignature, RawObject, ResolutionError, ResolverConfig, RuleSetDecl,
    SupertypeId,
};
