//! Encoding a polymorphic supertype back to JSON.
//!
//! The concrete value is serialized as-is. Subtypes declared with a literal
//! tag also get that tag written into the discriminator field, unless the
//! concrete type already wrote one itself, so that the output decodes back
//! to the same subtype.

use serde::ser::{self, Serialize, Serializer};
use serde_json::Value;

use crate::codec::PolymorphicCodec;
use crate::error::CodecError;
use crate::subtype::Polymorphic;

impl<S> PolymorphicCodec<S> {
    pub fn encode(&self, value: &S) -> Result<Value, CodecError> {
        let (variant, encoded) = self
            .variants()
            .iter()
            .find_map(|variant| (variant.encode)(value).map(|encoded| (variant, encoded)))
            .ok_or_else(|| CodecError::UnknownSubtype {
                supertype: self.supertype().to_string(),
            })?;
        let mut encoded = encoded?;

        if let (Some(tag), Value::Object(object)) = (&variant.tag, &mut encoded) {
            let field = self.rules().field_name();
            if !object.contains_key(field) {
                object.insert(field.to_string(), Value::String(tag.clone()));
            }
        }
        Ok(encoded)
    }

    pub fn encode_string(&self, value: &S) -> Result<String, CodecError> {
        Ok(serde_json::to_string(&self.encode(value)?)?)
    }

    pub fn encode_seq<'a, I>(&self, values: I) -> Result<Value, CodecError>
    where
        I: IntoIterator<Item = &'a S>,
        S: 'a,
    {
        values
            .into_iter()
            .map(|value| self.encode(value))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }
}

/// Serialize a [`Polymorphic`] supertype through its codec.
///
/// Intended as the body of the supertype's `Serialize` impl, or for use with
/// `#[serde(serialize_with = "polyjson_codec::serialize")]`.
pub fn serialize<S, Ser>(value: &S, serializer: Ser) -> Result<Ser::Ok, Ser::Error>
where
    S: Polymorphic,
    Ser: Serializer,
{
    let encoded = S::codec()
        .encode(value)
        .map_err(<Ser::Error as ser::Error>::custom)?;
    encoded.serialize(serializer)
}
