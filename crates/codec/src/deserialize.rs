//! Decoding JSON into a polymorphic supertype.
//!
//! Every entry point funnels into [`PolymorphicCodec::decode_value`]:
//! resolve the concrete type from the raw object, then hand the same object
//! to `serde_json` for that type. Sequences are decoded element by element,
//! either stopping at the first failure ([`PolymorphicCodec::decode_seq`])
//! or reporting one result per element ([`PolymorphicCodec::decode_each`]).

use polyjson_resolver::json_kind;
use serde::de::{self, DeserializeSeed, Deserializer};
use serde::Deserialize;
use serde_json::Value;

use crate::codec::PolymorphicCodec;
use crate::error::CodecError;
use crate::subtype::Polymorphic;

impl<S> PolymorphicCodec<S> {
    /// Decode one JSON object.
    pub fn decode_value(&self, value: Value) -> Result<S, CodecError> {
        let object = match value {
            Value::Object(object) => object,
            other => {
                return Err(CodecError::NotAnObject {
                    supertype: self.supertype().to_string(),
                    found: json_kind(&other),
                })
            }
        };

        let variant = self.resolve_variant(&object)?;
        (variant.decode)(Value::Object(object)).map_err(|source| CodecError::Concrete {
            concrete: variant.concrete.clone(),
            source,
        })
    }

    pub fn decode_str(&self, json: &str) -> Result<S, CodecError> {
        self.decode_value(serde_json::from_str(json)?)
    }

    pub fn decode_slice(&self, json: &[u8]) -> Result<S, CodecError> {
        self.decode_value(serde_json::from_slice(json)?)
    }

    /// Decode a JSON array, failing on the first element that does not
    /// decode. The error names the element's index.
    pub fn decode_seq(&self, value: Value) -> Result<Vec<S>, CodecError> {
        self.expect_array(value)?
            .into_iter()
            .enumerate()
            .map(|(index, element)| {
                self.decode_value(element)
                    .map_err(|source| CodecError::Element {
                        index,
                        source: Box::new(source),
                    })
            })
            .collect()
    }

    pub fn decode_seq_str(&self, json: &str) -> Result<Vec<S>, CodecError> {
        self.decode_seq(serde_json::from_str(json)?)
    }

    /// Decode a JSON array into one result per element. Failed elements do
    /// not affect their siblings; only a non-array input fails as a whole.
    pub fn decode_each(&self, value: Value) -> Result<Vec<Result<S, CodecError>>, CodecError> {
        Ok(self
            .expect_array(value)?
            .into_iter()
            .map(|element| self.decode_value(element))
            .collect())
    }

    fn expect_array(&self, value: Value) -> Result<Vec<Value>, CodecError> {
        match value {
            Value::Array(elements) => Ok(elements),
            other => Err(CodecError::NotAnArray {
                supertype: self.supertype().to_string(),
                found: json_kind(&other),
            }),
        }
    }
}

/// Lets a codec drive any serde deserializer, e.g.
/// `codec.deserialize(&mut serde_json::Deserializer::from_str(json))`.
impl<'de, S> DeserializeSeed<'de> for &PolymorphicCodec<S> {
    type Value = S;

    fn deserialize<D>(self, deserializer: D) -> Result<S, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        self.decode_value(value).map_err(de::Error::custom)
    }
}

/// Deserialize a [`Polymorphic`] supertype through its codec.
///
/// Intended as the body of the supertype's `Deserialize` impl, or for use
/// with `#[serde(deserialize_with = "polyjson_codec::deserialize")]`.
pub fn deserialize<'de, D, S>(deserializer: D) -> Result<S, D::Error>
where
    D: Deserializer<'de>,
    S: Polymorphic,
{
    S::codec().deserialize(deserializer)
}
