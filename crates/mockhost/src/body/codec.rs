//! Conversion between wire bodies and typed values.
//!
//! Decoding feeds the raw body into a serde deserializer chosen by the body
//! type: JSON goes through the endpoint's settings, plain text is a string,
//! bytes are a sequence of `u8`, form bodies are a string map. A target type
//! that cannot be built from that shape fails with `UnsupportedBodyType`.
//! Form bodies never fill structs, only maps and `serde_json::Value`.
//!
//! Encoding works on a `serde_json::Value` so handler results and auth error
//! payloads share one path.

use super::{BodyError, BodyType, Charset, EndpointSettings};
use bytes::Bytes;
use serde::de::value::{Error as ValueError, MapDeserializer, SeqDeserializer, StringDeserializer};
use serde::de::{DeserializeOwned, Deserializer, Error as _, IntoDeserializer, Visitor};
use serde::forward_to_deserialize_any;
use serde_json::Value;
use std::any::type_name;

/// An encoded response body and the content type that describes it.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedBody {
    pub bytes: Bytes,
    pub content_type: &'static str,
}

/// Decode a raw request body into `T` according to `body_type`.
pub fn decode<T: DeserializeOwned>(
    body: &[u8],
    body_type: BodyType,
    charset: Charset,
    settings: &EndpointSettings,
) -> Result<T, BodyError> {
    let target = type_name::<T>();
    match body_type {
        BodyType::Json => settings.deserialize(&charset.decode(body)),
        BodyType::PlainText => {
            let text: StringDeserializer<ValueError> = charset.decode(body).into_deserializer();
            T::deserialize(text).map_err(|e| BodyError::unsupported(body_type, target, e))
        }
        BodyType::Bytes => {
            let bytes = SeqDeserializer::<_, ValueError>::new(body.iter().copied());
            T::deserialize(bytes).map_err(|e| BodyError::unsupported(body_type, target, e))
        }
        BodyType::FormUrlEncoded => {
            let form = FormDeserializer {
                pairs: parse_form(&charset.decode(body)),
            };
            T::deserialize(form).map_err(|e| BodyError::unsupported(body_type, target, e))
        }
        BodyType::Unsupported => Err(BodyError::unsupported(
            body_type,
            target,
            "no decoder registered",
        )),
    }
}

/// Encode a payload for a response. `Ok(None)` means no body at all.
///
/// For [`BodyType::Bytes`], a JSON array whose items are all integers in
/// `0..=255` is sent as those raw bytes, since that is what `Vec<u8>` and
/// `[u8; N]` serialize to. Any other payload, including an array such as
/// `[1, 300]`, is sent as its text form.
pub fn encode(
    value: &Value,
    body_type: BodyType,
    charset: Charset,
    settings: &EndpointSettings,
) -> Result<Option<EncodedBody>, BodyError> {
    if value.is_null() {
        return Ok(None);
    }

    let Some(content_type) = body_type.content_type() else {
        return Err(BodyError::unsupported(
            body_type,
            "response",
            "no encoder registered",
        ));
    };

    let bytes = match body_type {
        BodyType::Json => charset.encode(&settings.serialize_value(value)?),
        BodyType::Bytes => {
            byte_sequence(value).unwrap_or_else(|| charset.encode(&text_form(value)))
        }
        BodyType::FormUrlEncoded => charset.encode(&serialize_form(value)?),
        BodyType::PlainText | BodyType::Unsupported => charset.encode(&text_form(value)),
    };

    Ok(Some(EncodedBody {
        bytes: Bytes::from(bytes),
        content_type,
    }))
}

/// Split `a=1&b=2` into percent-decoded pairs, with `+` read as a space. A
/// pair without `=` has an empty value; empty segments are skipped.
pub fn parse_form(body: &str) -> Vec<(String, String)> {
    body.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (percent_decode(key), percent_decode(value))
        })
        .collect()
}

/// Parsed form pairs, visited as a map. Struct targets are refused so a form
/// body only ever lands in a string map or a dynamic `Value`.
struct FormDeserializer {
    pairs: Vec<(String, String)>,
}

impl<'de> Deserializer<'de> for FormDeserializer {
    type Error = ValueError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_map(MapDeserializer::new(self.pairs.into_iter()))
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_any(visitor)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        _fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        Err(ValueError::custom(format!(
            "form bodies decode into string maps, not struct {name}"
        )))
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct enum identifier ignored_any
    }
}

fn percent_decode(raw: &str) -> String {
    let raw = raw.replace('+', " ");
    urlencoding::decode(&raw)
        .map(|decoded| decoded.into_owned())
        .unwrap_or(raw)
}

fn serialize_form(value: &Value) -> Result<String, BodyError> {
    let Value::Object(map) = value else {
        return Err(BodyError::unsupported(
            BodyType::FormUrlEncoded,
            "response",
            "form bodies must be a string map",
        ));
    };

    Ok(map
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(&text_form(value))
            )
        })
        .collect::<Vec<_>>()
        .join("&"))
}

// `Vec<u8>` serializes to an array of small integers.
fn byte_sequence(value: &Value) -> Option<Vec<u8>> {
    let Value::Array(items) = value else {
        return None;
    };
    items
        .iter()
        .map(|item| item.as_u64().and_then(|n| u8::try_from(n).ok()))
        .collect()
}

fn text_form(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
