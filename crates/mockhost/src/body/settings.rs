//! Overridable JSON serialization delegates.

use super::BodyError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

type SerializeFn = dyn Fn(&Value) -> anyhow::Result<String> + Send + Sync;
type DeserializeFn = dyn Fn(&str) -> anyhow::Result<Value> + Send + Sync;

/// Serialization policy shared by every JSON conversion of an endpoint.
///
/// The delegates work on `serde_json::Value`; typed values are converted
/// around them with `to_value`/`from_value`. Defaults are `serde_json`.
#[derive(Clone)]
pub struct EndpointSettings {
    serialize: Arc<SerializeFn>,
    deserialize: Arc<DeserializeFn>,
}

impl EndpointSettings {
    pub fn new() -> Self {
        Self {
            serialize: Arc::new(|value: &Value| -> anyhow::Result<String> {
                Ok(serde_json::to_string(value)?)
            }),
            deserialize: Arc::new(|text: &str| -> anyhow::Result<Value> {
                Ok(serde_json::from_str(text)?)
            }),
        }
    }

    /// Replace the serializer (e.g. pretty printing, key renaming).
    pub fn with_serializer<F>(mut self, serialize: F) -> Self
    where
        F: Fn(&Value) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        self.serialize = Arc::new(serialize);
        self
    }

    /// Replace the deserializer (e.g. a lenient parser).
    pub fn with_deserializer<F>(mut self, deserialize: F) -> Self
    where
        F: Fn(&str) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.deserialize = Arc::new(deserialize);
        self
    }

    pub fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, BodyError> {
        let value = serde_json::to_value(value).map_err(|e| BodyError::Codec(e.into()))?;
        self.serialize_value(&value)
    }

    pub fn deserialize<T: DeserializeOwned>(&self, text: &str) -> Result<T, BodyError> {
        let value = (self.deserialize)(text).map_err(BodyError::Codec)?;
        serde_json::from_value(value).map_err(|e| BodyError::Codec(e.into()))
    }

    pub(crate) fn serialize_value(&self, value: &Value) -> Result<String, BodyError> {
        (self.serialize)(value).map_err(BodyError::Codec)
    }
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EndpointSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointSettings").finish_non_exhaustive()
    }
}
