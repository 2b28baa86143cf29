//! Request and response body encodings.
//!
//! This module provides:
//! - `BodyType`: the wire encodings an endpoint can speak
//! - `Charset`: text <-> byte conversion used by the text-based encodings
//! - `EndpointSettings`: overridable JSON (de)serialization delegates
//! - `codec`: decode/encode between raw bodies and typed values
//!
//! Strategy selection is a plain `match` on `BodyType`; typed conversion goes
//! through serde, so there is no runtime type inspection.

pub mod codec;
mod settings;

pub use settings::EndpointSettings;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire encoding of a request or response payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BodyType {
    #[default]
    Json,
    PlainText,
    Bytes,
    FormUrlEncoded,
    /// Sentinel for an encoding the codec does not handle. Every decode or
    /// encode with it fails with [`BodyError::UnsupportedBodyType`].
    Unsupported,
}

impl BodyType {
    /// Content type emitted for a response encoded with this body type.
    pub fn content_type(self) -> Option<&'static str> {
        match self {
            BodyType::Json => Some("application/json"),
            BodyType::PlainText => Some("text/plain"),
            BodyType::Bytes => Some("application/octet-stream"),
            BodyType::FormUrlEncoded => Some("application/x-www-form-urlencoded"),
            BodyType::Unsupported => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BodyType::Json => "json",
            BodyType::PlainText => "plainText",
            BodyType::Bytes => "bytes",
            BodyType::FormUrlEncoded => "formUrlEncoded",
            BodyType::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for BodyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Character encoding for text bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Charset {
    #[default]
    Utf8,
    /// ISO-8859-1. Characters outside U+0000..=U+00FF encode as `?`.
    Latin1,
}

impl Charset {
    /// Decode raw bytes into text. Invalid UTF-8 is replaced, not rejected.
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Charset::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Charset::Latin1 => bytes.iter().map(|&b| b as char).collect(),
        }
    }

    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            Charset::Utf8 => text.as_bytes().to_vec(),
            Charset::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
                .collect(),
        }
    }
}

/// Body conversion failures.
#[derive(Debug, thiserror::Error)]
pub enum BodyError {
    #[error("Body type '{body_type}' is not supported for {target}: {reason}")]
    UnsupportedBodyType {
        body_type: BodyType,
        target: &'static str,
        reason: String,
    },
    #[error("Serialization failed: {0}")]
    Codec(#[source] anyhow::Error),
}

impl BodyError {
    pub(crate) fn unsupported(
        body_type: BodyType,
        target: &'static str,
        reason: impl fmt::Display,
    ) -> Self {
        BodyError::UnsupportedBodyType {
            body_type,
            target,
            reason: reason.to_string(),
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, BodyError::UnsupportedBodyType { .. })
    }
}
