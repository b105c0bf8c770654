use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::config::SerializerSettings;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct CodecError(String);

impl CodecError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        Self(err.to_string())
    }
}

/// Converts values to text and back. Used both for individual values and for
/// the whole store when it is written to disk.
pub trait Codec: Send + Sync {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, CodecError>;

    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, CodecError>;

    /// Whether encoded text represents an absent value, which is never stored.
    fn is_absent(&self, _encoded: &str) -> bool {
        false
    }
}

/// JSON codec backed by `serde_json`.
#[derive(Debug, Clone, Default)]
pub struct JsonCodec {
    pretty: bool,
}

impl JsonCodec {
    pub fn new(settings: &SerializerSettings) -> Self {
        Self {
            pretty: settings.pretty,
        }
    }
}

impl Codec for JsonCodec {
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, CodecError> {
        let text = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(text)
    }

    fn decode<T: DeserializeOwned>(&self, text: &str) -> Result<T, CodecError> {
        Ok(serde_json::from_str(text)?)
    }

    fn is_absent(&self, encoded: &str) -> bool {
        encoded.trim() == "null"
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn pretty_setting_controls_layout() {
        let value = BTreeMap::from([("a", 1)]);
        let compact = JsonCodec::default().encode(&value).expect("encode");
        let pretty = JsonCodec::new(&SerializerSettings { pretty: true })
            .encode(&value)
            .expect("encode");

        assert_eq!(compact, r#"{"a":1}"#);
        assert!(pretty.contains('\n'));
    }

    #[test]
    fn null_is_absent() {
        let codec = JsonCodec::default();
        let none: Option<u8> = None;
        assert!(codec.is_absent(&codec.encode(&none).expect("encode")));
        assert!(!codec.is_absent(&codec.encode(&Some(0u8)).expect("encode")));
        assert!(!codec.is_absent(r#""null""#));
    }

    #[test]
    fn decode_reports_type_mismatch() {
        let err = JsonCodec::default()
            .decode::<u32>(r#""not a number""#)
            .expect_err("should fail");
        assert!(err.to_string().contains("invalid type"));
    }
}
