//! Content dumps
//!
//! Properties and whole property stores serialize to JSON. A dump is either
//! plain JSON or a zstd frame wrapping it; readers detect which by the frame
//! magic, so callers never need to remember the compression level used.

use serde::{Deserialize, Serialize};

use crate::constraint::Constraint;
use crate::error::PropertyError;
use crate::flags::PropertyFlags;
use crate::value::PropertyValue;

const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];
const MAX_LEVEL: i32 = 22;

/// Persisted form of one property
///
/// `value` is absent for transient properties: their existence is saved,
/// their value is not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedProperty {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub documentation: String,
    #[serde(default)]
    pub flags: PropertyFlags,
    #[serde(default)]
    pub editor_mode: PropertyFlags,
    #[serde(default)]
    pub dynamic: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<PropertyValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<Constraint>,
}

/// Root of an object content dump
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertiesDump {
    #[serde(rename = "Properties")]
    pub properties: Vec<PersistedProperty>,
}

/// Wrap serialized bytes, compressing when `level > 0`
///
/// # Errors
/// Fails if the compressor fails.
pub fn encode(json: Vec<u8>, level: i32) -> Result<Vec<u8>, PropertyError> {
    if level <= 0 {
        return Ok(json);
    }
    Ok(zstd::encode_all(json.as_slice(), level.min(MAX_LEVEL))?)
}

/// Unwrap bytes produced by [`encode`]
///
/// # Errors
/// Fails if the bytes carry a zstd frame that does not decompress.
pub fn decode(bytes: &[u8]) -> Result<Vec<u8>, PropertyError> {
    if bytes.starts_with(&ZSTD_MAGIC) {
        zstd::decode_all(bytes).map_err(|e| PropertyError::Codec(e.to_string()))
    } else {
        Ok(bytes.to_vec())
    }
}

/// Serialize and encode any dump
///
/// # Errors
/// Fails on serialization or compression errors.
pub fn dump<T: Serialize>(value: &T, level: i32) -> Result<Vec<u8>, PropertyError> {
    encode(serde_json::to_vec(value)?, level)
}

/// Decode and deserialize any dump
///
/// # Errors
/// Fails on decompression or deserialization errors.
pub fn load<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T, PropertyError> {
    let json = decode(bytes)?;
    Ok(serde_json::from_slice(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compressed_dump_is_detected() {
        let dump_value = PropertiesDump::default();
        let plain = dump(&dump_value, 0).unwrap();
        let packed = dump(&dump_value, 9).unwrap();
        assert!(plain.starts_with(b"{"));
        assert!(packed.starts_with(&ZSTD_MAGIC));

        let a: PropertiesDump = load(&plain).unwrap();
        let b: PropertiesDump = load(&packed).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn root_is_named_properties() {
        let json = String::from_utf8(dump(&PropertiesDump::default(), 0).unwrap()).unwrap();
        assert_eq!(json, r#"{"Properties":[]}"#);
    }

    #[test]
    fn corrupt_frame_is_an_error() {
        let mut bytes = ZSTD_MAGIC.to_vec();
        bytes.extend_from_slice(&[1, 2, 3]);
        assert!(matches!(decode(&bytes), Err(PropertyError::Codec(_))));
    }
}
