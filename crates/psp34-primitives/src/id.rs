//! PSP34 token identifier

use std::fmt;
use thiserror::Error;

/// Token id parsing error
#[derive(Debug, Error)]
pub enum IdError {
    /// Unknown variant tag
    #[error("unknown id variant: {0}")]
    UnknownVariant(String),
    /// Value does not fit the tagged width
    #[error("value {value} does not fit id variant {tag}")]
    OutOfRange {
        /// Variant tag
        tag: String,
        /// Offending value
        value: u128,
    },
}

/// Tagged PSP34 token identifier
///
/// Collections choose one variant for all their tokens; Shiden34 mints
/// `Id::U64` values starting at 1.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Id {
    /// 8-bit id
    U8(u8),
    /// 16-bit id
    U16(u16),
    /// 32-bit id
    U32(u32),
    /// 64-bit id
    U64(u64),
    /// 128-bit id
    U128(u128),
    /// Arbitrary bytes id
    #[cfg_attr(feature = "serde", serde(with = "hex_bytes"))]
    Bytes(Vec<u8>),
}

impl Id {
    /// Variant tag as used on the wire (`"u64"`, `"bytes"`, ...)
    pub fn tag(&self) -> &'static str {
        match self {
            Id::U8(_) => "u8",
            Id::U16(_) => "u16",
            Id::U32(_) => "u32",
            Id::U64(_) => "u64",
            Id::U128(_) => "u128",
            Id::Bytes(_) => "bytes",
        }
    }

    /// Build a numeric id from its wire tag
    pub fn from_tagged(tag: &str, value: u128) -> Result<Self, IdError> {
        let out_of_range = || IdError::OutOfRange {
            tag: tag.to_string(),
            value,
        };
        match tag {
            "u8" => u8::try_from(value).map(Id::U8).map_err(|_| out_of_range()),
            "u16" => u16::try_from(value).map(Id::U16).map_err(|_| out_of_range()),
            "u32" => u32::try_from(value).map(Id::U32).map_err(|_| out_of_range()),
            "u64" => u64::try_from(value).map(Id::U64).map_err(|_| out_of_range()),
            "u128" => Ok(Id::U128(value)),
            other => Err(IdError::UnknownVariant(other.to_string())),
        }
    }

    /// Numeric value of the id, if it is a numeric variant
    pub fn as_u128(&self) -> Option<u128> {
        match self {
            Id::U8(v) => Some(*v as u128),
            Id::U16(v) => Some(*v as u128),
            Id::U32(v) => Some(*v as u128),
            Id::U64(v) => Some(*v as u128),
            Id::U128(v) => Some(*v),
            Id::Bytes(_) => None,
        }
    }

    /// Value of a `U64` id
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Id::U64(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<u64> for Id {
    fn from(value: u64) -> Self {
        Id::U64(value)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Bytes(bytes) => write!(f, "bytes(0x{})", hex::encode(bytes)),
            numeric => write!(
                f,
                "{}({})",
                numeric.tag(),
                numeric.as_u128().unwrap_or_default()
            ),
        }
    }
}

#[cfg(feature = "serde")]
mod hex_bytes {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        hex::decode(s).map_err(de::Error::custom)
    }
}
