//! Decoded contract values
//!
//! The node renders contract data as JSON with two quirks: token ids are
//! tagged objects (`{"u64": 1}`) and wide integers may arrive wrapped as
//! `{"rawNumber": "…"}`. [`Value`] keeps both visible until
//! [`Value::normalized`] collapses the wrapping.

use psp34_primitives::{AccountId, Id, U256};
use std::collections::BTreeMap;
use std::fmt;

use crate::{HarnessError, HarnessResult};

/// Key of the wrapped big-integer form
pub const RAW_NUMBER_KEY: &str = "rawNumber";

const ID_TAGS: [&str; 6] = ["u8", "u16", "u32", "u64", "u128", "bytes"];

/// Decoded contract value
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    /// Unit / `None`
    Null,
    /// Boolean
    Bool(bool),
    /// Plain integer
    Int(U256),
    /// Integer that arrived as `{"rawNumber": …}`
    Wrapped(U256),
    /// String; addresses are hex strings
    Str(String),
    /// Tagged token id
    Id(Id),
    /// Sequence
    List(Vec<Value>),
    /// Named fields
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Decode node JSON
    pub fn from_json(json: &serde_json::Value) -> HarnessResult<Value> {
        match json {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
            serde_json::Value::Number(n) => n
                .as_u64()
                .map(|v| Value::Int(U256::from(v)))
                .ok_or_else(|| {
                    HarnessError::MalformedResponse(format!("unsupported number {}", n))
                }),
            serde_json::Value::String(s) => Ok(Value::Str(s.clone())),
            serde_json::Value::Array(items) => items
                .iter()
                .map(Value::from_json)
                .collect::<HarnessResult<Vec<_>>>()
                .map(Value::List),
            serde_json::Value::Object(map) => {
                if map.len() == 1 {
                    if let Some((key, inner)) = map.iter().next() {
                        if key == RAW_NUMBER_KEY {
                            return parse_integer(inner).map(Value::Wrapped);
                        }
                        if ID_TAGS.contains(&key.as_str()) {
                            return parse_id(key, inner).map(Value::Id);
                        }
                    }
                }
                map.iter()
                    .map(|(k, v)| Ok((k.clone(), Value::from_json(v)?)))
                    .collect::<HarnessResult<BTreeMap<_, _>>>()
                    .map(Value::Map)
            }
        }
    }

    /// Encode as node JSON
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(v) if *v <= U256::from(u64::MAX) => serde_json::Value::from(v.low_u64()),
            Value::Int(v) | Value::Wrapped(v) => {
                serde_json::json!({ "rawNumber": v.to_string() })
            }
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::Id(id) => id_to_json(id),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }

    /// Collapse every wrapped integer into a plain one, recursively
    pub fn normalized(&self) -> Value {
        match self {
            Value::Wrapped(v) => Value::Int(*v),
            Value::List(items) => Value::List(items.iter().map(Value::normalized).collect()),
            Value::Map(map) => Value::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.normalized()))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// Whether this is `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Boolean value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer value, wrapped or not
    pub fn as_u256(&self) -> Option<U256> {
        match self {
            Value::Int(v) | Value::Wrapped(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer value if it fits `u128`
    pub fn as_u128(&self) -> Option<u128> {
        self.as_u256()
            .filter(|v| *v <= U256::from(u128::MAX))
            .map(|v| v.as_u128())
    }

    /// Integer value if it fits `u64`
    pub fn as_u64(&self) -> Option<u64> {
        self.as_u256()
            .filter(|v| *v <= U256::from(u64::MAX))
            .map(|v| v.low_u64())
    }

    /// String value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Token id value
    pub fn as_id(&self) -> Option<&Id> {
        match self {
            Value::Id(id) => Some(id),
            _ => None,
        }
    }

    /// Parse a string value as an address
    pub fn as_account(&self) -> HarnessResult<AccountId> {
        let s = self
            .as_str()
            .ok_or_else(|| HarnessError::MalformedResponse(format!("expected address, got {}", self)))?;
        Ok(AccountId::from_hex(s)?)
    }

    /// Look up a field of a `Map`
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Map(map) => map.get(name),
            _ => None,
        }
    }

    /// Wrap an integer the way the node renders `u64`/`u128` returns
    pub fn wrapped(value: impl Into<U256>) -> Value {
        Value::Wrapped(value.into())
    }
}

fn parse_integer(json: &serde_json::Value) -> HarnessResult<U256> {
    match json {
        serde_json::Value::Number(n) => n
            .as_u64()
            .map(U256::from)
            .ok_or_else(|| HarnessError::MalformedResponse(format!("unsupported number {}", n))),
        serde_json::Value::String(s) => {
            let parsed = match s.strip_prefix("0x") {
                Some(hex) => U256::from_str_radix(hex, 16).map_err(|e| format!("{:?}", e)),
                None => U256::from_dec_str(s).map_err(|e| format!("{:?}", e)),
            };
            parsed.map_err(|e| HarnessError::MalformedResponse(format!("bad integer {:?}: {}", s, e)))
        }
        other => Err(HarnessError::MalformedResponse(format!(
            "expected integer, got {}",
            other
        ))),
    }
}

fn parse_id(tag: &str, json: &serde_json::Value) -> HarnessResult<Id> {
    if tag == "bytes" {
        let s = json
            .as_str()
            .ok_or_else(|| HarnessError::MalformedResponse(format!("bad bytes id {}", json)))?;
        let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s))
            .map_err(|e| HarnessError::MalformedResponse(e.to_string()))?;
        return Ok(Id::Bytes(bytes));
    }
    let value = parse_integer(json)?;
    if value > U256::from(u128::MAX) {
        return Err(HarnessError::MalformedResponse(format!("id {} exceeds u128", value)));
    }
    Ok(Id::from_tagged(tag, value.as_u128())?)
}

fn id_to_json(id: &Id) -> serde_json::Value {
    let inner = match id {
        Id::Bytes(bytes) => serde_json::Value::String(format!("0x{}", hex::encode(bytes))),
        Id::U128(v) if *v > u64::MAX as u128 => serde_json::Value::String(v.to_string()),
        numeric => serde_json::Value::from(numeric.as_u128().unwrap_or_default() as u64),
    };
    let mut map = serde_json::Map::new();
    map.insert(id.tag().to_string(), inner);
    serde_json::Value::Object(map)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

macro_rules! impl_from_uint {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Int(U256::from(v))
            }
        })*
    };
}

impl_from_uint!(u8, u16, u32, u64, u128);

impl From<U256> for Value {
    fn from(v: U256) -> Self {
        Value::Int(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<AccountId> for Value {
    fn from(v: AccountId) -> Self {
        Value::Str(v.to_hex())
    }
}

impl From<&AccountId> for Value {
    fn from(v: &AccountId) -> Self {
        Value::Str(v.to_hex())
    }
}

impl From<Id> for Value {
    fn from(v: Id) -> Self {
        Value::Id(v)
    }
}

impl From<&Id> for Value {
    fn from(v: &Id) -> Self {
        Value::Id(v.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}
