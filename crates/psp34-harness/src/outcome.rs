//! Call outcomes, domain errors and emitted events

use psp34_primitives::{Weight, H256};
use std::collections::BTreeMap;
use std::fmt;

use crate::config::ResultUnwrapping;
use crate::rpc::RawEvent;
use crate::value::Value;
use crate::{error_decoder, HarnessError, HarnessResult};

/// Rejection reported by the contract itself
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContractError {
    /// Custom error carrying a hex payload; see [`error_decoder::decode`]
    Custom(String),
    /// Standard PSP34 error kind, e.g. `TokenNotExists`
    Standard(String),
}

impl ContractError {
    /// Parse the `err` payload of a fallible message
    ///
    /// Accepts `{"custom": "0x…"}`, `{"tokenNotExists": null}` and the
    /// bare string form `"TokenNotExists"`.
    pub fn from_json(json: &serde_json::Value) -> HarnessResult<Self> {
        match json {
            serde_json::Value::String(kind) => Ok(ContractError::Standard(pascal_case(kind))),
            serde_json::Value::Object(map) if map.len() == 1 => {
                let (key, inner) = map
                    .iter()
                    .next()
                    .ok_or_else(|| HarnessError::MalformedResponse("empty error".to_string()))?;
                if key.eq_ignore_ascii_case("custom") {
                    let payload = inner.as_str().ok_or_else(|| {
                        HarnessError::MalformedResponse(format!("custom error payload {}", inner))
                    })?;
                    Ok(ContractError::Custom(payload.to_string()))
                } else {
                    Ok(ContractError::Standard(pascal_case(key)))
                }
            }
            other => Err(HarnessError::MalformedResponse(format!(
                "unrecognized contract error {}",
                other
            ))),
        }
    }

    /// Wire rendering
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ContractError::Custom(payload) => serde_json::json!({ "custom": payload }),
            ContractError::Standard(kind) => {
                let mut map = serde_json::Map::new();
                map.insert(camel_case(kind), serde_json::Value::Null);
                serde_json::Value::Object(map)
            }
        }
    }

    /// Identifier string: the decoded payload for custom errors, the kind
    /// name for standard ones
    pub fn identifier(&self) -> HarnessResult<String> {
        match self {
            ContractError::Custom(payload) => error_decoder::decode(payload),
            ContractError::Standard(kind) => Ok(kind.clone()),
        }
    }

    /// Raw payload of a custom error
    pub fn custom_payload(&self) -> Option<&str> {
        match self {
            ContractError::Custom(payload) => Some(payload),
            ContractError::Standard(_) => None,
        }
    }
}

impl fmt::Display for ContractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractError::Custom(payload) => match error_decoder::decode(payload) {
                Ok(identifier) => write!(f, "Custom({})", identifier),
                Err(_) => write!(f, "Custom({})", payload),
            },
            ContractError::Standard(kind) => write!(f, "{}", kind),
        }
    }
}

impl std::error::Error for ContractError {}

fn pascal_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn camel_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// One emitted event
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventRecord {
    /// Event name
    pub name: String,
    /// Named arguments
    pub args: BTreeMap<String, Value>,
}

impl EventRecord {
    /// Decode a wire event
    pub fn from_raw(raw: &RawEvent) -> HarnessResult<Self> {
        let args = raw
            .args
            .iter()
            .map(|(k, v)| Ok((k.clone(), Value::from_json(v)?)))
            .collect::<HarnessResult<BTreeMap<_, _>>>()?;
        Ok(Self {
            name: raw.name.clone(),
            args,
        })
    }

    /// Argument by name
    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }

    /// Arguments with wrapped integers collapsed
    pub fn normalized_args(&self) -> BTreeMap<String, Value> {
        self.args
            .iter()
            .map(|(k, v)| (k.clone(), v.normalized()))
            .collect()
    }
}

/// Result of a query or a finalized transaction
#[derive(Clone, Debug, PartialEq)]
pub struct CallOutcome {
    /// Message name
    pub message: String,
    /// Decoded return value, or the contract's rejection
    pub result: Result<Value, ContractError>,
    /// Budget the call needs (from the dry run; equals consumed for transactions)
    pub gas_required: Weight,
    /// Budget the call used
    pub gas_consumed: Weight,
    /// Emitted events in emission order; empty for queries
    pub events: Vec<EventRecord>,
    /// Finalized block; `None` for queries
    pub block_hash: Option<H256>,
}

impl CallOutcome {
    /// Whether the contract accepted the call
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Success value
    pub fn value(&self) -> Option<&Value> {
        self.result.as_ref().ok()
    }

    /// Contract rejection
    pub fn domain_error(&self) -> Option<&ContractError> {
        self.result.as_ref().err()
    }

    /// Decoded identifier of the rejection, if any
    pub fn error_identifier(&self) -> HarnessResult<Option<String>> {
        self.domain_error().map(ContractError::identifier).transpose()
    }

    /// Take the success value, turning a rejection into an error
    pub fn expect_value(self) -> HarnessResult<Value> {
        match self.result {
            Ok(value) => Ok(value),
            Err(err) => Err(HarnessError::UnexpectedDomainError {
                identifier: err.to_string(),
                message: self.message,
            }),
        }
    }

    /// Take the rejection, failing if the call succeeded
    pub fn expect_domain_error(self) -> HarnessResult<ContractError> {
        match self.result {
            Err(err) => Ok(err),
            Ok(value) => Err(HarnessError::AssertionMismatch {
                subject: format!("{} result", self.message),
                expected: "contract error".to_string(),
                actual: value.to_string(),
            }),
        }
    }

    /// Names of emitted events in order
    pub fn event_names(&self) -> Vec<String> {
        self.events.iter().map(|e| e.name.clone()).collect()
    }
}

fn envelope(json: &serde_json::Value) -> Option<(&str, &serde_json::Value)> {
    let map = json.as_object()?;
    if map.len() != 1 {
        return None;
    }
    let (key, inner) = map.iter().next()?;
    match key.as_str() {
        "ok" | "Ok" => Some(("ok", inner)),
        "err" | "Err" => Some(("err", inner)),
        _ => None,
    }
}

/// Decode a raw return value under the profile's unwrapping convention
pub fn decode_result(
    raw: &serde_json::Value,
    unwrapping: ResultUnwrapping,
) -> HarnessResult<Result<Value, ContractError>> {
    let inner = match unwrapping {
        ResultUnwrapping::Auto => raw,
        ResultUnwrapping::Explicit => match envelope(raw) {
            Some(("ok", inner)) => inner,
            Some((_, dispatch)) => {
                return Err(HarnessError::MalformedResponse(format!(
                    "dispatch error: {}",
                    dispatch
                )))
            }
            None => {
                return Err(HarnessError::MalformedResponse(format!(
                    "expected dispatch envelope, got {}",
                    raw
                )))
            }
        },
    };

    match envelope(inner) {
        Some(("ok", value)) => Ok(Ok(Value::from_json(value)?)),
        Some((_, err)) => Ok(Err(ContractError::from_json(err)?)),
        None => Ok(Ok(Value::from_json(inner)?)),
    }
}
