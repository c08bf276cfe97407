//! Node-gateway wire protocol
//!
//! Request and response shapes for the JSON-RPC methods the harness speaks.
//! Balances travel as decimal strings so that `u128` survives JSON.

use psp34_crypto::keccak256;
use psp34_primitives::{AccountId, Balance, Nonce, Weight, H256};
use serde::{Deserialize, Serialize};

/// RPC method names
pub mod method {
    /// Chain metadata
    pub const CHAIN_INFO: &str = "chain_getInfo";
    /// Next nonce for an account
    pub const ACCOUNT_NEXT_INDEX: &str = "system_accountNextIndex";
    /// Deploy a contract instance
    pub const INSTANTIATE: &str = "contracts_instantiate";
    /// Dry-run a message
    pub const CALL: &str = "contracts_call";
    /// Submit a signed message and wait for finalization
    pub const SUBMIT_AND_WATCH: &str = "contracts_submitAndWatch";
}

/// RPC error codes
pub mod code {
    /// Bad signature, stale nonce or insufficient funds
    pub const INVALID_TRANSACTION: i64 = 1010;
    /// Gas limit below requirement; data carries `{required, provided}`
    pub const OUT_OF_GAS: i64 = 1011;
    /// No contract at the destination address
    pub const CONTRACT_NOT_FOUND: i64 = 1012;
    /// Contract trapped or the message selector is unknown
    pub const CONTRACT_TRAPPED: i64 = 1013;
    /// Method not found (JSON-RPC)
    pub const METHOD_NOT_FOUND: i64 = -32601;
    /// Invalid params (JSON-RPC)
    pub const INVALID_PARAMS: i64 = -32602;
    /// Internal error (JSON-RPC)
    pub const INTERNAL: i64 = -32603;
}

/// Chain metadata returned by `chain_getInfo`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainInfo {
    /// Chain name
    pub chain: String,
    /// Decimals of the native token
    pub token_decimals: u8,
    /// Best block number
    pub best_block: u64,
}

/// Message call, used both for dry runs and as the signed payload
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRequest {
    /// Caller
    pub origin: AccountId,
    /// Contract address
    pub dest: AccountId,
    /// Message name
    pub message: String,
    /// Arguments in message order
    pub args: Vec<serde_json::Value>,
    /// Attached native value
    #[serde(with = "balance_string")]
    pub value: Balance,
    /// Execution budget; dry runs leave this unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<Weight>,
}

/// Signed message submission
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedCall {
    /// The call being authorized
    pub call: CallRequest,
    /// Origin nonce
    pub nonce: Nonce,
    /// Hex signature over [`signing_hash`] of `call` and `nonce`
    pub signature: String,
}

/// Contract instantiation request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstantiateRequest {
    /// Deployer
    pub origin: AccountId,
    /// Constructor name
    pub constructor: String,
    /// Constructor arguments in schema order
    pub args: Vec<serde_json::Value>,
    /// Endowment
    #[serde(with = "balance_string")]
    pub value: Balance,
    /// Execution budget
    pub gas_limit: Weight,
}

/// Signed instantiation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedInstantiate {
    /// The request being authorized
    pub request: InstantiateRequest,
    /// Origin nonce
    pub nonce: Nonce,
    /// Hex signature
    pub signature: String,
}

/// Event as emitted on the wire
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Event name
    pub name: String,
    /// Named arguments
    pub args: serde_json::Map<String, serde_json::Value>,
}

/// Dry-run outcome
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DryRunResult {
    /// Raw return value
    pub result: serde_json::Value,
    /// Budget the call needs
    pub gas_required: Weight,
    /// Budget the call used
    pub gas_consumed: Weight,
}

/// Finalized submission outcome
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResult {
    /// Raw return value
    pub result: serde_json::Value,
    /// Budget the call used
    pub gas_consumed: Weight,
    /// Emitted events, in emission order
    #[serde(default)]
    pub events: Vec<RawEvent>,
    /// Finalized block
    pub block_hash: H256,
}

/// Instantiation outcome
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstantiateResult {
    /// New contract address
    pub address: AccountId,
    /// Budget the constructor used
    pub gas_consumed: Weight,
    /// Emitted events
    #[serde(default)]
    pub events: Vec<RawEvent>,
    /// Finalized block
    pub block_hash: H256,
}

/// Data attached to an out-of-gas rejection
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutOfGasData {
    /// Budget the call needs
    pub required: Weight,
    /// Budget that was supplied
    pub provided: Weight,
}

/// Hash a payload for signing: keccak256(canonical JSON ‖ nonce little-endian)
///
/// `serde_json` emits struct fields in declaration order and map keys
/// sorted, so both sides of the wire derive the same bytes.
pub fn signing_hash<T: Serialize>(payload: &T, nonce: Nonce) -> Result<H256, serde_json::Error> {
    let mut bytes = serde_json::to_vec(payload)?;
    bytes.extend_from_slice(&nonce.to_le_bytes());
    Ok(keccak256(&bytes))
}

/// Balances as decimal strings
pub mod balance_string {
    use psp34_primitives::Balance;
    use serde::{de, Deserialize, Deserializer, Serializer};

    /// Serialize as a decimal string
    pub fn serialize<S: Serializer>(value: &Balance, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    /// Parse from a decimal string
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Balance, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
