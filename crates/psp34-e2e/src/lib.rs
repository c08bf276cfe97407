//! # psp34-e2e
//!
//! End-to-end suites for PSP34 collections, run against an in-process
//! development node.
//!
//! ## Design Philosophy
//!
//! 1. **Black-box**: Suites talk to [`DevNode`] only through the harness
//!    transport, exactly as they would talk to a live gateway
//! 2. **Isolated**: Each test deploys its own contract on its own node
//! 3. **Profile-driven**: One node serves every contract profile; the
//!    profile picks constructor layout, envelopes and mint gating
//! 4. **Fast**: No network, no disk
//!
//! ## Usage
//!
//! ```ignore
//! cargo test -p psp34-e2e
//! ```

#![warn(missing_docs)]

pub mod contract;
pub mod gas;
mod node;
mod scenarios;

pub use contract::{MintingStatus, Psp34Double, Psp34Error};
pub use node::{DevNode, BLOCK_TIME_MS, FUNDED_BALANCE, GENESIS_TIMESTAMP};

use psp34_harness::rpc::{code, OutOfGasData};
use psp34_harness::HarnessError;
use psp34_primitives::Weight;

/// Node result
pub type NodeResult<T> = Result<T, DevNodeError>;

/// Rejections raised by the development node before or instead of a
/// contract result
#[derive(Debug, thiserror::Error)]
pub enum DevNodeError {
    /// Bad signature, stale nonce or insufficient funds
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    /// Supplied gas limit below the message weight
    #[error("out of gas: required {required}, provided {provided}")]
    OutOfGas {
        /// Weight the message needs
        required: Weight,
        /// Weight that was supplied
        provided: Weight,
    },

    /// No contract at the destination
    #[error("contract not found: {0}")]
    ContractNotFound(String),

    /// Contract trapped, e.g. undecodable input or unknown selector
    #[error("contract trapped: {0}")]
    Trapped(String),

    /// Params did not match the method
    #[error("invalid params: {0}")]
    InvalidParams(String),

    /// Method not served by this node
    #[error("method not found: {0}")]
    UnknownMethod(String),
}

impl DevNodeError {
    /// JSON-RPC error code
    pub fn code(&self) -> i64 {
        match self {
            DevNodeError::InvalidTransaction(_) => code::INVALID_TRANSACTION,
            DevNodeError::OutOfGas { .. } => code::OUT_OF_GAS,
            DevNodeError::ContractNotFound(_) => code::CONTRACT_NOT_FOUND,
            DevNodeError::Trapped(_) => code::CONTRACT_TRAPPED,
            DevNodeError::InvalidParams(_) => code::INVALID_PARAMS,
            DevNodeError::UnknownMethod(_) => code::METHOD_NOT_FOUND,
        }
    }

    /// Render as the error a gateway would return
    pub fn into_rpc(self) -> HarnessError {
        let data = match &self {
            DevNodeError::OutOfGas { required, provided } => serde_json::to_value(OutOfGasData {
                required: *required,
                provided: *provided,
            })
            .ok(),
            _ => None,
        };
        HarnessError::Rpc {
            code: self.code(),
            message: self.to_string(),
            data,
        }
    }
}

impl From<serde_json::Error> for DevNodeError {
    fn from(e: serde_json::Error) -> Self {
        DevNodeError::InvalidParams(e.to_string())
    }
}

impl From<psp34_crypto::CryptoError> for DevNodeError {
    fn from(e: psp34_crypto::CryptoError) -> Self {
        DevNodeError::InvalidTransaction(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_gas_carries_data() {
        let err = DevNodeError::OutOfGas {
            required: 100,
            provided: 40,
        }
        .into_rpc();
        match err {
            HarnessError::Rpc { code: c, data, .. } => {
                assert_eq!(c, code::OUT_OF_GAS);
                let data: OutOfGasData = serde_json::from_value(data.unwrap()).unwrap();
                assert_eq!(data.required, 100);
                assert_eq!(data.provided, 40);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_codes() {
        assert_eq!(DevNodeError::Trapped("x".into()).code(), code::CONTRACT_TRAPPED);
        assert_eq!(DevNodeError::UnknownMethod("x".into()).code(), code::METHOD_NOT_FOUND);
    }
}
