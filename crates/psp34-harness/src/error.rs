//! Harness error types

use psp34_primitives::Weight;
use thiserror::Error;

/// Harness error type
///
/// Contract-level rejections are not errors: they arrive as
/// `CallOutcome::result == Err(ContractError)`.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Transport/network error
    #[error("Transport error: {0}")]
    Transport(String),

    /// RPC error from node
    #[error("RPC error: {code} - {message}")]
    Rpc {
        /// Error code
        code: i64,
        /// Error message
        message: String,
        /// Structured error data, if the node sent any
        data: Option<serde_json::Value>,
    },

    /// Execution budget below what the message needs
    #[error("Insufficient budget for {method}: required {required}, provided {provided}")]
    InsufficientBudget {
        /// Message name
        method: String,
        /// Estimated or reported requirement
        required: Weight,
        /// Budget the caller supplied
        provided: Weight,
    },

    /// Node answered with something the harness cannot interpret
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Message table violation (unknown message, wrong arity)
    #[error("ABI error: {0}")]
    Abi(String),

    /// No event with the expected name was emitted
    #[error("Event not found: {name} (emitted: {available:?})")]
    EventNotFound {
        /// Expected event name
        name: String,
        /// Names of the events that were emitted
        available: Vec<String>,
    },

    /// Harness-side assertion failed
    #[error("Assertion mismatch on {subject}: expected {expected}, got {actual}")]
    AssertionMismatch {
        /// What was compared
        subject: String,
        /// Expected rendering
        expected: String,
        /// Actual rendering
        actual: String,
    },

    /// A success value was required but the contract rejected the call
    #[error("Contract rejected {message}: {identifier}")]
    UnexpectedDomainError {
        /// Message name
        message: String,
        /// Decoded error identifier
        identifier: String,
    },

    /// Custom-error payload is not valid hex
    #[error("Malformed error payload: {0}")]
    MalformedPayload(String),

    /// Signing or key derivation failed
    #[error("Signer error: {0}")]
    Signer(String),

    /// Configuration could not be loaded
    #[error("Config error: {0}")]
    Config(String),

    /// Deployment arguments or instantiation failed
    #[error("Deploy error: {0}")]
    Deploy(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Harness result alias
pub type HarnessResult<T> = Result<T, HarnessError>;

impl From<serde_json::Error> for HarnessError {
    fn from(e: serde_json::Error) -> Self {
        HarnessError::Serialization(e.to_string())
    }
}

impl From<psp34_crypto::CryptoError> for HarnessError {
    fn from(e: psp34_crypto::CryptoError) -> Self {
        HarnessError::Signer(e.to_string())
    }
}

impl From<psp34_primitives::AccountIdError> for HarnessError {
    fn from(e: psp34_primitives::AccountIdError) -> Self {
        HarnessError::MalformedResponse(e.to_string())
    }
}

impl From<psp34_primitives::IdError> for HarnessError {
    fn from(e: psp34_primitives::IdError) -> Self {
        HarnessError::MalformedResponse(e.to_string())
    }
}

impl From<toml::de::Error> for HarnessError {
    fn from(e: toml::de::Error) -> Self {
        HarnessError::Config(e.to_string())
    }
}

impl From<std::io::Error> for HarnessError {
    fn from(e: std::io::Error) -> Self {
        HarnessError::Config(e.to_string())
    }
}
