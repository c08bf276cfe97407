//! # psp34-harness
//!
//! Black-box verification harness for PSP34 NFT contracts.
//!
//! Provides:
//! - A JSON-RPC [`Connection`] over a pluggable [`Transport`]
//! - Signer-scoped [`ContractSession`]s for queries and finalized transactions
//! - [`CallOutcome`]s that keep contract rejections as typed values
//! - Event assertions and custom-error decoding
//! - Contract profiles, deployment and a process-wide [`TestRun`] fixture
//!
//! # Example
//!
//! ```no_run
//! use psp34_harness::{ConstructorArgs, HarnessConfig, TestRun};
//!
//! async fn example() -> Result<(), psp34_harness::HarnessError> {
//!     let run = TestRun::setup(HarnessConfig::from_env()?).await?;
//!     let nft = run.deploy_psp34(&ConstructorArgs::default()).await?;
//!
//!     let minted = nft.mint_next().await?;
//!     assert!(minted.is_ok());
//!     assert_eq!(nft.total_supply().await?, 1);
//!
//!     run.teardown();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod connection;
pub mod contract;
pub mod deploy;
mod error;
pub mod error_decoder;
pub mod events;
pub mod fixture;
mod logging;
pub mod outcome;
pub mod psp34;
pub mod rpc;
pub mod session;
pub mod signer;
pub mod transport;
pub mod value;

pub use config::{
    ConstructorSchema, ContractProfile, ErrorIdentifiers, HarnessConfig, MintPhaseModel,
    ResultUnwrapping,
};
pub use connection::Connection;
pub use contract::{ContractSpec, MessageDef};
pub use deploy::{ConstructorArgs, Deployer};
pub use error::{HarnessError, HarnessResult};
pub use events::{assert_event, assert_no_event, EventArgs, OutcomeAssertions};
pub use fixture::{RunSummary, TestRun};
pub use logging::init_tracing;
pub use outcome::{CallOutcome, ContractError, EventRecord};
pub use psp34::Psp34;
pub use session::{CallOptions, ContractSession};
pub use signer::{Keyring, Signer};
pub use transport::{MockTransport, Transport};
pub use value::Value;

#[cfg(feature = "http")]
pub use transport::HttpTransport;

// Re-export primitives
pub use psp34_primitives::{AccountId, Balance, Id, Weight, H256, U256};
