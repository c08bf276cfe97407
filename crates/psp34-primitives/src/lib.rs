//! # psp34-primitives
//!
//! Primitive types shared by the PSP34 harness and the development node.
//!
//! This crate provides account identifiers, hashes and the tagged token
//! identifier used by PSP34 collections.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod account;
mod hash;
mod id;

pub use account::{AccountId, AccountIdError};
pub use hash::{Hash, HashError, H256};
pub use id::{Id, IdError};

// Re-export primitive-types for U256
pub use primitive_types::U256;

/// Native token amount (smallest unit)
pub type Balance = u128;

/// Execution weight (reference time component)
pub type Weight = u64;

/// Account nonce type
pub type Nonce = u64;

/// Block timestamp in milliseconds
pub type Timestamp = u64;
