//! # psp34-crypto
//!
//! Cryptographic primitives for the PSP34 harness.
//!
//! - Keccak-256 hashing
//! - ECDSA signing/verification (secp256k1)
//! - Public key recovery
//! - Account id derivation
//! - Deterministic dev keypairs from URIs such as `//Alice`

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod hash;
mod keypair;
mod signature;

pub use error::CryptoError;
pub use hash::keccak256;
pub use keypair::Keypair;
pub use signature::{
    public_key_to_account, recover_account, recover_public_key, sign, verify, PrivateKey,
    PublicKey, Signature,
};
