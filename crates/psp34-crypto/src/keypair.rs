//! Signing keypairs and deterministic dev-key derivation

use k256::ecdsa::SigningKey;
use psp34_primitives::{AccountId, H256};
use rand::rngs::OsRng;
use zeroize::Zeroize;

use crate::{keccak256, public_key_to_account, sign, CryptoError, PublicKey, Signature};

/// Domain separator mixed into URI-derived seeds
const URI_DOMAIN: &[u8] = b"psp34-keyring:";

/// Number of re-hash attempts before giving up on a URI
const MAX_DERIVATION_ROUNDS: u8 = 8;

/// Secp256k1 keypair with its derived account id
///
/// Clone is not implemented; share a keypair behind an `Arc` instead.
pub struct Keypair {
    private_key: SigningKey,
    account_id: AccountId,
    uri: Option<String>,
}

impl Keypair {
    /// Create a keypair from fresh randomness
    pub fn random() -> Self {
        Self::from_signing_key(SigningKey::random(&mut OsRng), None)
    }

    /// Create a keypair from a 32-byte secret
    pub fn from_seed(seed: &[u8; 32]) -> Result<Self, CryptoError> {
        let private_key =
            SigningKey::from_slice(seed).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Ok(Self::from_signing_key(private_key, None))
    }

    /// Derive a stable keypair from a URI such as `//Alice`
    ///
    /// The same URI always yields the same account id.
    pub fn from_uri(uri: &str) -> Result<Self, CryptoError> {
        let mut material = Vec::with_capacity(URI_DOMAIN.len() + uri.len() + 1);
        material.extend_from_slice(URI_DOMAIN);
        material.extend_from_slice(uri.as_bytes());

        for round in 0..MAX_DERIVATION_ROUNDS {
            material.push(round);
            let mut seed = *keccak256(&material).as_bytes();
            material.pop();

            let candidate = SigningKey::from_slice(&seed);
            seed.zeroize();
            if let Ok(private_key) = candidate {
                material.zeroize();
                return Ok(Self::from_signing_key(private_key, Some(uri.to_string())));
            }
        }

        material.zeroize();
        Err(CryptoError::DerivationFailed(uri.to_string()))
    }

    fn from_signing_key(private_key: SigningKey, uri: Option<String>) -> Self {
        let account_id = public_key_to_account(private_key.verifying_key());
        Self {
            private_key,
            account_id,
            uri,
        }
    }

    /// Account id derived from the public key
    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    /// Public key
    pub fn public_key(&self) -> &PublicKey {
        self.private_key.verifying_key()
    }

    /// URI the keypair was derived from, if any
    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    /// Sign a 32-byte message hash
    pub fn sign_hash(&self, hash: &H256) -> Result<Signature, CryptoError> {
        sign(hash, &self.private_key)
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("account_id", &self.account_id)
            .field("uri", &self.uri)
            .finish_non_exhaustive()
    }
}
