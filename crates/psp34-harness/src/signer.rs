//! Signing identities and the dev keyring

use psp34_crypto::Keypair;
use psp34_primitives::{AccountId, Nonce};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::rpc::signing_hash;
use crate::HarnessResult;

/// Well-known development accounts
pub const DEV_ACCOUNTS: [&str; 6] = ["//Alice", "//Bob", "//Charlie", "//Dave", "//Eve", "//Ferdie"];

/// Signing identity shared by any number of sessions
#[derive(Clone)]
pub struct Signer {
    keypair: Arc<Keypair>,
    label: Arc<str>,
}

impl Signer {
    /// Derive from a keyring URI such as `//Bob`
    pub fn from_uri(uri: &str) -> HarnessResult<Self> {
        let keypair = Keypair::from_uri(uri)?;
        Ok(Self {
            keypair: Arc::new(keypair),
            label: Arc::from(uri),
        })
    }

    /// Fresh random identity
    pub fn random() -> Self {
        let keypair = Keypair::random();
        let label: Arc<str> = Arc::from(keypair.account_id().to_hex());
        Self {
            keypair: Arc::new(keypair),
            label,
        }
    }

    /// Account id
    pub fn account_id(&self) -> AccountId {
        self.keypair.account_id()
    }

    /// Address string as the node renders it
    pub fn address(&self) -> String {
        self.keypair.account_id().to_hex()
    }

    /// URI or address the signer was created from
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Sign a wire payload with its nonce, returning the hex signature
    pub fn sign<T: Serialize>(&self, payload: &T, nonce: Nonce) -> HarnessResult<String> {
        let hash = signing_hash(payload, nonce)?;
        Ok(self.keypair.sign_hash(&hash)?.to_hex())
    }
}

impl PartialEq for Signer {
    fn eq(&self, other: &Self) -> bool {
        self.account_id() == other.account_id()
    }
}

impl Eq for Signer {}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("label", &self.label)
            .field("address", &self.address())
            .finish()
    }
}

/// Named signers
#[derive(Clone, Debug, Default)]
pub struct Keyring {
    signers: BTreeMap<String, Signer>,
}

impl Keyring {
    /// Empty keyring
    pub fn new() -> Self {
        Self::default()
    }

    /// Keyring holding Alice through Ferdie
    pub fn dev() -> HarnessResult<Self> {
        let mut keyring = Self::new();
        for uri in DEV_ACCOUNTS {
            keyring.add_uri(uri)?;
        }
        Ok(keyring)
    }

    /// Derive and add a signer; returns the existing one if present
    pub fn add_uri(&mut self, uri: &str) -> HarnessResult<Signer> {
        if let Some(signer) = self.signers.get(uri) {
            return Ok(signer.clone());
        }
        let signer = Signer::from_uri(uri)?;
        self.signers.insert(uri.to_string(), signer.clone());
        Ok(signer)
    }

    /// Signer by URI
    pub fn get(&self, uri: &str) -> Option<&Signer> {
        self.signers.get(uri)
    }

    /// Signer by URI, deriving it if the keyring does not hold it yet
    pub fn signer(&self, uri: &str) -> HarnessResult<Signer> {
        match self.signers.get(uri) {
            Some(signer) => Ok(signer.clone()),
            None => Signer::from_uri(uri),
        }
    }

    /// Number of signers held
    pub fn len(&self) -> usize {
        self.signers.len()
    }

    /// Whether the keyring is empty
    pub fn is_empty(&self) -> bool {
        self.signers.is_empty()
    }

    /// Iterate over (uri, signer)
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Signer)> {
        self.signers.iter().map(|(k, v)| (k.as_str(), v))
    }
}
