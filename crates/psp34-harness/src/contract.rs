//! Contract message tables

use crate::config::MintPhaseModel;
use crate::{HarnessError, HarnessResult};

/// Message definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDef {
    /// Message name as dispatched
    pub name: String,
    /// Number of arguments
    pub arity: usize,
    /// Whether the message mutates state
    pub mutates: bool,
    /// Whether the message accepts attached value
    pub payable: bool,
}

impl MessageDef {
    /// Read-only message
    pub fn query(name: impl Into<String>, arity: usize) -> Self {
        Self {
            name: name.into(),
            arity,
            mutates: false,
            payable: false,
        }
    }

    /// State-changing message
    pub fn mutating(name: impl Into<String>, arity: usize) -> Self {
        Self {
            name: name.into(),
            arity,
            mutates: true,
            payable: false,
        }
    }

    /// Mark as payable
    pub fn payable(mut self) -> Self {
        self.payable = true;
        self
    }
}

/// Message table of one contract variant
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractSpec {
    messages: Vec<MessageDef>,
}

impl ContractSpec {
    /// Empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message with builder pattern
    pub fn with_message(mut self, message: MessageDef) -> Self {
        self.messages.push(message);
        self
    }

    /// Look up a message by name
    pub fn message(&self, name: &str) -> Option<&MessageDef> {
        self.messages.iter().find(|m| m.name == name)
    }

    /// All messages
    pub fn messages(&self) -> &[MessageDef] {
        &self.messages
    }

    /// Check a call against the table
    pub fn check_call(&self, name: &str, arg_count: usize, value: u128) -> HarnessResult<&MessageDef> {
        let message = self
            .message(name)
            .ok_or_else(|| HarnessError::Abi(format!("unknown message {}", name)))?;
        if message.arity != arg_count {
            return Err(HarnessError::Abi(format!(
                "{} takes {} arguments, got {}",
                name, message.arity, arg_count
            )));
        }
        if value > 0 && !message.payable {
            return Err(HarnessError::Abi(format!("{} is not payable", name)));
        }
        Ok(message)
    }

    /// Check a signed call; read-only messages are never submitted
    pub fn check_transaction(
        &self,
        name: &str,
        arg_count: usize,
        value: u128,
    ) -> HarnessResult<&MessageDef> {
        let message = self.check_call(name, arg_count, value)?;
        if !message.mutates {
            return Err(HarnessError::Abi(format!("{} is read-only", name)));
        }
        Ok(message)
    }
}

/// PSP34 message table for a given mint model
pub fn psp34_messages(minting: MintPhaseModel) -> ContractSpec {
    let mut spec = ContractSpec::new()
        // PSP34
        .with_message(MessageDef::query("collectionId", 0))
        .with_message(MessageDef::query("totalSupply", 0))
        .with_message(MessageDef::query("balanceOf", 1))
        .with_message(MessageDef::query("ownerOf", 1))
        .with_message(MessageDef::query("allowance", 3))
        .with_message(MessageDef::mutating("transfer", 3))
        .with_message(MessageDef::mutating("approve", 3))
        // Enumerable
        .with_message(MessageDef::query("tokenByIndex", 1))
        .with_message(MessageDef::query("ownersTokenByIndex", 2))
        // Ownable
        .with_message(MessageDef::query("owner", 0))
        // Collection
        .with_message(MessageDef::query("maxSupply", 0))
        .with_message(MessageDef::query("price", 0))
        .with_message(MessageDef::query("tokenUri", 1))
        .with_message(MessageDef::query("getMaxMintAmount", 0))
        .with_message(MessageDef::mutating("setBaseUri", 1))
        .with_message(MessageDef::mutating("setMaxMintAmount", 1))
        .with_message(MessageDef::mutating("mintNext", 0).payable())
        .with_message(MessageDef::mutating("mint", 2).payable());

    match minting {
        MintPhaseModel::Open => {}
        MintPhaseModel::MintEndFlag => {
            spec = spec
                .with_message(MessageDef::mutating("setMintEnd", 1))
                .with_message(MessageDef::query("getMintEnd", 0))
                .with_message(MessageDef::query("getIsAccountMinted", 1));
        }
        MintPhaseModel::StatusEnum => {
            spec = spec
                .with_message(MessageDef::mutating("setMintingStatus", 1))
                .with_message(MessageDef::query("getMintingStatus", 0));
        }
    }
    spec
}
