//! In-process development node
//!
//! Serves the node-gateway JSON-RPC methods from memory. Dev accounts are
//! funded at genesis; every included transaction seals one block.

use async_trait::async_trait;
use parking_lot::Mutex;
use psp34_crypto::{keccak256, recover_account, Signature};
use psp34_harness::config::{ContractProfile, ResultUnwrapping};
use psp34_harness::rpc::{
    self, method, CallRequest, ChainInfo, DryRunResult, InstantiateResult, SignedCall,
    SignedInstantiate, SubmitResult,
};
use psp34_harness::{HarnessError, HarnessResult, Keyring, Transport, Value};
use psp34_primitives::{AccountId, Balance, Nonce, Timestamp, H256};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::contract::{ContractStore, ExecContext, Psp34Double, Reply};
use crate::{gas, DevNodeError, NodeResult};

/// Initial balance of every dev account (1M tokens at 18 decimals)
pub const FUNDED_BALANCE: Balance = 1_000_000_000_000_000_000_000_000;

/// Timestamp of the genesis block, in milliseconds
pub const GENESIS_TIMESTAMP: Timestamp = 1_700_000_000_000;

/// Timestamp advance per sealed block
pub const BLOCK_TIME_MS: Timestamp = 12_000;

const CHAIN_NAME: &str = "psp34-dev";
const TOKEN_DECIMALS: u8 = 18;

#[derive(Debug, Default, Clone, Copy)]
struct AccountInfo {
    balance: Balance,
    nonce: Nonce,
}

struct NodeState {
    block_number: u64,
    timestamp: Timestamp,
    best_hash: H256,
    accounts: HashMap<AccountId, AccountInfo>,
    contracts: ContractStore,
}

impl NodeState {
    fn account(&self, account: &AccountId) -> AccountInfo {
        self.accounts.get(account).copied().unwrap_or_default()
    }

    fn check_nonce(&self, origin: &AccountId, nonce: Nonce) -> NodeResult<()> {
        let expected = self.account(origin).nonce;
        if nonce != expected {
            return Err(DevNodeError::InvalidTransaction(format!(
                "stale nonce: expected {}, got {}",
                expected, nonce
            )));
        }
        Ok(())
    }

    fn check_funds(&self, origin: &AccountId, value: Balance) -> NodeResult<()> {
        let balance = self.account(origin).balance;
        if balance < value {
            return Err(DevNodeError::InvalidTransaction(format!(
                "insufficient funds: balance {}, value {}",
                balance, value
            )));
        }
        Ok(())
    }

    fn bump_nonce(&mut self, origin: &AccountId) {
        self.accounts.entry(*origin).or_default().nonce += 1;
    }

    fn move_balance(&mut self, from: &AccountId, to: &AccountId, value: Balance) {
        if value == 0 {
            return;
        }
        if let Some(sender) = self.accounts.get_mut(from) {
            sender.balance = sender.balance.saturating_sub(value);
        }
        let receiver = self.accounts.entry(*to).or_default();
        receiver.balance = receiver.balance.saturating_add(value);
    }

    fn context(&self, call: &CallRequest) -> ExecContext {
        ExecContext {
            contract: call.dest,
            caller: call.origin,
            value: call.value,
            now: self.timestamp,
        }
    }

    fn seal(&mut self) -> H256 {
        self.block_number += 1;
        self.timestamp += BLOCK_TIME_MS;
        let mut header = self.best_hash.as_bytes().to_vec();
        header.extend_from_slice(&self.block_number.to_le_bytes());
        header.extend_from_slice(&self.timestamp.to_le_bytes());
        self.best_hash = keccak256(&header);
        self.best_hash
    }
}

/// Development node serving one contract profile
///
/// Cloning shares the chain; hand a clone to [`psp34_harness::TestRun`]
/// and keep another to steer time or inspect balances.
#[derive(Clone)]
pub struct DevNode {
    profile: Arc<ContractProfile>,
    state: Arc<Mutex<NodeState>>,
}

impl DevNode {
    /// Genesis with the dev accounts funded
    pub fn new(profile: ContractProfile) -> HarnessResult<Self> {
        let accounts = Keyring::dev()?
            .iter()
            .map(|(_, signer)| {
                (
                    signer.account_id(),
                    AccountInfo {
                        balance: FUNDED_BALANCE,
                        nonce: 0,
                    },
                )
            })
            .collect();

        Ok(Self {
            profile: Arc::new(profile),
            state: Arc::new(Mutex::new(NodeState {
                block_number: 0,
                timestamp: GENESIS_TIMESTAMP,
                best_hash: keccak256(CHAIN_NAME.as_bytes()),
                accounts,
                contracts: ContractStore::new(),
            })),
        })
    }

    /// Profile the node instantiates contracts under
    pub fn profile(&self) -> &ContractProfile {
        &self.profile
    }

    /// Credit `amount` to `account`
    pub fn fund(&self, account: &AccountId, amount: Balance) {
        let mut state = self.state.lock();
        let info = state.accounts.entry(*account).or_default();
        info.balance = info.balance.saturating_add(amount);
    }

    /// Free balance of `account`, contracts included
    pub fn balance_of(&self, account: &AccountId) -> Balance {
        self.state.lock().account(account).balance
    }

    /// Next nonce of `account`
    pub fn nonce(&self, account: &AccountId) -> Nonce {
        self.state.lock().account(account).nonce
    }

    /// Best block number
    pub fn block_number(&self) -> u64 {
        self.state.lock().block_number
    }

    /// Timestamp the next call executes at
    pub fn timestamp(&self) -> Timestamp {
        self.state.lock().timestamp
    }

    /// Jump the clock
    pub fn set_timestamp(&self, timestamp: Timestamp) {
        self.state.lock().timestamp = timestamp;
    }

    /// Move the clock forward
    pub fn advance_time(&self, millis: Timestamp) {
        let mut state = self.state.lock();
        state.timestamp = state.timestamp.saturating_add(millis);
    }

    /// Whether a contract lives at `address`
    pub fn has_contract(&self, address: &AccountId) -> bool {
        self.state.lock().contracts.contains_key(address)
    }

    fn handle(&self, method: &str, params: Vec<serde_json::Value>) -> NodeResult<serde_json::Value> {
        match method {
            method::CHAIN_INFO => {
                let state = self.state.lock();
                Ok(serde_json::to_value(ChainInfo {
                    chain: CHAIN_NAME.to_string(),
                    token_decimals: TOKEN_DECIMALS,
                    best_block: state.block_number,
                })?)
            }
            method::ACCOUNT_NEXT_INDEX => {
                let account: AccountId = param(&params, 0)?;
                Ok(serde_json::Value::from(self.nonce(&account)))
            }
            method::INSTANTIATE => self.instantiate(param(&params, 0)?),
            method::CALL => self.dry_run(param(&params, 0)?),
            method::SUBMIT_AND_WATCH => self.submit(param(&params, 0)?),
            other => Err(DevNodeError::UnknownMethod(other.to_string())),
        }
    }

    fn instantiate(&self, signed: SignedInstantiate) -> NodeResult<serde_json::Value> {
        let request = &signed.request;
        verify_signature(request, signed.nonce, &signed.signature, &request.origin)?;
        let args = decode_args(&request.args)?;

        let mut state = self.state.lock();
        state.check_nonce(&request.origin, signed.nonce)?;
        state.check_funds(&request.origin, request.value)?;
        state.bump_nonce(&request.origin);

        if request.gas_limit < gas::INSTANTIATE {
            state.seal();
            return Err(DevNodeError::OutOfGas {
                required: gas::INSTANTIATE,
                provided: request.gas_limit,
            });
        }
        let expected = self.profile.constructor.constructor_name();
        if request.constructor != expected {
            state.seal();
            return Err(DevNodeError::Trapped(format!(
                "unknown constructor {}",
                request.constructor
            )));
        }
        let contract = match Psp34Double::instantiate(&self.profile, request.origin, &args) {
            Ok(contract) => contract,
            Err(trap) => {
                state.seal();
                return Err(trap);
            }
        };

        let address = contract_address(&request.origin, signed.nonce);
        state.contracts.insert(address, contract);
        state.accounts.entry(address).or_default();
        state.move_balance(&request.origin, &address, request.value);
        let block_hash = state.seal();

        tracing::info!(
            address = %address,
            owner = %request.origin,
            profile = %self.profile.name,
            block = state.block_number,
            "contract instantiated"
        );

        Ok(serde_json::to_value(InstantiateResult {
            address,
            gas_consumed: gas::INSTANTIATE,
            events: Vec::new(),
            block_hash,
        })?)
    }

    fn dry_run(&self, call: CallRequest) -> NodeResult<serde_json::Value> {
        let args = decode_args(&call.args)?;
        let state = self.state.lock();
        let mut contract = state
            .contracts
            .get(&call.dest)
            .cloned()
            .ok_or_else(|| DevNodeError::ContractNotFound(call.dest.to_hex()))?;

        let execution = contract.call(&state.context(&call), &call.message, &args)?;
        let weight = gas::weight_of(&call.message);
        Ok(serde_json::to_value(DryRunResult {
            result: self.render(&execution.reply),
            gas_required: weight,
            gas_consumed: weight,
        })?)
    }

    fn submit(&self, signed: SignedCall) -> NodeResult<serde_json::Value> {
        let call = &signed.call;
        verify_signature(call, signed.nonce, &signed.signature, &call.origin)?;
        let args = decode_args(&call.args)?;

        let mut state = self.state.lock();
        state.check_nonce(&call.origin, signed.nonce)?;
        state.check_funds(&call.origin, call.value)?;
        let mut contract = state
            .contracts
            .get(&call.dest)
            .cloned()
            .ok_or_else(|| DevNodeError::ContractNotFound(call.dest.to_hex()))?;
        state.bump_nonce(&call.origin);

        let weight = gas::weight_of(&call.message);
        let provided = call.gas_limit.unwrap_or(0);
        if provided < weight {
            state.seal();
            return Err(DevNodeError::OutOfGas {
                required: weight,
                provided,
            });
        }

        let execution = match contract.call(&state.context(call), &call.message, &args) {
            Ok(execution) => execution,
            Err(trap) => {
                state.seal();
                return Err(trap);
            }
        };

        let result = self.render(&execution.reply);
        // A rejected message reverts its writes, payment and events
        let events = if execution.reply.is_success() {
            state.contracts.insert(call.dest, contract);
            state.move_balance(&call.origin, &call.dest, call.value);
            execution.events
        } else {
            Vec::new()
        };
        let block_hash = state.seal();

        tracing::debug!(
            method = %call.message,
            origin = %call.origin,
            success = execution.reply.is_success(),
            events = events.len(),
            "extrinsic included"
        );

        Ok(serde_json::to_value(SubmitResult {
            result,
            gas_consumed: weight,
            events,
            block_hash,
        })?)
    }

    fn render(&self, reply: &Reply) -> serde_json::Value {
        let inner = reply.to_json();
        match self.profile.unwrapping {
            ResultUnwrapping::Auto => inner,
            ResultUnwrapping::Explicit => serde_json::json!({ "ok": inner }),
        }
    }
}

#[async_trait]
impl Transport for DevNode {
    async fn request_json(
        &self,
        method: &str,
        params: Vec<serde_json::Value>,
    ) -> Result<serde_json::Value, HarnessError> {
        tracing::trace!(method, "dev node request");
        self.handle(method, params).map_err(DevNodeError::into_rpc)
    }
}

impl std::fmt::Debug for DevNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("DevNode")
            .field("profile", &self.profile.name)
            .field("block_number", &state.block_number)
            .field("contracts", &state.contracts.len())
            .finish()
    }
}

fn param<T: DeserializeOwned>(params: &[serde_json::Value], index: usize) -> NodeResult<T> {
    let raw = params
        .get(index)
        .cloned()
        .ok_or_else(|| DevNodeError::InvalidParams(format!("missing param {}", index)))?;
    Ok(serde_json::from_value(raw)?)
}

fn decode_args(args: &[serde_json::Value]) -> NodeResult<Vec<Value>> {
    args.iter()
        .map(|arg| Value::from_json(arg).map_err(|e| DevNodeError::Trapped(e.to_string())))
        .collect()
}

fn verify_signature<T: Serialize>(
    payload: &T,
    nonce: Nonce,
    signature: &str,
    origin: &AccountId,
) -> NodeResult<()> {
    let hash = rpc::signing_hash(payload, nonce)?;
    let signature = Signature::from_hex(signature)?;
    let signer = recover_account(&hash, &signature)?;
    if signer != *origin {
        return Err(DevNodeError::InvalidTransaction(format!(
            "bad signature: signed by {}, origin {}",
            signer, origin
        )));
    }
    Ok(())
}

fn contract_address(deployer: &AccountId, nonce: Nonce) -> AccountId {
    let mut preimage = b"psp34:contract".to_vec();
    preimage.extend_from_slice(deployer.as_bytes());
    preimage.extend_from_slice(&nonce.to_le_bytes());
    AccountId::from_bytes(*keccak256(&preimage).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use psp34_harness::rpc::code;
    use psp34_harness::Signer;

    fn signed_call(signer: &Signer, dest: AccountId, message: &str, nonce: Nonce, gas_limit: u64) -> SignedCall {
        let call = CallRequest {
            origin: signer.account_id(),
            dest,
            message: message.to_string(),
            args: vec![],
            value: 0,
            gas_limit: Some(gas_limit),
        };
        let signature = signer.sign(&call, nonce).unwrap();
        SignedCall {
            call,
            nonce,
            signature,
        }
    }

    #[tokio::test]
    async fn test_chain_info_and_funding() {
        let node = DevNode::new(ContractProfile::minimal()).unwrap();
        let info = node.request_json(method::CHAIN_INFO, vec![]).await.unwrap();
        assert_eq!(info["chain"], CHAIN_NAME);
        assert_eq!(info["bestBlock"], 0);

        let alice = Signer::from_uri("//Alice").unwrap();
        assert_eq!(node.balance_of(&alice.account_id()), FUNDED_BALANCE);
        let nonce = node
            .request_json(method::ACCOUNT_NEXT_INDEX, vec![serde_json::json!(alice.address())])
            .await
            .unwrap();
        assert_eq!(nonce, 0);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let node = DevNode::new(ContractProfile::minimal()).unwrap();
        let err = node.request_json("eth_call", vec![]).await.unwrap_err();
        assert!(matches!(err, HarnessError::Rpc { code: c, .. } if c == code::METHOD_NOT_FOUND));
    }

    #[test]
    fn test_missing_contract() {
        let node = DevNode::new(ContractProfile::minimal()).unwrap();
        let bob = Signer::from_uri("//Bob").unwrap();
        let signed = signed_call(&bob, AccountId::from_bytes([9u8; 32]), "totalSupply", 0, 10_000);
        assert!(matches!(node.submit(signed), Err(DevNodeError::ContractNotFound(_))));
        // rejected before inclusion
        assert_eq!(node.nonce(&bob.account_id()), 0);
    }

    #[test]
    fn test_forged_signature_rejected() {
        let node = DevNode::new(ContractProfile::minimal()).unwrap();
        let bob = Signer::from_uri("//Bob").unwrap();
        let eve = Signer::from_uri("//Eve").unwrap();
        let mut signed = signed_call(&eve, AccountId::from_bytes([9u8; 32]), "totalSupply", 0, 10_000);
        signed.call.origin = bob.account_id();
        assert!(matches!(node.submit(signed), Err(DevNodeError::InvalidTransaction(_))));
    }

    #[test]
    fn test_contract_address_depends_on_nonce() {
        let deployer = AccountId::from_bytes([1u8; 32]);
        assert_ne!(contract_address(&deployer, 0), contract_address(&deployer, 1));
    }
}
