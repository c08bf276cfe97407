//! Signer-scoped contract sessions

use parking_lot::Mutex;
use psp34_primitives::{AccountId, Balance, Weight};
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::ContractProfile;
use crate::connection::Connection;
use crate::contract::ContractSpec;
use crate::outcome::{decode_result, CallOutcome, EventRecord};
use crate::rpc::{code, CallRequest, OutOfGasData, SignedCall};
use crate::signer::Signer;
use crate::value::Value;
use crate::{HarnessError, HarnessResult};

/// Options for a state-changing call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallOptions {
    /// Attached native value
    pub value: Balance,
    /// Execution budget
    pub gas_limit: Weight,
}

impl CallOptions {
    /// Budget with no attached value
    pub fn with_gas_limit(gas_limit: Weight) -> Self {
        Self {
            value: 0,
            gas_limit,
        }
    }

    /// Attach value
    pub fn value(mut self, value: Balance) -> Self {
        self.value = value;
        self
    }
}

/// (signer, message, rendered args)
type EstimateKey = (AccountId, String, String);

/// Handle on one deployed contract, bound to one signer
///
/// Sessions derived with [`ContractSession::with_signer`] share the
/// connection and the estimate cache.
#[derive(Clone)]
pub struct ContractSession {
    connection: Connection,
    address: AccountId,
    signer: Signer,
    profile: Arc<ContractProfile>,
    messages: Arc<ContractSpec>,
    budget_multiplier: u64,
    estimates: Arc<Mutex<HashMap<EstimateKey, Weight>>>,
}

impl ContractSession {
    /// Bind to a deployed contract
    pub fn new(
        connection: Connection,
        address: AccountId,
        signer: Signer,
        profile: Arc<ContractProfile>,
        budget_multiplier: u64,
    ) -> Self {
        let messages = Arc::new(profile.messages());
        Self {
            connection,
            address,
            signer,
            profile,
            messages,
            budget_multiplier,
            estimates: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Contract address
    pub fn address(&self) -> AccountId {
        self.address
    }

    /// Current signer
    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    /// Contract profile
    pub fn profile(&self) -> &ContractProfile {
        &self.profile
    }

    /// Underlying connection
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Same contract and connection, different signer
    pub fn with_signer(&self, signer: &Signer) -> Self {
        Self {
            signer: signer.clone(),
            ..self.clone()
        }
    }

    /// Budget remembered from an earlier query by this signer
    pub fn cached_estimate(&self, message: &str, args: &[Value]) -> Option<Weight> {
        let key = self.estimate_key(message, &encode_args(args));
        self.estimates.lock().get(&key).copied()
    }

    fn estimate_key(&self, message: &str, args: &[serde_json::Value]) -> EstimateKey {
        (
            self.signer.account_id(),
            message.to_string(),
            serde_json::Value::Array(args.to_vec()).to_string(),
        )
    }

    /// Read-only call; learns the budget the message needs
    pub async fn query(&self, message: &str, args: &[Value]) -> HarnessResult<CallOutcome> {
        self.query_with_value(message, args, 0).await
    }

    /// Read-only call with attached value, for payable messages
    pub async fn query_with_value(
        &self,
        message: &str,
        args: &[Value],
        value: Balance,
    ) -> HarnessResult<CallOutcome> {
        self.messages.check_call(message, args.len(), value)?;

        let json_args = encode_args(args);
        let call = CallRequest {
            origin: self.signer.account_id(),
            dest: self.address,
            message: message.to_string(),
            args: json_args.clone(),
            value,
            gas_limit: None,
        };

        let dry_run = self
            .connection
            .dry_run(&call)
            .await
            .map_err(|e| map_rpc_error(message, e))?;
        let result = decode_result(&dry_run.result, self.profile.unwrapping)?;

        self.estimates
            .lock()
            .insert(self.estimate_key(message, &json_args), dry_run.gas_required);

        Ok(CallOutcome {
            message: message.to_string(),
            result,
            gas_required: dry_run.gas_required,
            gas_consumed: dry_run.gas_consumed,
            events: Vec::new(),
            block_hash: None,
        })
    }

    /// Signed state-changing call, awaited to finalization
    ///
    /// Fails with [`HarnessError::InsufficientBudget`] without a round-trip
    /// when an earlier query by this signer estimated more than
    /// `options.gas_limit`.
    pub async fn transact(
        &self,
        message: &str,
        args: &[Value],
        options: CallOptions,
    ) -> HarnessResult<CallOutcome> {
        self.messages.check_transaction(message, args.len(), options.value)?;

        let json_args = encode_args(args);
        let estimate = self
            .estimates
            .lock()
            .get(&self.estimate_key(message, &json_args))
            .copied();
        if let Some(required) = estimate {
            if required > options.gas_limit {
                return Err(HarnessError::InsufficientBudget {
                    method: message.to_string(),
                    required,
                    provided: options.gas_limit,
                });
            }
        }

        let origin = self.signer.account_id();
        let nonce = self.connection.next_nonce(&origin).await?;
        let call = CallRequest {
            origin,
            dest: self.address,
            message: message.to_string(),
            args: json_args,
            value: options.value,
            gas_limit: Some(options.gas_limit),
        };
        let signature = self.signer.sign(&call, nonce)?;
        let signed = SignedCall {
            call,
            nonce,
            signature,
        };

        let submitted = self
            .connection
            .submit_and_watch(&signed)
            .await
            .map_err(|e| map_rpc_error(message, e))?;

        let result = decode_result(&submitted.result, self.profile.unwrapping)?;
        let events = submitted
            .events
            .iter()
            .map(EventRecord::from_raw)
            .collect::<HarnessResult<Vec<_>>>()?;

        match &result {
            Ok(_) => tracing::info!(
                method = message,
                signer = self.signer.label(),
                block = %submitted.block_hash,
                events = events.len(),
                "transaction finalized"
            ),
            Err(err) => tracing::warn!(
                method = message,
                signer = self.signer.label(),
                error = %err,
                "transaction rejected by contract"
            ),
        }

        Ok(CallOutcome {
            message: message.to_string(),
            result,
            gas_required: estimate.unwrap_or(submitted.gas_consumed),
            gas_consumed: submitted.gas_consumed,
            events,
            block_hash: Some(submitted.block_hash),
        })
    }

    /// Query, then transact with the estimate times the budget multiplier
    pub async fn transact_estimated(
        &self,
        message: &str,
        args: &[Value],
        value: Balance,
    ) -> HarnessResult<CallOutcome> {
        let estimate = self.query_with_value(message, args, value).await?;
        let gas_limit = estimate.gas_required.saturating_mul(self.budget_multiplier);
        self.transact(message, args, CallOptions { value, gas_limit })
            .await
    }
}

impl std::fmt::Debug for ContractSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractSession")
            .field("address", &self.address)
            .field("signer", &self.signer)
            .field("profile", &self.profile.name)
            .finish_non_exhaustive()
    }
}

fn encode_args(args: &[Value]) -> Vec<serde_json::Value> {
    args.iter().map(Value::to_json).collect()
}

fn map_rpc_error(message: &str, error: HarnessError) -> HarnessError {
    match error {
        HarnessError::Rpc {
            code: code::OUT_OF_GAS,
            message: text,
            data,
        } => match data
            .clone()
            .and_then(|d| serde_json::from_value::<OutOfGasData>(d).ok())
        {
            Some(out_of_gas) => {
                tracing::warn!(
                    method = message,
                    required = out_of_gas.required,
                    provided = out_of_gas.provided,
                    "node rejected call: out of gas"
                );
                HarnessError::InsufficientBudget {
                    method: message.to_string(),
                    required: out_of_gas.required,
                    provided: out_of_gas.provided,
                }
            }
            None => HarnessError::Rpc {
                code: code::OUT_OF_GAS,
                message: text,
                data,
            },
        },
        HarnessError::Rpc {
            code,
            message: text,
            data,
        } => {
            tracing::warn!(method = message, code, error = %text, "node rejected call");
            HarnessError::Rpc {
                code,
                message: text,
                data,
            }
        }
        other => other,
    }
}
